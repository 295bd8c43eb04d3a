//! Member (personnel record) model.
//!
//! # Invariants
//! - `unit_uuid` always references an existing unit.
//! - Members carry no relationships to each other.

use super::unit::UnitId;
use super::validation::{normalize_bounded_text, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable member identifier.
pub type MemberId = Uuid;

/// Personnel record owned by one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub member_uuid: MemberId,
    /// Owning unit.
    pub unit_uuid: UnitId,
    pub full_name: String,
    /// Job title.
    pub position: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hired_at: Option<NaiveDate>,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

/// Input for creating a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    pub full_name: String,
    pub position: String,
    pub hired_at: Option<NaiveDate>,
}

impl NewMember {
    pub fn new(full_name: impl Into<String>, position: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            position: position.into(),
            hired_at: None,
        }
    }

    pub fn hired_at(mut self, date: NaiveDate) -> Self {
        self.hired_at = Some(date);
        self
    }

    /// Returns a trimmed copy, or the first failing field.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            full_name: normalize_bounded_text("full_name", &self.full_name)?,
            position: normalize_bounded_text("position", &self.position)?,
            hired_at: self.hired_at,
        })
    }
}

/// Partial member update. `None` leaves a field untouched.
///
/// `hired_at: Some(None)` clears the hire date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberUpdate {
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub hired_at: Option<Option<NaiveDate>>,
}

impl MemberUpdate {
    /// Applies this update onto `member`, validating each provided field.
    pub fn apply_to(&self, member: &mut Member) -> Result<(), ValidationError> {
        if let Some(full_name) = &self.full_name {
            member.full_name = normalize_bounded_text("full_name", full_name)?;
        }
        if let Some(position) = &self.position {
            member.position = normalize_bounded_text("position", position)?;
        }
        if let Some(hired_at) = self.hired_at {
            member.hired_at = hired_at;
        }
        Ok(())
    }
}
