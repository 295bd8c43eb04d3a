//! Organizational unit model.
//!
//! # Invariants
//! - `parent_uuid = None` marks a root unit.
//! - Following `parent_uuid` links always terminates at a root.
//! - No two units with the same `parent_uuid` share a `name`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable unit identifier.
pub type UnitId = Uuid;

/// One node of the organizational tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub unit_uuid: UnitId,
    /// Trimmed display name, unique among siblings.
    pub name: String,
    pub parent_uuid: Option<UnitId>,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

impl Unit {
    /// Returns whether this unit sits at the top of the tree.
    pub fn is_root(&self) -> bool {
        self.parent_uuid.is_none()
    }
}

/// Partial update applied by the combined rename/move operation.
///
/// Both fields are evaluated together against the post-update state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitUpdate {
    pub name: Option<String>,
    pub parent_uuid: Option<UnitId>,
}

impl UnitUpdate {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            parent_uuid: None,
        }
    }

    pub fn reparent(parent_uuid: UnitId) -> Self {
        Self {
            name: None,
            parent_uuid: Some(parent_uuid),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.parent_uuid.is_none()
    }
}
