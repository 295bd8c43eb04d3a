//! Member use-case service.
//!
//! # Responsibility
//! - Create, read, update, and delete members under existing units.
//!
//! # Invariants
//! - A member is only ever written under a unit confirmed to exist on the
//!   same transaction.
//! - Members are never re-owned here; ownership changes only through unit
//!   deletion in reassign mode.

use crate::model::member::{Member, MemberId, MemberUpdate, NewMember};
use crate::model::unit::UnitId;
use crate::model::validation::ValidationError;
use crate::repo::error::RepoError;
use crate::repo::member_repo::{MemberRepository, SqliteMemberRepository};
use crate::repo::unit_repo::{SqliteUnitRepository, UnitRepository};
use crate::service::transaction::{run_in_transaction, TxMode};
use log::{info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from member service operations.
#[derive(Debug)]
pub enum MemberServiceError {
    Validation(ValidationError),
    /// Owning unit does not exist.
    UnitNotFound(UnitId),
    MemberNotFound(MemberId),
    Repo(RepoError),
}

impl MemberServiceError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::UnitNotFound(_) => "not_found",
            Self::MemberNotFound(_) => "member_not_found",
            Self::Repo(err) => err.code(),
        }
    }

    pub fn is_validation_class(&self) -> bool {
        !matches!(self, Self::Repo(_))
    }
}

impl Display for MemberServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::UnitNotFound(id) => write!(f, "unit not found: {id}"),
            Self::MemberNotFound(id) => write!(f, "member not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MemberServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for MemberServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for MemberServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::UnitNotFound(id) => Self::UnitNotFound(id),
            RepoError::MemberNotFound(id) => Self::MemberNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for MemberServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// Member service facade over one SQLite connection.
pub struct MemberService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> MemberService<'conn> {
    /// Creates service from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> Result<Self, MemberServiceError> {
        SqliteUnitRepository::try_new(conn)?;
        SqliteMemberRepository::try_new(conn)?;
        Ok(Self { conn })
    }

    /// Creates one member under `unit_uuid`.
    pub fn create_member(
        &self,
        unit_uuid: UnitId,
        member: &NewMember,
    ) -> Result<Member, MemberServiceError> {
        let result: Result<Member, MemberServiceError> =
            run_in_transaction(self.conn, TxMode::Write, |conn| {
                ensure_unit_exists(&SqliteUnitRepository::new(conn), unit_uuid)?;
                let normalized = member.normalized()?;
                Ok(SqliteMemberRepository::new(conn).insert_member(unit_uuid, &normalized)?)
            });
        match &result {
            Ok(created) => info!(
                "event=member_create module=member status=ok unit_uuid={} member_uuid={}",
                unit_uuid, created.member_uuid
            ),
            Err(err) => warn!(
                "event=member_create module=member status=error unit_uuid={} error_code={}",
                unit_uuid,
                err.code()
            ),
        }
        result
    }

    /// Loads one member.
    pub fn get_member(&self, member_uuid: MemberId) -> Result<Member, MemberServiceError> {
        SqliteMemberRepository::new(self.conn)
            .get_member(member_uuid)?
            .ok_or(MemberServiceError::MemberNotFound(member_uuid))
    }

    /// Lists members of one unit, oldest first.
    pub fn list_members(&self, unit_uuid: UnitId) -> Result<Vec<Member>, MemberServiceError> {
        run_in_transaction(self.conn, TxMode::Read, |conn| {
            ensure_unit_exists(&SqliteUnitRepository::new(conn), unit_uuid)?;
            Ok(SqliteMemberRepository::new(conn).list_by_unit(unit_uuid)?)
        })
    }

    /// Applies a partial update to one member.
    pub fn update_member(
        &self,
        member_uuid: MemberId,
        update: &MemberUpdate,
    ) -> Result<Member, MemberServiceError> {
        let result: Result<Member, MemberServiceError> =
            run_in_transaction(self.conn, TxMode::Write, |conn| {
                let members = SqliteMemberRepository::new(conn);
                let mut member = members
                    .get_member(member_uuid)?
                    .ok_or(MemberServiceError::MemberNotFound(member_uuid))?;
                update.apply_to(&mut member)?;
                Ok(members.update_member(&member)?)
            });
        log_member_outcome("member_update", member_uuid, &result);
        result
    }

    /// Deletes one member.
    pub fn delete_member(&self, member_uuid: MemberId) -> Result<(), MemberServiceError> {
        let result: Result<(), MemberServiceError> =
            run_in_transaction(self.conn, TxMode::Write, |conn| {
                Ok(SqliteMemberRepository::new(conn).delete_member(member_uuid)?)
            });
        log_member_outcome("member_delete", member_uuid, &result);
        result
    }
}

fn ensure_unit_exists<R>(units: &R, unit_uuid: UnitId) -> Result<(), MemberServiceError>
where
    R: UnitRepository + ?Sized,
{
    if units.get_unit(unit_uuid)?.is_none() {
        return Err(MemberServiceError::UnitNotFound(unit_uuid));
    }
    Ok(())
}

fn log_member_outcome<T>(
    event: &str,
    member_uuid: MemberId,
    result: &Result<T, MemberServiceError>,
) {
    match result {
        Ok(_) => info!("event={event} module=member status=ok member_uuid={member_uuid}"),
        Err(err) => warn!(
            "event={event} module=member status=error member_uuid={member_uuid} error_code={}",
            err.code()
        ),
    }
}
