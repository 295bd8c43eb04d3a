//! Hierarchy mutation engine.
//!
//! # Responsibility
//! - Create, rename, move, and delete units while keeping the tree valid.
//! - Serve read views (single unit, children, bounded-depth projection).
//!
//! # Invariants
//! - Parent references always name an existing unit.
//! - Sibling names (same parent, or all roots) are pairwise distinct.
//! - No unit is its own ancestor.
//! - Every check runs on the same write transaction as the writes it
//!   guards; a failed operation leaves no trace.

use crate::model::unit::{Unit, UnitId, UnitUpdate};
use crate::model::validation::{normalize_unit_name, ValidationError};
use crate::repo::error::RepoError;
use crate::repo::member_repo::{MemberRepository, SqliteMemberRepository};
use crate::repo::unit_repo::{SqliteUnitRepository, UnitRepository};
use crate::service::descendants::{is_descendant, subtree_of, DescendantError};
use crate::service::projection::{build_tree, ProjectionOptions, UnitTree};
use crate::service::transaction::{run_in_transaction, TxMode};
use log::{error, info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Instant;

pub type HierarchyResult<T> = Result<T, HierarchyError>;

/// Unit delete mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Remove the unit, all of its descendants, and their members.
    Cascade,
    /// Move every member of the subtree to a target unit, then remove the
    /// subtree's units.
    Reassign,
}

impl DeleteMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cascade => "cascade",
            Self::Reassign => "reassign",
        }
    }
}

impl FromStr for DeleteMode {
    type Err = HierarchyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cascade" => Ok(Self::Cascade),
            "reassign" => Ok(Self::Reassign),
            _ => Err(HierarchyError::InvalidMode(value.to_string())),
        }
    }
}

impl Display for DeleteMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts reported by a successful delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct DeleteSummary {
    pub units_removed: usize,
    pub members_removed: usize,
    pub members_reassigned: usize,
}

/// Errors from hierarchy operations.
#[derive(Debug)]
pub enum HierarchyError {
    /// Input field failed validation.
    Validation(ValidationError),
    /// Unit (or requested parent) does not exist.
    NotFound(UnitId),
    /// A sibling already uses this name.
    Duplicate {
        name: String,
        parent_uuid: Option<UnitId>,
    },
    /// Unit named as its own parent.
    SelfReference(UnitId),
    /// Move would place a unit under one of its descendants.
    CyclicReference {
        unit_uuid: UnitId,
        parent_uuid: UnitId,
    },
    /// Delete mode label is not recognized.
    InvalidMode(String),
    /// Reassign delete was requested without a target.
    TargetRequired,
    /// Reassign target does not exist.
    TargetNotFound(UnitId),
    /// Reassign target is the deleted unit or lies inside its subtree.
    CannotReassignToSelf(UnitId),
    /// Stored tree contains a cycle.
    Integrity {
        root_uuid: UnitId,
        repeated_uuid: UnitId,
    },
    /// Store failure.
    Repo(RepoError),
}

impl HierarchyError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Duplicate { .. } => "duplicate",
            Self::SelfReference(_) => "self_reference",
            Self::CyclicReference { .. } => "cyclic_reference",
            Self::InvalidMode(_) => "invalid_mode",
            Self::TargetRequired => "target_required",
            Self::TargetNotFound(_) => "target_not_found",
            Self::CannotReassignToSelf(_) => "cannot_reassign_to_self",
            Self::Integrity { .. } => "integrity",
            Self::Repo(err) => err.code(),
        }
    }

    /// Returns whether this failure is caused by the request rather than by
    /// the store. Such failures must not be retried.
    pub fn is_validation_class(&self) -> bool {
        !matches!(self, Self::Integrity { .. } | Self::Repo(_))
    }
}

impl Display for HierarchyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "unit not found: {id}"),
            Self::Duplicate {
                name,
                parent_uuid: Some(parent_uuid),
            } => write!(f, "unit `{name}` already exists under {parent_uuid}"),
            Self::Duplicate {
                name,
                parent_uuid: None,
            } => write!(f, "root unit `{name}` already exists"),
            Self::SelfReference(id) => write!(f, "unit cannot be its own parent: {id}"),
            Self::CyclicReference {
                unit_uuid,
                parent_uuid,
            } => write!(
                f,
                "move would create cycle: unit {unit_uuid} under descendant {parent_uuid}"
            ),
            Self::InvalidMode(mode) => {
                write!(f, "invalid delete mode `{mode}`; expected cascade|reassign")
            }
            Self::TargetRequired => write!(f, "reassign delete requires a target unit"),
            Self::TargetNotFound(id) => write!(f, "reassign target unit not found: {id}"),
            Self::CannotReassignToSelf(id) => write!(
                f,
                "cannot reassign members to {id}: it is removed by the same delete"
            ),
            Self::Integrity {
                root_uuid,
                repeated_uuid,
            } => write!(
                f,
                "unit tree is corrupt: {repeated_uuid} reached twice below {root_uuid}"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HierarchyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for HierarchyError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for HierarchyError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::UnitNotFound(unit_uuid) => Self::NotFound(unit_uuid),
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for HierarchyError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

impl From<DescendantError> for HierarchyError {
    fn from(value: DescendantError) -> Self {
        match value {
            DescendantError::Integrity {
                root_uuid,
                repeated_uuid,
            } => Self::Integrity {
                root_uuid,
                repeated_uuid,
            },
            DescendantError::Repo(err) => err.into(),
        }
    }
}

/// Hierarchy engine facade over one SQLite connection.
///
/// Holds no state of its own; all exclusion comes from the store's
/// transactions.
pub struct HierarchyService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> HierarchyService<'conn> {
    /// Creates service from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> HierarchyResult<Self> {
        SqliteUnitRepository::try_new(conn)?;
        SqliteMemberRepository::try_new(conn)?;
        Ok(Self { conn })
    }

    /// Creates one unit under an optional parent.
    pub fn create_unit(
        &self,
        name: &str,
        parent_uuid: Option<UnitId>,
    ) -> HierarchyResult<Unit> {
        let context = parent_uuid.map_or_else(
            || "parent_uuid=none".to_string(),
            |parent| format!("parent_uuid={parent}"),
        );
        self.write("unit_create", context, |conn| {
            create_unit_in(&SqliteUnitRepository::new(conn), name, parent_uuid)
        })
    }

    /// Renames one unit within its current parent.
    pub fn rename_unit(&self, unit_uuid: UnitId, name: &str) -> HierarchyResult<Unit> {
        self.update_unit(unit_uuid, &UnitUpdate::rename(name))
    }

    /// Moves one unit under a new parent, keeping its name.
    pub fn move_unit(&self, unit_uuid: UnitId, new_parent_uuid: UnitId) -> HierarchyResult<Unit> {
        self.update_unit(unit_uuid, &UnitUpdate::reparent(new_parent_uuid))
    }

    /// Applies a combined rename and/or move, validated against the
    /// post-update state.
    pub fn update_unit(&self, unit_uuid: UnitId, update: &UnitUpdate) -> HierarchyResult<Unit> {
        self.write("unit_update", format!("unit_uuid={unit_uuid}"), |conn| {
            update_unit_in(&SqliteUnitRepository::new(conn), unit_uuid, update)
        })
    }

    /// Deletes one unit and its whole subtree.
    ///
    /// With [`DeleteMode::Reassign`], members of every unit in the subtree
    /// are first moved to `reassign_to`. Child units are removed, not
    /// reparented.
    pub fn delete_unit(
        &self,
        unit_uuid: UnitId,
        mode: DeleteMode,
        reassign_to: Option<UnitId>,
    ) -> HierarchyResult<DeleteSummary> {
        let context = format!("unit_uuid={unit_uuid} mode={mode}");
        let summary = self.write("unit_delete", context, |conn| {
            delete_unit_in(
                &SqliteUnitRepository::new(conn),
                &SqliteMemberRepository::new(conn),
                unit_uuid,
                mode,
                reassign_to,
            )
        })?;
        info!(
            "event=unit_delete_summary module=hierarchy unit_uuid={} units_removed={} members_removed={} members_reassigned={}",
            unit_uuid, summary.units_removed, summary.members_removed, summary.members_reassigned
        );
        Ok(summary)
    }

    /// Loads one unit.
    pub fn get_unit(&self, unit_uuid: UnitId) -> HierarchyResult<Unit> {
        let units = SqliteUnitRepository::new(self.conn);
        ensure_unit_exists(&units, unit_uuid)
    }

    /// Lists direct children of a unit, or the roots when `parent_uuid` is
    /// `None`.
    pub fn list_children(&self, parent_uuid: Option<UnitId>) -> HierarchyResult<Vec<Unit>> {
        run_in_transaction(self.conn, TxMode::Read, |conn| {
            let units = SqliteUnitRepository::new(conn);
            if let Some(parent_uuid) = parent_uuid {
                ensure_unit_exists(&units, parent_uuid)?;
            }
            Ok(units.list_children(parent_uuid)?)
        })
    }

    /// Builds a bounded-depth tree view rooted at `unit_uuid`.
    ///
    /// Depth is clamped into the supported range before use.
    pub fn project_unit(
        &self,
        unit_uuid: UnitId,
        options: ProjectionOptions,
    ) -> HierarchyResult<UnitTree> {
        let started_at = Instant::now();
        let options = options.clamped();
        let result = run_in_transaction(self.conn, TxMode::Read, |conn| {
            build_tree(
                &SqliteUnitRepository::new(conn),
                &SqliteMemberRepository::new(conn),
                unit_uuid,
                options,
            )
        });
        log_outcome(
            "unit_project",
            &format!(
                "unit_uuid={unit_uuid} depth={} include_members={}",
                options.depth, options.include_members
            ),
            started_at,
            &result,
        );
        result
    }

    fn write<T>(
        &self,
        event: &'static str,
        context: String,
        op: impl FnOnce(&Connection) -> HierarchyResult<T>,
    ) -> HierarchyResult<T> {
        let started_at = Instant::now();
        let result = run_in_transaction(self.conn, TxMode::Write, op);
        log_outcome(event, &context, started_at, &result);
        result
    }
}

fn log_outcome<T>(
    event: &str,
    context: &str,
    started_at: Instant,
    result: &HierarchyResult<T>,
) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!(
            "event={event} module=hierarchy status=ok {context} duration_ms={duration_ms}"
        ),
        Err(err) if err.is_validation_class() => warn!(
            "event={event} module=hierarchy status=error {context} duration_ms={duration_ms} error_code={}",
            err.code()
        ),
        Err(err) => error!(
            "event={event} module=hierarchy status=error {context} duration_ms={duration_ms} error_code={} error={}",
            err.code(),
            err
        ),
    }
}

/// Loads `unit_uuid` or fails with `NotFound`.
pub(crate) fn ensure_unit_exists<R>(units: &R, unit_uuid: UnitId) -> HierarchyResult<Unit>
where
    R: UnitRepository + ?Sized,
{
    units
        .get_unit(unit_uuid)?
        .ok_or(HierarchyError::NotFound(unit_uuid))
}

fn ensure_name_available<R>(
    units: &R,
    name: &str,
    parent_uuid: Option<UnitId>,
    exclude_uuid: Option<UnitId>,
) -> HierarchyResult<()>
where
    R: UnitRepository + ?Sized,
{
    if units.exists_by_name_and_parent(name, parent_uuid, exclude_uuid)? {
        return Err(HierarchyError::Duplicate {
            name: name.to_string(),
            parent_uuid,
        });
    }
    Ok(())
}

fn create_unit_in<R>(units: &R, name: &str, parent_uuid: Option<UnitId>) -> HierarchyResult<Unit>
where
    R: UnitRepository + ?Sized,
{
    let name = normalize_unit_name(name)?;
    if let Some(parent_uuid) = parent_uuid {
        ensure_unit_exists(units, parent_uuid)?;
    }
    ensure_name_available(units, &name, parent_uuid, None)?;
    Ok(units.insert_unit(&name, parent_uuid)?)
}

fn update_unit_in<R>(units: &R, unit_uuid: UnitId, update: &UnitUpdate) -> HierarchyResult<Unit>
where
    R: UnitRepository + ?Sized,
{
    let current = ensure_unit_exists(units, unit_uuid)?;
    if update.is_empty() {
        return Ok(current);
    }

    let next_name = match update.name.as_deref() {
        Some(name) => normalize_unit_name(name)?,
        None => current.name.clone(),
    };

    let next_parent = match update.parent_uuid {
        Some(parent_uuid) => {
            if parent_uuid == unit_uuid {
                return Err(HierarchyError::SelfReference(unit_uuid));
            }
            ensure_unit_exists(units, parent_uuid)?;
            if is_descendant(units, unit_uuid, parent_uuid)? {
                return Err(HierarchyError::CyclicReference {
                    unit_uuid,
                    parent_uuid,
                });
            }
            Some(parent_uuid)
        }
        None => current.parent_uuid,
    };

    ensure_name_available(units, &next_name, next_parent, Some(unit_uuid))?;
    Ok(units.update_unit(unit_uuid, &next_name, next_parent)?)
}

fn delete_unit_in<U, M>(
    units: &U,
    members: &M,
    unit_uuid: UnitId,
    mode: DeleteMode,
    reassign_to: Option<UnitId>,
) -> HierarchyResult<DeleteSummary>
where
    U: UnitRepository + ?Sized,
    M: MemberRepository + ?Sized,
{
    ensure_unit_exists(units, unit_uuid)?;

    let mut summary = DeleteSummary::default();
    let subtree = match mode {
        DeleteMode::Cascade => {
            let subtree = subtree_of(units, unit_uuid)?;
            for member_unit in &subtree {
                summary.members_removed += members.delete_by_unit(*member_unit)?;
            }
            subtree
        }
        DeleteMode::Reassign => {
            let target_uuid = reassign_to.ok_or(HierarchyError::TargetRequired)?;
            if target_uuid == unit_uuid {
                return Err(HierarchyError::CannotReassignToSelf(target_uuid));
            }
            if units.get_unit(target_uuid)?.is_none() {
                return Err(HierarchyError::TargetNotFound(target_uuid));
            }

            let subtree = subtree_of(units, unit_uuid)?;
            if subtree.contains(&target_uuid) {
                return Err(HierarchyError::CannotReassignToSelf(target_uuid));
            }
            for member_unit in &subtree {
                summary.members_reassigned += members.reassign_unit(*member_unit, target_uuid)?;
            }
            subtree
        }
    };

    summary.units_removed = remove_units(units, unit_uuid, &subtree)?;
    Ok(summary)
}

/// Removes `subtree` (parents before children) leaves-first, so each row
/// delete removes exactly that row regardless of referential actions.
fn remove_units<R>(units: &R, root_uuid: UnitId, subtree: &[UnitId]) -> HierarchyResult<usize>
where
    R: UnitRepository + ?Sized,
{
    let mut removed = 0;
    for member_unit in subtree.iter().rev() {
        let changed = units.delete_unit(*member_unit)?;
        if changed != 1 {
            return Err(HierarchyError::Repo(RepoError::InvalidData(format!(
                "unit {member_unit} vanished while deleting subtree of {root_uuid}"
            ))));
        }
        removed += changed;
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::{DeleteMode, HierarchyError};
    use crate::model::validation::ValidationError;
    use crate::repo::error::RepoError;
    use uuid::Uuid;

    #[test]
    fn delete_mode_parses_known_labels() {
        assert_eq!("cascade".parse::<DeleteMode>().unwrap(), DeleteMode::Cascade);
        assert_eq!(" Reassign ".parse::<DeleteMode>().unwrap(), DeleteMode::Reassign);
    }

    #[test]
    fn delete_mode_rejects_unknown_label() {
        let err = "archive".parse::<DeleteMode>().unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidMode(ref mode) if mode == "archive"));
        assert_eq!(err.code(), "invalid_mode");
    }

    #[test]
    fn repo_unit_not_found_maps_to_not_found() {
        let id = Uuid::new_v4();
        let err: HierarchyError = RepoError::UnitNotFound(id).into();
        assert!(matches!(err, HierarchyError::NotFound(found) if found == id));
    }

    #[test]
    fn store_failures_are_not_validation_class() {
        let repo_err: HierarchyError = RepoError::InvalidData("bad".to_string()).into();
        assert!(!repo_err.is_validation_class());

        let validation: HierarchyError = ValidationError::Blank { field: "name" }.into();
        assert!(validation.is_validation_class());
        assert!(HierarchyError::TargetRequired.is_validation_class());
    }
}
