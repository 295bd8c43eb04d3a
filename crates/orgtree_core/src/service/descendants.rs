//! Descendant closure resolution.
//!
//! # Responsibility
//! - Compute every unit reachable from a unit through parent→child links.
//! - Answer cycle-prevention queries for moves.
//!
//! # Invariants
//! - The starting unit is never part of its own descendant set.
//! - Traversal guards against revisits; a revisit means the stored tree is
//!   corrupt and fails with [`DescendantError::Integrity`] instead of looping.
//! - Nothing is cached; each call reads current store state.

use crate::model::unit::UnitId;
use crate::repo::error::RepoError;
use crate::repo::unit_repo::UnitRepository;
use log::{debug, error};
use std::collections::{HashSet, VecDeque};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from descendant traversal.
#[derive(Debug)]
pub enum DescendantError {
    /// A unit was reached twice while walking down from `root_uuid`.
    Integrity {
        root_uuid: UnitId,
        repeated_uuid: UnitId,
    },
    Repo(RepoError),
}

impl Display for DescendantError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
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

impl Error for DescendantError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Integrity { .. } => None,
        }
    }
}

impl From<RepoError> for DescendantError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Returns every descendant of `unit_uuid` in breadth-first order.
///
/// The result holds no duplicates; a duplicate can only come from a cycle,
/// which is reported as an error.
pub fn descendants_of<R>(repo: &R, unit_uuid: UnitId) -> Result<Vec<UnitId>, DescendantError>
where
    R: UnitRepository + ?Sized,
{
    let mut visited = HashSet::from([unit_uuid]);
    let mut queue = VecDeque::from([unit_uuid]);
    let mut found = Vec::new();

    while let Some(current) = queue.pop_front() {
        for child in repo.child_ids(current)? {
            if !visited.insert(child) {
                error!(
                    "event=descendants_resolve module=descendants status=error error_code=integrity unit_uuid={} repeated_uuid={}",
                    unit_uuid, child
                );
                return Err(DescendantError::Integrity {
                    root_uuid: unit_uuid,
                    repeated_uuid: child,
                });
            }
            found.push(child);
            queue.push_back(child);
        }
    }

    debug!(
        "event=descendants_resolve module=descendants status=ok unit_uuid={} count={}",
        unit_uuid,
        found.len()
    );
    Ok(found)
}

/// Returns `unit_uuid` followed by all of its descendants, parents before
/// children.
pub fn subtree_of<R>(repo: &R, unit_uuid: UnitId) -> Result<Vec<UnitId>, DescendantError>
where
    R: UnitRepository + ?Sized,
{
    let mut subtree = vec![unit_uuid];
    subtree.extend(descendants_of(repo, unit_uuid)?);
    Ok(subtree)
}

/// Returns whether `candidate_uuid` lies strictly below `ancestor_uuid`.
pub fn is_descendant<R>(
    repo: &R,
    ancestor_uuid: UnitId,
    candidate_uuid: UnitId,
) -> Result<bool, DescendantError>
where
    R: UnitRepository + ?Sized,
{
    Ok(descendants_of(repo, ancestor_uuid)?.contains(&candidate_uuid))
}
