//! Bounded-depth tree projection.
//!
//! # Invariants
//! - Depth is always within [`MIN_DEPTH`, `MAX_DEPTH`] before traversal.
//! - When members are included they appear under their owning unit at
//!   every projected level, ordered by creation time.

use crate::model::member::Member;
use crate::model::unit::{Unit, UnitId};
use crate::repo::member_repo::MemberRepository;
use crate::repo::unit_repo::UnitRepository;
use crate::service::hierarchy_service::{ensure_unit_exists, HierarchyResult};
use serde::Serialize;

pub const MIN_DEPTH: u8 = 1;
pub const MAX_DEPTH: u8 = 5;

/// Projection request knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionOptions {
    /// Number of levels loaded below the root.
    pub depth: u8,
    pub include_members: bool,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            depth: MIN_DEPTH,
            include_members: true,
        }
    }
}

impl ProjectionOptions {
    pub fn new(depth: u8, include_members: bool) -> Self {
        Self {
            depth,
            include_members,
        }
    }

    /// Returns a copy with depth clamped into the supported range.
    pub fn clamped(self) -> Self {
        Self {
            depth: self.depth.clamp(MIN_DEPTH, MAX_DEPTH),
            ..self
        }
    }
}

/// Read snapshot of one unit and its projected subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitTree {
    #[serde(flatten)]
    pub unit: Unit,
    /// `None` when members were not requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<Member>>,
    /// Empty when depth ran out or the unit has no children.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<UnitTree>,
}

impl UnitTree {
    /// Counts units in this snapshot, including the root.
    pub fn unit_count(&self) -> usize {
        1 + self.children.iter().map(UnitTree::unit_count).sum::<usize>()
    }

    /// Finds a projected unit by id.
    pub fn find(&self, unit_uuid: UnitId) -> Option<&UnitTree> {
        if self.unit.unit_uuid == unit_uuid {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(unit_uuid))
    }
}

/// Builds the projection rooted at `unit_uuid`; fails `NotFound` when the
/// root is absent. `options` are expected to be clamped already.
pub(crate) fn build_tree<U, M>(
    units: &U,
    members: &M,
    unit_uuid: UnitId,
    options: ProjectionOptions,
) -> HierarchyResult<UnitTree>
where
    U: UnitRepository + ?Sized,
    M: MemberRepository + ?Sized,
{
    let root = ensure_unit_exists(units, unit_uuid)?;
    project_node(units, members, root, options.depth, options.include_members)
}

fn project_node<U, M>(
    units: &U,
    members: &M,
    unit: Unit,
    remaining_depth: u8,
    include_members: bool,
) -> HierarchyResult<UnitTree>
where
    U: UnitRepository + ?Sized,
    M: MemberRepository + ?Sized,
{
    let unit_members = if include_members {
        Some(members.list_by_unit(unit.unit_uuid)?)
    } else {
        None
    };

    let mut children = Vec::new();
    if remaining_depth > 0 {
        for child in units.list_children(Some(unit.unit_uuid))? {
            children.push(project_node(
                units,
                members,
                child,
                remaining_depth - 1,
                include_members,
            )?);
        }
    }

    Ok(UnitTree {
        unit,
        members: unit_members,
        children,
    })
}
