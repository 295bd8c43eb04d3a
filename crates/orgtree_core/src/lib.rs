//! Core domain logic for the organizational tree.
//! This crate is the single source of truth for hierarchy invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::Settings;
pub use logging::{default_log_level, init_logging, init_logging_from_settings, logging_status};
pub use model::member::{Member, MemberId, MemberUpdate, NewMember};
pub use model::unit::{Unit, UnitId, UnitUpdate};
pub use model::validation::{parse_hire_date, ValidationError, MAX_TEXT_CHARS};
pub use repo::error::{RepoError, RepoResult};
pub use repo::member_repo::{MemberRepository, SqliteMemberRepository};
pub use repo::unit_repo::{SqliteUnitRepository, UnitRepository};
pub use service::descendants::{descendants_of, is_descendant, subtree_of, DescendantError};
pub use service::hierarchy_service::{
    DeleteMode, DeleteSummary, HierarchyError, HierarchyResult, HierarchyService,
};
pub use service::member_service::{MemberService, MemberServiceError};
pub use service::projection::{ProjectionOptions, UnitTree, MAX_DEPTH, MIN_DEPTH};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
