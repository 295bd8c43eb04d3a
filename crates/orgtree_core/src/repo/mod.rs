//! Entity store adapter: repository contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for units and members.
//! - Isolate SQLite query details from the hierarchy engine.
//!
//! # Invariants
//! - Repositories perform single-table reads and writes only; tree-level
//!   facts (sibling uniqueness, acyclicity) are checked by callers first.
//! - Repository APIs return semantic not-found errors for keyed writes in
//!   addition to DB transport errors.

pub mod error;
pub mod member_repo;
mod schema;
pub mod unit_repo;
