//! Domain model for the organizational tree.
//!
//! # Responsibility
//! - Define units (tree nodes) and members (leaf personnel records).
//! - Own field-level validation shared by every write path.
//!
//! # Invariants
//! - Every record is identified by a stable UUID that is never reused.
//! - A member always belongs to exactly one unit.

pub mod member;
pub mod unit;
pub mod validation;
