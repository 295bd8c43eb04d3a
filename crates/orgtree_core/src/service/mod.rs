//! Core use-case services.
//!
//! # Responsibility
//! - Enforce tree invariants above the repository layer.
//! - Group each operation's reads and writes into one store transaction.
//! - Keep CLI/transport layers decoupled from storage details.

pub mod descendants;
pub mod hierarchy_service;
pub mod member_service;
pub mod projection;
mod transaction;
