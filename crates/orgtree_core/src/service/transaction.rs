//! Transaction scoping for service operations.
//!
//! # Invariants
//! - Every read-validate-write sequence runs on a single transaction.
//! - Errors drop the transaction, rolling back every prior write.

use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Isolation used by a service operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TxMode {
    /// Takes the database write lock up front; concurrent writers serialize.
    Write,
    /// Snapshot for multi-query reads.
    Read,
}

/// Runs `op` inside one transaction and commits when it succeeds.
///
/// The connection must not already be inside a transaction.
pub(crate) fn run_in_transaction<T, E>(
    conn: &Connection,
    mode: TxMode,
    op: impl FnOnce(&Connection) -> Result<T, E>,
) -> Result<T, E>
where
    E: From<rusqlite::Error>,
{
    let behavior = match mode {
        TxMode::Write => TransactionBehavior::Immediate,
        TxMode::Read => TransactionBehavior::Deferred,
    };
    let tx = Transaction::new_unchecked(conn, behavior)?;
    let value = op(&tx)?;
    tx.commit()?;
    Ok(value)
}
