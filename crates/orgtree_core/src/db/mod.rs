//! Store bootstrap for the org tree.
//!
//! A [`rusqlite::Connection`] handed to repositories always comes from
//! [`open_db`] or [`open_db_in_memory`]: referential actions enabled, a
//! bounded busy wait for competing writers, and the `units`/`members`
//! schema at [`migrations::latest_version`].
//!
//! # Invariants
//! - `PRAGMA user_version` equals the last applied migration.
//! - A store written by a newer binary is refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Bootstrap failure. Both variants are store-side; none is caused by a
/// request.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl DbError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "db_error",
            Self::UnsupportedSchemaVersion { .. } => "unsupported_schema_version",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

#[cfg(test)]
mod tests {
    use super::DbError;

    #[test]
    fn newer_schema_error_names_both_versions() {
        let err = DbError::UnsupportedSchemaVersion {
            db_version: 7,
            latest_supported: 1,
        };
        assert_eq!(err.code(), "unsupported_schema_version");
        let message = err.to_string();
        assert!(message.contains('7'));
        assert!(message.contains('1'));
    }

    #[test]
    fn sqlite_errors_keep_their_source() {
        let err: DbError = rusqlite::Error::InvalidQuery.into();
        assert_eq!(err.code(), "db_error");
        assert!(std::error::Error::source(&err).is_some());
    }
}
