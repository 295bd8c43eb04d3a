//! Unit repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide keyed storage for organizational units.
//! - Keep SQL details and child ordering inside the repository boundary.
//!
//! # Invariants
//! - The repository never checks tree invariants (uniqueness, acyclicity);
//!   callers validate before writing.
//! - Child listing is deterministic: `created_at ASC`, then insertion order.

use super::error::{RepoError, RepoResult};
use super::schema::{ensure_table_ready, parse_uuid};
use crate::model::unit::{Unit, UnitId};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const UNIT_SELECT_SQL: &str = "SELECT
    unit_uuid,
    name,
    parent_uuid,
    created_at,
    updated_at
FROM units";

const UNIT_COLUMNS: &[&str] = &["unit_uuid", "name", "parent_uuid", "created_at", "updated_at"];

/// Repository interface for unit storage.
pub trait UnitRepository {
    /// Loads one unit by id.
    fn get_unit(&self, unit_uuid: UnitId) -> RepoResult<Option<Unit>>;
    /// Returns whether a unit named `name` exists under `parent_uuid`
    /// (`None` = among roots), ignoring `exclude_uuid`.
    fn exists_by_name_and_parent(
        &self,
        name: &str,
        parent_uuid: Option<UnitId>,
        exclude_uuid: Option<UnitId>,
    ) -> RepoResult<bool>;
    /// Lists direct children under one parent (`None` = roots).
    fn list_children(&self, parent_uuid: Option<UnitId>) -> RepoResult<Vec<Unit>>;
    /// Lists ids of direct children under one unit.
    fn child_ids(&self, parent_uuid: UnitId) -> RepoResult<Vec<UnitId>>;
    /// Inserts one unit with a fresh id.
    fn insert_unit(&self, name: &str, parent_uuid: Option<UnitId>) -> RepoResult<Unit>;
    /// Overwrites name and parent of one unit.
    fn update_unit(
        &self,
        unit_uuid: UnitId,
        name: &str,
        parent_uuid: Option<UnitId>,
    ) -> RepoResult<Unit>;
    /// Deletes one unit row. Returns the number of rows removed (0 or 1).
    fn delete_unit(&self, unit_uuid: UnitId) -> RepoResult<usize>;
}

/// SQLite-backed unit repository.
///
/// Accepts any connection, including an open transaction, so callers can
/// group several repository calls into one atomic unit of work.
pub struct SqliteUnitRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUnitRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "units", UNIT_COLUMNS)?;
        Ok(Self { conn })
    }

    /// Creates repository without schema checks. Used inside transactions
    /// whose connection was already verified.
    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UnitRepository for SqliteUnitRepository<'_> {
    fn get_unit(&self, unit_uuid: UnitId) -> RepoResult<Option<Unit>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{UNIT_SELECT_SQL} WHERE unit_uuid = ?1;"))?;
        let mut rows = stmt.query([unit_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_unit_row(row)?));
        }
        Ok(None)
    }

    fn exists_by_name_and_parent(
        &self,
        name: &str,
        parent_uuid: Option<UnitId>,
        exclude_uuid: Option<UnitId>,
    ) -> RepoResult<bool> {
        // `IS` compares NULL parents as equal, which covers the root scope.
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM units
                WHERE name = ?1
                  AND parent_uuid IS ?2
                  AND (?3 IS NULL OR unit_uuid <> ?3)
            );",
            params![
                name,
                parent_uuid.map(|value| value.to_string()),
                exclude_uuid.map(|value| value.to_string()),
            ],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_children(&self, parent_uuid: Option<UnitId>) -> RepoResult<Vec<Unit>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{UNIT_SELECT_SQL}
             WHERE parent_uuid IS ?1
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([parent_uuid.map(|value| value.to_string())])?;

        let mut units = Vec::new();
        while let Some(row) = rows.next()? {
            units.push(parse_unit_row(row)?);
        }
        Ok(units)
    }

    fn child_ids(&self, parent_uuid: UnitId) -> RepoResult<Vec<UnitId>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT unit_uuid
             FROM units
             WHERE parent_uuid = ?1
             ORDER BY created_at ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([parent_uuid.to_string()])?;

        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            ids.push(parse_uuid(&value, "units.unit_uuid")?);
        }
        Ok(ids)
    }

    fn insert_unit(&self, name: &str, parent_uuid: Option<UnitId>) -> RepoResult<Unit> {
        let unit_uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO units (unit_uuid, name, parent_uuid) VALUES (?1, ?2, ?3);",
            params![
                unit_uuid.to_string(),
                name,
                parent_uuid.map(|value| value.to_string()),
            ],
        )?;
        load_required_unit(self, unit_uuid)
    }

    fn update_unit(
        &self,
        unit_uuid: UnitId,
        name: &str,
        parent_uuid: Option<UnitId>,
    ) -> RepoResult<Unit> {
        let changed = self.conn.execute(
            "UPDATE units
             SET name = ?2,
                 parent_uuid = ?3,
                 updated_at = CAST(unixepoch('subsec') * 1000 AS INTEGER)
             WHERE unit_uuid = ?1;",
            params![
                unit_uuid.to_string(),
                name,
                parent_uuid.map(|value| value.to_string()),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::UnitNotFound(unit_uuid));
        }
        load_required_unit(self, unit_uuid)
    }

    fn delete_unit(&self, unit_uuid: UnitId) -> RepoResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM units WHERE unit_uuid = ?1;",
            [unit_uuid.to_string()],
        )?;
        Ok(removed)
    }
}

fn load_required_unit(repo: &SqliteUnitRepository<'_>, unit_uuid: UnitId) -> RepoResult<Unit> {
    repo.get_unit(unit_uuid)?
        .ok_or(RepoError::UnitNotFound(unit_uuid))
}

fn parse_unit_row(row: &Row<'_>) -> RepoResult<Unit> {
    let unit_uuid_text: String = row.get("unit_uuid")?;
    let unit_uuid = parse_uuid(&unit_uuid_text, "units.unit_uuid")?;

    let parent_uuid = row
        .get::<_, Option<String>>("parent_uuid")?
        .map(|value| parse_uuid(&value, "units.parent_uuid"))
        .transpose()?;

    Ok(Unit {
        unit_uuid,
        name: row.get("name")?,
        parent_uuid,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
