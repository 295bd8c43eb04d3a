//! Member repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide keyed storage for members plus bulk per-unit operations.
//!
//! # Invariants
//! - Member listing per unit is ordered by `created_at ASC`, then insertion
//!   order.
//! - Read paths reject unparsable persisted values instead of masking them.

use super::error::{RepoError, RepoResult};
use super::schema::{ensure_table_ready, parse_uuid};
use crate::model::member::{Member, MemberId, NewMember};
use crate::model::unit::UnitId;
use crate::model::validation::{parse_hire_date, HIRE_DATE_FORMAT};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const MEMBER_SELECT_SQL: &str = "SELECT
    member_uuid,
    unit_uuid,
    full_name,
    position,
    hired_at,
    created_at,
    updated_at
FROM members";

const MEMBER_COLUMNS: &[&str] = &[
    "member_uuid",
    "unit_uuid",
    "full_name",
    "position",
    "hired_at",
    "created_at",
    "updated_at",
];

/// Repository interface for member storage.
pub trait MemberRepository {
    /// Inserts one member under `unit_uuid` with a fresh id.
    fn insert_member(&self, unit_uuid: UnitId, member: &NewMember) -> RepoResult<Member>;
    /// Loads one member by id.
    fn get_member(&self, member_uuid: MemberId) -> RepoResult<Option<Member>>;
    /// Lists members owned by one unit, oldest first.
    fn list_by_unit(&self, unit_uuid: UnitId) -> RepoResult<Vec<Member>>;
    /// Overwrites the mutable fields of one member.
    fn update_member(&self, member: &Member) -> RepoResult<Member>;
    /// Deletes one member.
    fn delete_member(&self, member_uuid: MemberId) -> RepoResult<()>;
    /// Deletes every member owned by one unit. Returns the count removed.
    fn delete_by_unit(&self, unit_uuid: UnitId) -> RepoResult<usize>;
    /// Re-owns every member of `from_unit` to `to_unit`. Returns the count moved.
    fn reassign_unit(&self, from_unit: UnitId, to_unit: UnitId) -> RepoResult<usize>;
}

/// SQLite-backed member repository.
pub struct SqliteMemberRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMemberRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "members", MEMBER_COLUMNS)?;
        Ok(Self { conn })
    }

    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl MemberRepository for SqliteMemberRepository<'_> {
    fn insert_member(&self, unit_uuid: UnitId, member: &NewMember) -> RepoResult<Member> {
        let member_uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO members (
                member_uuid,
                unit_uuid,
                full_name,
                position,
                hired_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                member_uuid.to_string(),
                unit_uuid.to_string(),
                member.full_name.as_str(),
                member.position.as_str(),
                member.hired_at.map(format_hire_date),
            ],
        )?;
        self.get_member(member_uuid)?
            .ok_or(RepoError::MemberNotFound(member_uuid))
    }

    fn get_member(&self, member_uuid: MemberId) -> RepoResult<Option<Member>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{MEMBER_SELECT_SQL} WHERE member_uuid = ?1;"))?;
        let mut rows = stmt.query([member_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_member_row(row)?));
        }
        Ok(None)
    }

    fn list_by_unit(&self, unit_uuid: UnitId) -> RepoResult<Vec<Member>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{MEMBER_SELECT_SQL}
             WHERE unit_uuid = ?1
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([unit_uuid.to_string()])?;

        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row)?);
        }
        Ok(members)
    }

    fn update_member(&self, member: &Member) -> RepoResult<Member> {
        let changed = self.conn.execute(
            "UPDATE members
             SET full_name = ?2,
                 position = ?3,
                 hired_at = ?4,
                 updated_at = CAST(unixepoch('subsec') * 1000 AS INTEGER)
             WHERE member_uuid = ?1;",
            params![
                member.member_uuid.to_string(),
                member.full_name.as_str(),
                member.position.as_str(),
                member.hired_at.map(format_hire_date),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::MemberNotFound(member.member_uuid));
        }
        self.get_member(member.member_uuid)?
            .ok_or(RepoError::MemberNotFound(member.member_uuid))
    }

    fn delete_member(&self, member_uuid: MemberId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM members WHERE member_uuid = ?1;",
            [member_uuid.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::MemberNotFound(member_uuid));
        }
        Ok(())
    }

    fn delete_by_unit(&self, unit_uuid: UnitId) -> RepoResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM members WHERE unit_uuid = ?1;",
            [unit_uuid.to_string()],
        )?;
        Ok(removed)
    }

    fn reassign_unit(&self, from_unit: UnitId, to_unit: UnitId) -> RepoResult<usize> {
        let moved = self.conn.execute(
            "UPDATE members
             SET unit_uuid = ?2,
                 updated_at = CAST(unixepoch('subsec') * 1000 AS INTEGER)
             WHERE unit_uuid = ?1;",
            params![from_unit.to_string(), to_unit.to_string()],
        )?;
        Ok(moved)
    }
}

fn format_hire_date(date: NaiveDate) -> String {
    date.format(HIRE_DATE_FORMAT).to_string()
}

fn parse_member_row(row: &Row<'_>) -> RepoResult<Member> {
    let member_uuid_text: String = row.get("member_uuid")?;
    let member_uuid = parse_uuid(&member_uuid_text, "members.member_uuid")?;
    let unit_uuid_text: String = row.get("unit_uuid")?;
    let unit_uuid = parse_uuid(&unit_uuid_text, "members.unit_uuid")?;

    let hired_at = row
        .get::<_, Option<String>>("hired_at")?
        .map(|value| {
            parse_hire_date(&value).map_err(|_| {
                RepoError::InvalidData(format!("invalid date `{value}` in members.hired_at"))
            })
        })
        .transpose()?;

    Ok(Member {
        member_uuid,
        unit_uuid,
        full_name: row.get("full_name")?,
        position: row.get("position")?,
        hired_at,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
