use orgtree_core::db::migrations::latest_version;
use orgtree_core::db::open_db_in_memory;
use orgtree_core::{
    MemberRepository, NewMember, RepoError, SqliteMemberRepository, SqliteUnitRepository,
    UnitRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

#[test]
fn try_new_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteUnitRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        } if expected_version == latest_version()
    ));
}

#[test]
fn try_new_reports_missing_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let err = SqliteMemberRepository::try_new(&conn).err().unwrap();
    assert!(matches!(err, RepoError::MissingRequiredTable("members")));
}

#[test]
fn insert_and_get_unit() {
    let conn = setup();
    let repo = SqliteUnitRepository::try_new(&conn).unwrap();

    let root = repo.insert_unit("Company", None).unwrap();
    let child = repo.insert_unit("IT", Some(root.unit_uuid)).unwrap();

    let loaded = repo.get_unit(child.unit_uuid).unwrap().unwrap();
    assert_eq!(loaded.name, "IT");
    assert_eq!(loaded.parent_uuid, Some(root.unit_uuid));
    assert!(root.is_root());
    assert!(loaded.created_at > 0);
    assert!(repo.get_unit(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn exists_by_name_and_parent_scopes_by_parent_and_roots() {
    let conn = setup();
    let repo = SqliteUnitRepository::try_new(&conn).unwrap();

    let company = repo.insert_unit("Company", None).unwrap();
    let it = repo.insert_unit("IT", Some(company.unit_uuid)).unwrap();

    assert!(repo
        .exists_by_name_and_parent("Company", None, None)
        .unwrap());
    assert!(!repo
        .exists_by_name_and_parent("IT", None, None)
        .unwrap());
    assert!(repo
        .exists_by_name_and_parent("IT", Some(company.unit_uuid), None)
        .unwrap());
    assert!(!repo
        .exists_by_name_and_parent("IT", Some(company.unit_uuid), Some(it.unit_uuid))
        .unwrap());
    assert!(!repo
        .exists_by_name_and_parent("Company", None, Some(company.unit_uuid))
        .unwrap());
}

#[test]
fn list_children_keeps_insertion_order_for_roots_and_parents() {
    let conn = setup();
    let repo = SqliteUnitRepository::try_new(&conn).unwrap();

    let first_root = repo.insert_unit("Zulu", None).unwrap();
    let second_root = repo.insert_unit("Alpha", None).unwrap();
    let child_a = repo.insert_unit("Beta", Some(first_root.unit_uuid)).unwrap();
    let child_b = repo.insert_unit("Able", Some(first_root.unit_uuid)).unwrap();

    let roots = repo.list_children(None).unwrap();
    assert_eq!(
        roots.iter().map(|unit| unit.unit_uuid).collect::<Vec<_>>(),
        vec![first_root.unit_uuid, second_root.unit_uuid]
    );

    let children = repo.child_ids(first_root.unit_uuid).unwrap();
    assert_eq!(children, vec![child_a.unit_uuid, child_b.unit_uuid]);
    assert!(repo.child_ids(second_root.unit_uuid).unwrap().is_empty());
}

#[test]
fn update_and_delete_unit_report_missing_rows() {
    let conn = setup();
    let repo = SqliteUnitRepository::try_new(&conn).unwrap();
    let missing = Uuid::new_v4();

    let err = repo.update_unit(missing, "Ghost", None).unwrap_err();
    assert!(matches!(err, RepoError::UnitNotFound(id) if id == missing));
    assert_eq!(repo.delete_unit(missing).unwrap(), 0);

    let unit = repo.insert_unit("Sales", None).unwrap();
    let renamed = repo.update_unit(unit.unit_uuid, "Revenue", None).unwrap();
    assert_eq!(renamed.name, "Revenue");
    assert_eq!(repo.delete_unit(unit.unit_uuid).unwrap(), 1);
    assert!(repo.get_unit(unit.unit_uuid).unwrap().is_none());
}

#[test]
fn member_bulk_reassign_and_delete_by_unit() {
    let conn = setup();
    let units = SqliteUnitRepository::try_new(&conn).unwrap();
    let members = SqliteMemberRepository::try_new(&conn).unwrap();

    let from = units.insert_unit("From", None).unwrap();
    let to = units.insert_unit("To", None).unwrap();
    members
        .insert_member(from.unit_uuid, &NewMember::new("A", "Engineer"))
        .unwrap();
    members
        .insert_member(from.unit_uuid, &NewMember::new("B", "Engineer"))
        .unwrap();

    assert_eq!(members.reassign_unit(from.unit_uuid, to.unit_uuid).unwrap(), 2);
    assert!(members.list_by_unit(from.unit_uuid).unwrap().is_empty());
    assert_eq!(members.list_by_unit(to.unit_uuid).unwrap().len(), 2);

    assert_eq!(members.delete_by_unit(to.unit_uuid).unwrap(), 2);
    assert_eq!(members.delete_by_unit(to.unit_uuid).unwrap(), 0);
}

#[test]
fn corrupt_hire_date_is_reported_as_invalid_data() {
    let conn = setup();
    let units = SqliteUnitRepository::try_new(&conn).unwrap();
    let members = SqliteMemberRepository::try_new(&conn).unwrap();

    let unit = units.insert_unit("Ops", None).unwrap();
    let member = members
        .insert_member(unit.unit_uuid, &NewMember::new("A", "Engineer"))
        .unwrap();
    conn.execute(
        "UPDATE members SET hired_at = 'yesterday' WHERE member_uuid = ?1;",
        [member.member_uuid.to_string()],
    )
    .unwrap();

    let err = members.get_member(member.member_uuid).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("hired_at")));
}
