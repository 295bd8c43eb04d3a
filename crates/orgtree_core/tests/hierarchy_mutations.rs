use orgtree_core::db::open_db_in_memory;
use orgtree_core::{
    HierarchyError, HierarchyService, Unit, UnitId, UnitUpdate, ValidationError, MAX_TEXT_CHARS,
};
use rusqlite::Connection;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn create(service: &HierarchyService<'_>, name: &str, parent: Option<&Unit>) -> Unit {
    service
        .create_unit(name, parent.map(|unit| unit.unit_uuid))
        .unwrap()
}

fn all_units(conn: &Connection) -> Vec<(UnitId, String, Option<UnitId>)> {
    let mut stmt = conn
        .prepare("SELECT unit_uuid, name, parent_uuid FROM units ORDER BY rowid;")
        .unwrap();
    let mut rows = stmt.query([]).unwrap();
    let mut units = Vec::new();
    while let Some(row) = rows.next().unwrap() {
        let id: String = row.get(0).unwrap();
        let parent: Option<String> = row.get(2).unwrap();
        units.push((
            Uuid::parse_str(&id).unwrap(),
            row.get(1).unwrap(),
            parent.map(|value| Uuid::parse_str(&value).unwrap()),
        ));
    }
    units
}

/// Walks every parent chain and checks sibling scopes for duplicate names.
fn assert_tree_invariants(conn: &Connection) {
    let units = all_units(conn);
    let parents: HashMap<UnitId, Option<UnitId>> =
        units.iter().map(|(id, _, parent)| (*id, *parent)).collect();

    for (id, _, _) in &units {
        let mut seen = HashSet::from([*id]);
        let mut cursor = parents[id];
        while let Some(current) = cursor {
            assert!(parents.contains_key(&current), "dangling parent {current}");
            assert!(seen.insert(current), "cycle through {current}");
            cursor = parents[&current];
        }
    }

    let mut scopes = HashSet::new();
    for (_, name, parent) in &units {
        assert!(
            scopes.insert((*parent, name.clone())),
            "duplicate sibling name `{name}`"
        );
    }
}

#[test]
fn duplicate_sibling_name_is_rejected() {
    let conn = setup();
    let service = HierarchyService::try_new(&conn).unwrap();

    let company = create(&service, "Company", None);
    create(&service, "IT", Some(&company));
    create(&service, "HR", Some(&company));

    let err = service
        .create_unit("IT", Some(company.unit_uuid))
        .unwrap_err();
    assert!(matches!(
        err,
        HierarchyError::Duplicate { ref name, parent_uuid } if name == "IT" && parent_uuid == Some(company.unit_uuid)
    ));
    assert_eq!(err.code(), "duplicate");
    assert_eq!(service.list_children(Some(company.unit_uuid)).unwrap().len(), 2);
}

#[test]
fn root_scope_is_a_sibling_scope() {
    let conn = setup();
    let service = HierarchyService::try_new(&conn).unwrap();

    create(&service, "Company", None);
    let err = service.create_unit("  Company ", None).unwrap_err();
    assert!(matches!(
        err,
        HierarchyError::Duplicate { parent_uuid: None, .. }
    ));
}

#[test]
fn same_name_is_allowed_under_different_parents() {
    let conn = setup();
    let service = HierarchyService::try_new(&conn).unwrap();

    let east = create(&service, "East", None);
    let west = create(&service, "West", None);
    create(&service, "Sales", Some(&east));
    let west_sales = create(&service, "Sales", Some(&west));
    assert_eq!(west_sales.parent_uuid, Some(west.unit_uuid));
    assert_tree_invariants(&conn);
}

#[test]
fn create_trims_name_and_rejects_invalid_names() {
    let conn = setup();
    let service = HierarchyService::try_new(&conn).unwrap();

    let unit = create(&service, "  Finance  ", None);
    assert_eq!(unit.name, "Finance");

    let err = service.create_unit("   ", None).unwrap_err();
    assert!(matches!(
        err,
        HierarchyError::Validation(ValidationError::Blank { field: "name" })
    ));

    let long_name = "x".repeat(MAX_TEXT_CHARS + 1);
    let err = service.create_unit(&long_name, None).unwrap_err();
    assert!(matches!(
        err,
        HierarchyError::Validation(ValidationError::TooLong { .. })
    ));
}

#[test]
fn create_under_unknown_parent_fails_not_found() {
    let conn = setup();
    let service = HierarchyService::try_new(&conn).unwrap();
    let unknown = Uuid::new_v4();

    let err = service.create_unit("Orphan", Some(unknown)).unwrap_err();
    assert!(matches!(err, HierarchyError::NotFound(id) if id == unknown));
    assert!(all_units(&conn).is_empty());
}

#[test]
fn rename_checks_current_siblings_excluding_self() {
    let conn = setup();
    let service = HierarchyService::try_new(&conn).unwrap();

    let company = create(&service, "Company", None);
    let it = create(&service, "IT", Some(&company));
    create(&service, "HR", Some(&company));

    let err = service.rename_unit(it.unit_uuid, "HR").unwrap_err();
    assert!(matches!(err, HierarchyError::Duplicate { .. }));

    let same = service.rename_unit(it.unit_uuid, " IT ").unwrap();
    assert_eq!(same.name, "IT");

    let renamed = service.rename_unit(it.unit_uuid, "Engineering").unwrap();
    assert_eq!(renamed.name, "Engineering");
    assert_eq!(renamed.parent_uuid, Some(company.unit_uuid));
    assert!(renamed.updated_at >= it.updated_at);
}

#[test]
fn rename_unknown_unit_fails_not_found() {
    let conn = setup();
    let service = HierarchyService::try_new(&conn).unwrap();
    let unknown = Uuid::new_v4();

    let err = service.rename_unit(unknown, "Anything").unwrap_err();
    assert!(matches!(err, HierarchyError::NotFound(id) if id == unknown));
}

#[test]
fn move_under_self_fails_self_reference() {
    let conn = setup();
    let service = HierarchyService::try_new(&conn).unwrap();
    let a = create(&service, "A", None);

    let err = service.move_unit(a.unit_uuid, a.unit_uuid).unwrap_err();
    assert!(matches!(err, HierarchyError::SelfReference(id) if id == a.unit_uuid));
    assert_eq!(service.get_unit(a.unit_uuid).unwrap().parent_uuid, None);
}

#[test]
fn move_under_descendant_fails_cyclic_reference_and_leaves_tree_unchanged() {
    let conn = setup();
    let service = HierarchyService::try_new(&conn).unwrap();

    let a = create(&service, "A", None);
    let b = create(&service, "B", Some(&a));
    let c = create(&service, "C", Some(&b));
    let before = all_units(&conn);

    let err = service.move_unit(a.unit_uuid, c.unit_uuid).unwrap_err();
    assert!(matches!(
        err,
        HierarchyError::CyclicReference {
            unit_uuid,
            parent_uuid,
        } if unit_uuid == a.unit_uuid && parent_uuid == c.unit_uuid
    ));

    let err = service.move_unit(a.unit_uuid, b.unit_uuid).unwrap_err();
    assert!(matches!(err, HierarchyError::CyclicReference { .. }));

    assert_eq!(all_units(&conn), before);
    assert_tree_invariants(&conn);
}

#[test]
fn move_to_unknown_parent_fails_not_found() {
    let conn = setup();
    let service = HierarchyService::try_new(&conn).unwrap();
    let a = create(&service, "A", None);
    let unknown = Uuid::new_v4();

    let err = service.move_unit(a.unit_uuid, unknown).unwrap_err();
    assert!(matches!(err, HierarchyError::NotFound(id) if id == unknown));
}

#[test]
fn move_rechecks_current_name_under_new_parent() {
    let conn = setup();
    let service = HierarchyService::try_new(&conn).unwrap();

    let east = create(&service, "East", None);
    let west = create(&service, "West", None);
    let east_sales = create(&service, "Sales", Some(&east));
    create(&service, "Sales", Some(&west));

    let err = service
        .move_unit(east_sales.unit_uuid, west.unit_uuid)
        .unwrap_err();
    assert!(matches!(
        err,
        HierarchyError::Duplicate { parent_uuid, .. } if parent_uuid == Some(west.unit_uuid)
    ));
    assert_eq!(
        service.get_unit(east_sales.unit_uuid).unwrap().parent_uuid,
        Some(east.unit_uuid)
    );
}

#[test]
fn move_to_sibling_subtree_succeeds() {
    let conn = setup();
    let service = HierarchyService::try_new(&conn).unwrap();

    let company = create(&service, "Company", None);
    let it = create(&service, "IT", Some(&company));
    let hr = create(&service, "HR", Some(&company));
    let recruiting = create(&service, "Recruiting", Some(&hr));

    let moved = service
        .move_unit(recruiting.unit_uuid, it.unit_uuid)
        .unwrap();
    assert_eq!(moved.parent_uuid, Some(it.unit_uuid));
    assert_eq!(moved.name, "Recruiting");

    // Moving a parent beneath a unit outside its own subtree is fine.
    let moved_hr = service.move_unit(hr.unit_uuid, it.unit_uuid).unwrap();
    assert_eq!(moved_hr.parent_uuid, Some(it.unit_uuid));
    assert_tree_invariants(&conn);
}

#[test]
fn combined_update_validates_post_update_state() {
    let conn = setup();
    let service = HierarchyService::try_new(&conn).unwrap();

    let east = create(&service, "East", None);
    let west = create(&service, "West", None);
    let ops = create(&service, "Ops", Some(&east));
    create(&service, "Sales", Some(&east));
    create(&service, "Ops", Some(&west));

    // "Sales" collides only under the current parent, which is being left.
    let updated = service
        .update_unit(
            ops.unit_uuid,
            &UnitUpdate {
                name: Some("Sales".to_string()),
                parent_uuid: Some(west.unit_uuid),
            },
        )
        .unwrap();
    assert_eq!(updated.name, "Sales");
    assert_eq!(updated.parent_uuid, Some(west.unit_uuid));

    // Renaming to a name taken under the incoming parent fails as a whole.
    let err = service
        .update_unit(
            updated.unit_uuid,
            &UnitUpdate {
                name: Some("Ops".to_string()),
                parent_uuid: Some(west.unit_uuid),
            },
        )
        .unwrap_err();
    assert!(matches!(err, HierarchyError::Duplicate { .. }));
    let unchanged = service.get_unit(updated.unit_uuid).unwrap();
    assert_eq!(unchanged.name, "Sales");
    assert_tree_invariants(&conn);
}

#[test]
fn empty_update_returns_unit_unchanged() {
    let conn = setup();
    let service = HierarchyService::try_new(&conn).unwrap();
    let a = create(&service, "A", None);

    let same = service
        .update_unit(a.unit_uuid, &UnitUpdate::default())
        .unwrap();
    assert_eq!(same, a);
}

#[test]
fn invariants_hold_after_a_sequence_of_mutations() {
    let conn = setup();
    let service = HierarchyService::try_new(&conn).unwrap();

    let root = create(&service, "Root", None);
    let mut units = vec![root.clone()];
    for index in 0..12 {
        let parent = units[index / 2].clone();
        units.push(create(&service, &format!("U{index}"), Some(&parent)));
    }

    for (index, unit) in units.iter().enumerate().skip(1) {
        let target = &units[(index * 7) % units.len()];
        let _ = service.move_unit(unit.unit_uuid, target.unit_uuid);
        let _ = service.rename_unit(unit.unit_uuid, &format!("U{}", (index * 5) % 13));
        assert_tree_invariants(&conn);
    }
}

#[test]
fn list_children_of_unknown_parent_fails_not_found() {
    let conn = setup();
    let service = HierarchyService::try_new(&conn).unwrap();
    let unknown = Uuid::new_v4();

    let err = service.list_children(Some(unknown)).unwrap_err();
    assert!(matches!(err, HierarchyError::NotFound(id) if id == unknown));
    assert!(service.list_children(None).unwrap().is_empty());
}
