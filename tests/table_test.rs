//! Table behaviour through the public API.

use arbordb::{record, ColumnType, Error, Record, Schema, Table, Value};
use tempfile::tempdir;

fn people() -> Table {
    let schema = Schema::new(
        [("id", ColumnType::Integer), ("name", ColumnType::Text)],
        "id",
    )
    .unwrap();
    Table::new("people", schema)
}

fn person(id: i64, name: &str) -> Record {
    record([("id", Value::from(id)), ("name", Value::from(name))])
}

#[test]
fn test_duplicate_primary_key_rejected() {
    let mut table = people();

    assert!(table.insert(person(1, "a")).unwrap());
    assert!(!table.insert(person(1, "a")).unwrap());
    assert_eq!(table.select_all().len(), 1);
}

#[test]
fn test_duplicate_does_not_overwrite() {
    let mut table = people();
    table.insert(person(1, "a")).unwrap();
    table.insert(person(1, "b")).unwrap();
    assert_eq!(table.select(&Value::from(1)).unwrap()["name"], Value::from("a"));
}

#[test]
fn test_primary_key_is_immutable() {
    let mut table = people();
    table.insert(person(1, "a")).unwrap();

    let err = table.update(&Value::from(1), record([("id", Value::from(2))]));
    assert!(matches!(err, Err(Error::SchemaViolation(_))));

    assert!(table
        .update(&Value::from(1), record([("name", Value::from("b"))]))
        .unwrap());
    let row = table.select(&Value::from(1)).unwrap();
    assert_eq!(row["id"], Value::from(1));
    assert_eq!(row["name"], Value::from("b"));
    assert!(table.select(&Value::from(2)).is_none());
}

#[test]
fn test_update_wrong_type_rejected() {
    let mut table = people();
    table.insert(person(1, "a")).unwrap();
    let err = table.update(&Value::from(1), record([("name", Value::from(5))]));
    assert!(matches!(err, Err(Error::SchemaViolation(_))));
    assert_eq!(table.select(&Value::from(1)).unwrap()["name"], Value::from("a"));
}

#[test]
fn test_select_range_and_all_are_ordered() {
    let mut table = people();
    for id in [42, 7, 19, 3, 88, 61, 25] {
        table.insert(person(id, &format!("p{}", id))).unwrap();
    }

    let ids = |rows: Vec<&Record>| -> Vec<i64> {
        rows.iter().map(|r| r["id"].as_integer().unwrap()).collect()
    };
    assert_eq!(ids(table.select_all()), vec![3, 7, 19, 25, 42, 61, 88]);
    assert_eq!(
        ids(table.select_range(&Value::from(7), &Value::from(42))),
        vec![7, 19, 25, 42]
    );
    assert!(table
        .select_range(&Value::from(100), &Value::from(200))
        .is_empty());
}

#[test]
fn test_text_primary_key() {
    let schema = Schema::parse("email:str,age:int", "email").unwrap();
    let mut table = Table::new("users", schema);
    for (email, age) in [("c@x", 30), ("a@x", 20), ("b@x", 25)] {
        table
            .insert(record([("email", Value::from(email)), ("age", Value::from(age))]))
            .unwrap();
    }
    let emails: Vec<&str> = table
        .select_all()
        .iter()
        .map(|r| r["email"].as_text().unwrap())
        .collect();
    assert_eq!(emails, vec!["a@x", "b@x", "c@x"]);
}

#[test]
fn test_many_rows_keep_index_valid() {
    let mut table = people();
    for id in 0..500 {
        table.insert(person((id * 37) % 500, "x")).unwrap();
    }
    assert_eq!(table.len(), 500);
    for id in (0..500).step_by(2) {
        assert!(table.delete(&Value::from(id)));
    }
    assert_eq!(table.len(), 250);
    assert!(table.index().validate());
}

#[test]
fn test_persist_load_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("people.tbl");

    let mut table = people();
    table.set_target(&path);
    for id in 0..64 {
        table.insert(person(id, &format!("name-{}", id))).unwrap();
    }
    table.delete(&Value::from(10));
    table
        .update(&Value::from(11), record([("name", Value::from("renamed"))]))
        .unwrap();
    table.persist().unwrap();

    let placeholder = Schema::new([("k", ColumnType::Integer)], "k").unwrap();
    let mut fresh = Table::new("placeholder", placeholder);
    fresh.set_target(&path);
    assert!(fresh.load());

    assert_eq!(fresh.name(), "people");
    assert_eq!(fresh.schema(), table.schema());
    assert_eq!(fresh.select_all(), table.select_all());
    assert_eq!(
        fresh.select(&Value::from(11)).unwrap()["name"],
        Value::from("renamed")
    );
    assert!(fresh.select(&Value::from(10)).is_none());
}
