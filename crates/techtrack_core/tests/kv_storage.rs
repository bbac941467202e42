use techtrack_core::db::{open_db, open_db_in_memory};
use techtrack_core::{KvStore, SqliteKvStore};

#[test]
fn missing_key_reads_as_none() {
    let conn = open_db_in_memory().unwrap();
    let kv = SqliteKvStore::new(&conn);

    assert_eq!(kv.get("technologies").unwrap(), None);
}

#[test]
fn set_replaces_previous_value() {
    let conn = open_db_in_memory().unwrap();
    let kv = SqliteKvStore::new(&conn);

    kv.set("technologies", "[]").unwrap();
    kv.set("technologies", "[1]").unwrap();
    kv.set("other", "x").unwrap();

    assert_eq!(kv.get("technologies").unwrap().as_deref(), Some("[1]"));
    assert_eq!(kv.get("other").unwrap().as_deref(), Some("x"));

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM kv_entries;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 2);
}

#[test]
fn values_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kv.db");

    {
        let conn = open_db(&path).unwrap();
        SqliteKvStore::new(&conn).set("k", "persisted").unwrap();
    }

    let conn = open_db(&path).unwrap();
    assert_eq!(
        SqliteKvStore::new(&conn).get("k").unwrap().as_deref(),
        Some("persisted")
    );
}
