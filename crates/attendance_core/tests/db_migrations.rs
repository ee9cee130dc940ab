use attendance_core::db::migrations::{latest_version, schema_version};
use attendance_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    for table in ["personnel", "time_slots", "daily_classes", "attendance"] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn open_db_enables_foreign_keys() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn schema_rejects_second_class_for_same_date_and_slot() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO time_slots (id, time, label, sort_order) VALUES ('s1', '09:00:00', '09:00 AM', 1);
         INSERT INTO daily_classes (id, class_date, time_slot_id, class_name)
         VALUES ('c1', '2024-01-10', 's1', 'Drill');",
    )
    .unwrap();

    let duplicate = conn.execute(
        "INSERT INTO daily_classes (id, class_date, time_slot_id, class_name)
         VALUES ('c2', '2024-01-10', 's1', 'Other');",
        [],
    );
    assert!(duplicate.is_err());
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("attendance.sqlite3");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first).unwrap(), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second).unwrap(), latest_version());
    assert_table_exists(&conn_second, "attendance");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }

    let untouched = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&untouched).unwrap(), 999);
    assert!(!table_present(&untouched, "personnel"));
}

fn table_present(conn: &Connection, table_name: &str) -> bool {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    exists == 1
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    assert!(table_present(conn, table_name), "table {table_name} does not exist");
}
