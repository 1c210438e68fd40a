#![cfg(feature = "sqlite")]

use chrono::NaiveDateTime;
use serde_json::json;
use sql_silo::prelude::*;

fn setup() -> Result<ConnectionRegistry, SiloError> {
    let mut registry = ConnectionRegistry::with_default(open_in_memory()?);
    registry.driver(DEFAULT_CONNECTION)?.execute_batch(
        "CREATE TABLE people (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            age INTEGER,
            joined TEXT,
            meta TEXT,
            photo BLOB
        );",
    )?;
    for (name, age) in [("ann", 31), ("bob", 17), ("cid", 45), ("dee", 17)] {
        QueryState::new("people")
            .set("name", name)
            .set("age", age)
            .run_insert(&mut registry, &["id"])?;
    }
    Ok(registry)
}

#[test]
fn insert_returns_rowid_and_select_reads_it_back() -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = setup()?;
    let id = QueryState::new("people")
        .set("name", "eve")
        .set("age", 29)
        .run_insert(&mut registry, &["id"])?;
    assert_eq!(id, Some(SqlValue::Int(5)));

    let row = QueryState::new("people")
        .eq("id", 5)
        .run_select_first(&mut registry)?
        .expect("inserted row");
    assert_eq!(row.try_get::<String>("name")?, "eve");
    assert_eq!(row.try_get::<i64>("age")?, 29);
    assert_eq!(row.try_get::<Option<String>>("meta")?, None);
    Ok(())
}

#[test]
fn select_streams_rows_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = setup()?;
    let cursor = QueryState::new("people")
        .fields("name, age")
        .lt("age", 40)
        .order(["age", ",", "name"])
        .run_select(&mut registry)?;
    assert_eq!(cursor.column_names(), ["name", "age"]);
    let names: Vec<String> = cursor
        .map(|row| row.and_then(|row| row.try_get::<String>("name")))
        .collect::<Result<_, _>>()?;
    assert_eq!(names, ["bob", "dee", "ann"]);
    Ok(())
}

#[test]
fn dropping_a_cursor_early_frees_the_connection() -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = setup()?;
    {
        let mut cursor = QueryState::new("people").order(["id"]).run_select(&mut registry)?;
        let first = cursor.next().expect("a row")?;
        assert_eq!(first.get("name"), Some(&SqlValue::from("ann")));
    }
    // The statement is finalized, so the table can be changed right away.
    registry
        .driver(DEFAULT_CONNECTION)?
        .execute_batch("DROP TABLE people;")?;
    Ok(())
}

#[test]
fn count_update_and_delete_report_rows() -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = setup()?;
    assert_eq!(QueryState::new("people").run_count(&mut registry)?, 4);
    assert_eq!(QueryState::new("people").eq("age", 17).run_count(&mut registry)?, 2);

    let updated = QueryState::new("people")
        .eq("age", 17)
        .set("age", 18)
        .run_update(&mut registry)?;
    assert_eq!(updated, 2);

    let deleted = QueryState::new("people").gte("age", 40).run_delete(&mut registry)?;
    assert_eq!(deleted, 1);
    assert_eq!(QueryState::new("people").run_count(&mut registry)?, 3);
    Ok(())
}

#[test]
fn limited_delete_removes_only_the_first_ordered_rows() -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = setup()?;
    let deleted = QueryState::new("people")
        .eq("age", 17)
        .order(["name DESC"])
        .limit(1, None)
        .run_delete(&mut registry)?;
    assert_eq!(deleted, 1);

    let survivors: Vec<String> = QueryState::new("people")
        .eq("age", 17)
        .run_select(&mut registry)?
        .map(|row| row.and_then(|row| row.try_get::<String>("name")))
        .collect::<Result<_, _>>()?;
    assert_eq!(survivors, ["bob"]);
    Ok(())
}

#[test]
fn limited_update_with_offset() -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = setup()?;
    let updated = QueryState::new("people")
        .order(["id"])
        .limit(2, Some(1))
        .set("age", 0)
        .run_update(&mut registry)?;
    assert_eq!(updated, 2);
    let zeroed: Vec<i64> = QueryState::new("people")
        .fields("id")
        .eq("age", 0)
        .order(["id"])
        .run_select(&mut registry)?
        .map(|row| row.and_then(|row| row.try_get::<i64>("id")))
        .collect::<Result<_, _>>()?;
    assert_eq!(zeroed, [2_i64, 3]);
    Ok(())
}

#[test]
fn typed_values_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = setup()?;
    let joined = NaiveDateTime::parse_from_str("2023-11-02 09:15:00", "%Y-%m-%d %H:%M:%S")?;
    QueryState::new("people")
        .eq("name", "ann")
        .set("joined", joined)
        .set("meta", json!({"team": "core"}))
        .set("photo", vec![0_u8, 1, 2])
        .run_update(&mut registry)?;

    let row = QueryState::new("people")
        .eq("name", "ann")
        .run_select_first(&mut registry)?
        .expect("ann");
    assert_eq!(row.try_get::<NaiveDateTime>("joined")?, joined);
    assert_eq!(row.get("meta"), Some(&SqlValue::from(r#"{"team":"core"}"#)));
    assert_eq!(row.try_get::<Vec<u8>>("photo")?, vec![0, 1, 2]);
    Ok(())
}

#[test]
fn raw_statements_bind_named_params() -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = setup()?;
    let driver = registry.driver(DEFAULT_CONNECTION)?;
    let params = ValueMap::from([("lo", 18), ("hi", 50)]);
    let names: Vec<String> = driver
        .query(
            "SELECT name FROM people WHERE age BETWEEN :lo AND :hi AND age <> :lo ORDER BY name",
            &params,
        )?
        .map(|row| row.and_then(|row| row.try_get::<String>("name")))
        .collect::<Result<_, _>>()?;
    assert_eq!(names, ["ann", "cid"]);
    assert_eq!(driver.output_params(), &params);

    let missing = driver.execute("DELETE FROM people WHERE id = :id", &ValueMap::new());
    assert!(
        matches!(missing, Err(SiloError::ParameterError(msg)) if msg == "no value bound for placeholder :id")
    );
    Ok(())
}

#[test]
fn empty_insert_uses_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = ConnectionRegistry::with_default(open_in_memory()?);
    registry
        .driver(DEFAULT_CONNECTION)?
        .execute_batch("CREATE TABLE ticks (id INTEGER PRIMARY KEY, n INTEGER DEFAULT 7);")?;
    let id = QueryState::new("ticks").run_insert(&mut registry, &["id"])?;
    assert_eq!(id, Some(SqlValue::Int(1)));
    let row = QueryState::new("ticks").run_select_first(&mut registry)?.expect("row");
    assert_eq!(row.get("n"), Some(&SqlValue::Int(7)));
    Ok(())
}

#[test]
fn constraint_violation_carries_extended_code() -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = setup()?;
    let err = QueryState::new("people")
        .set("name", "ann")
        .run_insert(&mut registry, &["id"])
        .expect_err("duplicate name");
    // SQLITE_CONSTRAINT_UNIQUE
    assert_eq!(err.code(), Some("2067"));
    assert!(matches!(err, SiloError::ExecutionError { .. }));
    Ok(())
}

#[test]
fn attached_database_is_qualified() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let archive = dir.path().join("archive.db");
    let mut registry = ConnectionRegistry::with_default(open_in_memory()?);
    let driver = registry.driver(DEFAULT_CONNECTION)?;
    driver.execute(
        "ATTACH DATABASE :path AS archive",
        &ValueMap::from([("path", archive.to_string_lossy().into_owned())]),
    )?;
    driver.execute_batch("CREATE TABLE archive.logs (id INTEGER PRIMARY KEY, msg TEXT);")?;

    QueryState::new("logs")
        .in_db("archive")
        .set("msg", "kept")
        .run_insert(&mut registry, &["id"])?;
    let count = QueryState::new("logs").in_db("archive").run_count(&mut registry)?;
    assert_eq!(count, 1);
    Ok(())
}

#[test]
fn file_database_with_wal_persists() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("app.db").to_string_lossy().into_owned();
    {
        let mut driver = Driver::sqlite_builder(path.clone())
            .wal(true)
            .busy_timeout(std::time::Duration::from_millis(500))
            .build()?;
        driver.execute_batch("CREATE TABLE kv (k TEXT PRIMARY KEY, v TEXT);")?;
        driver.insert(QueryState::new("kv").set("k", "a").set("v", "1"), &["k"])?;
    }
    let mut driver = SqliteOptions::new(path).connect().map(Driver::new)?;
    let row = driver.select_first(QueryState::new("kv").eq("k", "a"))?.expect("persisted");
    assert_eq!(row.try_get::<String>("v")?, "1");
    Ok(())
}
