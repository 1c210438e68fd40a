use sql_silo::prelude::*;
use sql_silo::test_utils::{Recorded, RecordingConnection};

fn recording(dialect: Dialect) -> (Driver, RecordingConnection) {
    let conn = RecordingConnection::new(dialect);
    let log = conn.clone();
    (Driver::new(conn), log)
}

fn values(params: &[BoundParam]) -> Vec<SqlValue> {
    params.iter().map(|p| p.value.clone()).collect()
}

#[test]
fn mysql_qualifies_tables_and_reads_last_insert_id() -> Result<(), SiloError> {
    let (mut driver, log) = recording(Dialect::Mysql);
    log.set_last_insert_id(42);

    let id = driver.insert(QueryState::new("orders").in_db("shop").set("total", 9.5), &["id"])?;
    assert_eq!(id, Some(SqlValue::Int(42)));

    let rows = driver.select(QueryState::new("orders").in_db("shop").eq("id", 42))?.count();
    assert_eq!(rows, 0);

    assert_eq!(
        log.statements(),
        [
            "INSERT INTO shop.orders (`total`) VALUES (?)",
            "SELECT * FROM shop.orders WHERE id = ?",
        ]
    );
    Ok(())
}

#[test]
fn mysql_binds_repeated_placeholders_once_per_use() -> Result<(), SiloError> {
    let (mut driver, log) = recording(Dialect::Mysql);
    driver.execute(
        "UPDATE t SET a = :x WHERE b = :y OR c = :x",
        &ValueMap::from([("x", 1), ("y", 2)]),
    )?;
    assert_eq!(log.statements(), ["UPDATE t SET a = ? WHERE b = ? OR c = ?"]);
    let names: Vec<String> = log.last_params().into_iter().map(|p| p.name).collect();
    assert_eq!(names, ["x", "y", "x"]);
    Ok(())
}

#[test]
fn mysql_limits_mutations_in_place() -> Result<(), SiloError> {
    let (mut driver, log) = recording(Dialect::Mysql);
    log.push_affected(5);
    let updated = driver.update(
        QueryState::new("jobs")
            .eq("state", "done")
            .order(["id"])
            .limit(5, None)
            .set("state", "archived"),
    )?;
    assert_eq!(updated, 5);
    assert_eq!(
        log.statements(),
        ["UPDATE jobs SET `state` = ? WHERE state = ? ORDER BY id LIMIT 5"]
    );
    assert_eq!(
        values(&log.last_params()),
        [SqlValue::from("archived"), SqlValue::from("done")]
    );
    Ok(())
}

#[test]
fn mysql_mutations_refuse_an_offset() {
    let (mut driver, log) = recording(Dialect::Mysql);
    let err = driver
        .delete(QueryState::new("jobs").order(["id"]).limit(10, Some(20)))
        .expect_err("offset on DELETE");
    assert!(matches!(err, SiloError::ParameterError(_)));
    let err = driver
        .update(
            QueryState::new("jobs")
                .order(["id"])
                .limit(10, Some(20))
                .set("state", "archived"),
        )
        .expect_err("offset on UPDATE");
    assert!(matches!(err, SiloError::ParameterError(_)));
    assert!(log.statements().is_empty());
}

#[test]
fn postgres_insert_reads_key_from_returning()-> Result<(), SiloError> {
    let (mut driver, log) = recording(Dialect::Postgres);
    log.push_rows(&["id"], vec![vec![SqlValue::Int(7)]]);
    let id = driver.insert(QueryState::new("t").set("name", "a"), &["id"])?;
    assert_eq!(id, Some(SqlValue::Int(7)));
    assert_eq!(
        log.statements(),
        ["INSERT INTO t (\"name\") VALUES ($1) RETURNING \"id\""]
    );
    Ok(())
}

#[test]
fn postgres_composite_key_is_not_returned() -> Result<(), SiloError> {
    let (mut driver, log) = recording(Dialect::Postgres);
    log.push_rows(&["org", "member"], vec![vec!["acme".into(), "ann".into()]]);
    let key = driver.insert(
        QueryState::new("memberships").set("org", "acme").set("member", "ann"),
        &["org", "member"],
    )?;
    assert_eq!(key, None);
    assert_eq!(
        log.statements(),
        ["INSERT INTO memberships (\"org\", \"member\") VALUES ($1, $2) RETURNING \"org\", \"member\""]
    );
    Ok(())
}

#[test]
fn postgres_insert_without_key_skips_returning() -> Result<(), SiloError> {
    let (mut driver, log) = recording(Dialect::Postgres);
    let key = driver.insert(QueryState::new("events"), &[])?;
    assert_eq!(key, None);
    assert_eq!(log.statements(), ["INSERT INTO events DEFAULT VALUES"]);
    Ok(())
}

#[test]
fn postgres_asserts_the_session_database_once() -> Result<(), SiloError> {
    let (mut driver, log) = recording(Dialect::Postgres);
    log.push_rows(&["current_database"], vec![vec!["app".into()]]);

    let err = driver
        .count(QueryState::new("users").in_db("billing"))
        .expect_err("different database");
    assert!(matches!(
        err,
        SiloError::CrossDatabase { ref declared, ref actual } if declared == "billing" && actual == "app"
    ));

    log.push_rows(&["count"], vec![vec![SqlValue::Int(3)]]);
    assert_eq!(driver.count(QueryState::new("users").in_db("app"))?, 3);
    assert_eq!(
        log.statements(),
        ["SELECT current_database()", "SELECT COUNT(*) FROM users"]
    );
    Ok(())
}

#[test]
fn postgres_limited_delete_goes_through_ctid() -> Result<(), SiloError> {
    let (mut driver, log) = recording(Dialect::Postgres);
    driver.delete(
        QueryState::new("jobs")
            .eq("state", "done")
            .order(["id"])
            .limit(10, None),
    )?;
    assert_eq!(
        log.statements(),
        ["DELETE FROM jobs WHERE ctid IN (SELECT ctid FROM jobs WHERE state = $1 ORDER BY id LIMIT 10)"]
    );
    Ok(())
}

#[test]
fn postgres_select_pages_with_offset() -> Result<(), SiloError> {
    let (mut driver, log) = recording(Dialect::Postgres);
    driver.select(QueryState::new("t").order(["id"]).limit(25, Some(50)))?;
    assert_eq!(log.statements(), ["SELECT * FROM t ORDER BY id LIMIT 25 OFFSET 50"]);
    Ok(())
}

#[test]
fn generic_dialect_keeps_named_placeholders() -> Result<(), SiloError> {
    let (mut driver, log) = recording(Dialect::Generic);
    driver.execute(
        "UPDATE t SET a = :a WHERE id = :id OR parent = :id",
        &ValueMap::from([("a", 1), ("id", 2)]),
    )?;
    assert_eq!(
        log.statements(),
        ["UPDATE t SET a = :a WHERE id = :id OR parent = :id"]
    );
    let names: Vec<String> = log.last_params().into_iter().map(|p| p.name).collect();
    assert_eq!(names, ["a", "id"]);
    Ok(())
}

#[test]
fn output_params_are_captured_after_execute() -> Result<(), SiloError> {
    let (mut driver, log) = recording(Dialect::Mysql);
    log.set_output(ValueMap::from([("o_total", 99)]));
    let params = ValueMap::from([("o_total", SqlValue::Null), ("n", SqlValue::Int(3))]);
    driver.execute("CALL tally(:n, :o_total)", &params)?;

    let bound = log.last_params();
    assert_eq!(bound[0].direction, ParamDirection::In);
    assert_eq!(bound[1].direction, ParamDirection::InOut);
    assert_eq!(driver.output_params().get("o_total"), Some(&SqlValue::Int(99)));
    assert_eq!(driver.output_params().get("n"), Some(&SqlValue::Int(3)));
    Ok(())
}

#[test]
fn output_params_come_from_the_statement_just_run() -> Result<(), SiloError> {
    let (mut driver, log) = recording(Dialect::Postgres);
    let params = ValueMap::from([("o_total", SqlValue::Null)]);

    log.push_output(ValueMap::from([("o_total", 1)]));
    driver.execute("CALL tally(:o_total)", &params)?;
    assert_eq!(driver.output_params().get("o_total"), Some(&SqlValue::Int(1)));

    log.push_output(ValueMap::from([("o_total", 42)]));
    driver.query("SELECT :o_total AS total", &params)?;
    assert_eq!(driver.output_params().get("o_total"), Some(&SqlValue::Int(42)));

    log.push_output(ValueMap::from([("o_total", 7)]));
    log.push_rows(&["count"], vec![vec![SqlValue::Int(0)]]);
    driver.count(QueryState::new("t").bind("o_total", SqlValue::Null))?;
    assert_eq!(driver.output_params().get("o_total"), Some(&SqlValue::Int(7)));
    Ok(())
}

#[test]
fn backend_errors_pass_through_unchanged() {
    let (mut driver, log) = recording(Dialect::Sqlite);
    log.fail_next(SiloError::execution("19", "constraint failed"));
    let err = driver
        .execute("DELETE FROM t", &ValueMap::new())
        .expect_err("scripted failure");
    assert_eq!(err.code(), Some("19"));
    assert_eq!(
        log.log(),
        [Recorded::Execute {
            sql: "DELETE FROM t".into(),
            params: vec![],
        }]
    );
}

#[test]
fn schema_locates_with_dialect_quoting() -> Result<(), SiloError> {
    let conn = RecordingConnection::new(Dialect::Mysql);
    let log = conn.clone();
    let mut registry = ConnectionRegistry::with_default(Driver::new(conn));

    let row = ValueMap::from([("id", 12)]);
    Schema::rows(&mut registry, "users", &["id"]).locate(&row)?.run_delete()?;

    let keyed = ValueMap::from([("key", "a"), ("value", "1")]);
    Schema::rows(&mut registry, "settings", &["key"])
        .locate_multi([&keyed])?
        .run_delete()?;
    assert_eq!(
        log.statements(),
        [
            "DELETE FROM users WHERE `id` = ?",
            "DELETE FROM settings WHERE (`key`) IN ((?))",
        ]
    );
    Ok(())
}

#[test]
fn schema_locate_multi_builds_row_value_list() -> Result<(), SiloError> {
    let conn = RecordingConnection::new(Dialect::Postgres);
    let log = conn.clone();
    let mut registry = ConnectionRegistry::with_default(Driver::new(conn));

    let first = ValueMap::from([("org", "acme"), ("member", "ann")]);
    let second = ValueMap::from([("member", "bob"), ("org", "initech")]);
    log.push_rows(&["count"], vec![vec![SqlValue::Int(2)]]);
    let count = Schema::rows(&mut registry, "memberships", &["org", "member"])
        .locate_multi([&first, &second])?
        .run_count()?;
    assert_eq!(count, 2);
    assert_eq!(
        log.statements(),
        ["SELECT COUNT(*) FROM memberships WHERE (\"org\", \"member\") IN (($1, $2), ($3, $4))"]
    );
    assert_eq!(
        values(&log.last_params()),
        [
            SqlValue::from("acme"),
            SqlValue::from("ann"),
            SqlValue::from("initech"),
            SqlValue::from("bob"),
        ]
    );
    Ok(())
}
