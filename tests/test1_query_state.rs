use sql_silo::prelude::*;

#[test]
fn generated_keys_never_collide() {
    let mut q = QueryState::new("users");
    let named = q.param("x", Some("p_1"));
    let first = q.param(10, None);
    let second = q.param(20, None);
    assert_eq!(named, ":p_1");
    // p_1 is taken, so counting starts at the param count and skips it.
    assert_eq!(first, ":p_2");
    assert_eq!(second, ":p_3");
    assert_eq!(q.params.len(), 3);
    assert_eq!(q.params.get("p_2"), Some(&SqlValue::Int(10)));
}

#[test]
fn keyed_batches_share_a_prefix() {
    let mut q = QueryState::new("users");
    let tokens = q.params([("a", 1), ("b", 2)], Some("ids"));
    assert_eq!(tokens, "(:ids_a, :ids_b)");

    let list = q.params_list(["x", "y"]);
    assert_eq!(list, "(:p_2_0, :p_2_1)");
    assert_eq!(q.params.get("p_2_1"), Some(&SqlValue::from("y")));

    // A later single param does not reuse the batch prefix.
    assert_eq!(q.param(0, None), ":p_4");
}

#[test]
fn clause_overwrites_are_reported_not_rejected() {
    let q = QueryState::new("t")
        .where_(["a = 1"])
        .where_(["b = 2"])
        .order(["a"])
        .order(["b DESC"]);
    assert_eq!(q.where_clause.as_deref(), Some("b = 2"));
    assert_eq!(q.order.as_deref(), Some("b DESC"));
    assert_eq!(q.diagnostics(), ["overriding where clause", "overriding order clause"]);
}

#[test]
fn condition_helpers_compose_with_and() {
    let q = QueryState::new("t")
        .eq("a", 1)
        .neq("b", "x")
        .gt("c", 2)
        .lte("d", 3.5)
        .is_in("e", [7, 8]);
    assert_eq!(
        q.where_clause.as_deref(),
        Some("a = :p_0 AND b <> :p_1 AND c > :p_2 AND d <= :p_3 AND e IN (:p_4_0, :p_4_1)")
    );
    assert_eq!(q.params.get("p_3"), Some(&SqlValue::Float(3.5)));
}

#[test]
fn empty_in_list_matches_nothing() {
    let q = QueryState::new("t").is_in("id", Vec::<i64>::new());
    assert_eq!(q.where_clause.as_deref(), Some("1=0"));
    assert!(q.params.is_empty());
}

#[test]
fn builder_sets_projection_target_and_connection() {
    let q = QueryState::new("orders")
        .fields("id, total")
        .in_db("shop")
        .on_connection("reporting")
        .limit(20, Some(40))
        .bind("o_total", SqlValue::Null);
    assert_eq!(q.fields.as_deref(), Some("id, total"));
    assert_eq!(q.db.as_deref(), Some("shop"));
    assert_eq!(q.connection, "reporting");
    assert_eq!((q.limit, q.offset), (Some(20), Some(40)));
    assert!(q.params.contains_key("o_total"));
}

#[test]
fn comma_and_wrap_build_lists() {
    assert_eq!(wrap(&comma(["a", "b", "c"])), "(a, b, c)");
    assert_eq!(comma(Vec::<String>::new()), "");
}

#[test]
fn translation_follows_each_dialect() {
    let sql = "SELECT * FROM t WHERE a = :x AND b = :y OR c = :x";

    let sqlite = translate_named(sql, Dialect::Sqlite);
    assert_eq!(sqlite.sql, "SELECT * FROM t WHERE a = ?1 AND b = ?2 OR c = ?1");
    assert_eq!(sqlite.names, ["x", "y"]);

    let postgres = translate_named(sql, Dialect::Postgres);
    assert_eq!(postgres.sql, "SELECT * FROM t WHERE a = $1 AND b = $2 OR c = $1");

    let mysql = translate_named(sql, Dialect::Mysql);
    assert_eq!(mysql.sql, "SELECT * FROM t WHERE a = ? AND b = ? OR c = ?");
    assert_eq!(mysql.names, ["x", "y", "x"]);

    let generic = translate_named(sql, Dialect::Generic);
    assert_eq!(generic.sql, sql);
    assert_eq!(generic.names, ["x", "y"]);
}

#[test]
fn translation_skips_literals_comments_and_casts() {
    let sql = "SELECT ':a', \"col:b\", x::text -- :c\nFROM t /* :d */ WHERE y = :e";
    let out = translate_named(sql, Dialect::Postgres);
    assert_eq!(
        out.sql,
        "SELECT ':a', \"col:b\", x::text -- :c\nFROM t /* :d */ WHERE y = $1"
    );
    assert_eq!(out.names, ["e"]);
}

#[test]
fn dialect_parses_from_names_and_config() {
    assert_eq!(Dialect::from_driver_name("pgsql"), Dialect::Postgres);
    assert_eq!(Dialect::from_driver_name("MariaDB"), Dialect::Mysql);
    assert_eq!(Dialect::from_driver_name("oci"), Dialect::Generic);
    let parsed: Dialect = serde_json::from_str("\"mariadb\"").expect("alias");
    assert_eq!(parsed, Dialect::Mysql);
}
