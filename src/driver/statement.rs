//! SQL text assembly. Pure functions over a [`QueryState`]; placeholders stay
//! in `:name` form until the driver binds the statement.

use crate::dialect::Dialect;
use crate::error::SiloError;
use crate::query_builder::{PLACEHOLDER_SIGIL, QueryState, comma, wrap};

pub(crate) fn select_sql(dialect: Dialect, table: &str, q: &QueryState) -> String {
    let mut sql = format!(
        "SELECT {} FROM {table}",
        q.fields.as_deref().unwrap_or("*")
    );
    push_where(&mut sql, q);
    push_order(&mut sql, q);
    push_limit(&mut sql, dialect, q);
    sql
}

pub(crate) fn count_sql(table: &str, q: &QueryState) -> String {
    let mut sql = format!("SELECT COUNT(*) FROM {table}");
    push_where(&mut sql, q);
    sql
}

pub(crate) fn delete_sql(dialect: Dialect, table: &str, q: &QueryState) -> Result<String, SiloError> {
    let mut sql = format!("DELETE FROM {table}");
    push_mutation_filter(&mut sql, dialect, table, q)?;
    Ok(sql)
}

/// `UPDATE ... SET` from the state's content. Each assigned value is moved
/// into the params under a fresh `v_<n>` key.
pub(crate) fn update_sql(dialect: Dialect, table: &str, q: &mut QueryState) -> Result<String, SiloError> {
    if q.content.is_empty() {
        return Err(SiloError::ParameterError(format!(
            "update of {table} has no content to assign"
        )));
    }
    let assignments: Vec<String> = bind_content(q)
        .into_iter()
        .map(|(field, token)| format!("{} = {token}", dialect.quote(&field)))
        .collect();
    let mut sql = format!("UPDATE {table} SET {}", comma(assignments));
    push_mutation_filter(&mut sql, dialect, table, q)?;
    Ok(sql)
}

/// `INSERT INTO ...` from the state's content, with a `RETURNING` tail for
/// the given key columns when non-empty.
pub(crate) fn insert_sql(dialect: Dialect, table: &str, q: &mut QueryState, returning: &[&str]) -> String {
    let bound = bind_content(q);
    let mut sql = if bound.is_empty() {
        format!("INSERT INTO {table} {}", dialect.empty_insert_tail())
    } else {
        let (fields, tokens): (Vec<String>, Vec<String>) = bound
            .into_iter()
            .map(|(field, token)| (dialect.quote(&field), token))
            .unzip();
        format!(
            "INSERT INTO {table} {} VALUES {}",
            wrap(&comma(fields)),
            wrap(&comma(tokens))
        )
    };
    if !returning.is_empty() {
        let keys: Vec<String> = returning.iter().map(|key| dialect.quote(key)).collect();
        sql.push_str(" RETURNING ");
        sql.push_str(&comma(keys));
    }
    sql
}

/// Move content values into params; returns `(field, token)` pairs.
fn bind_content(q: &mut QueryState) -> Vec<(String, String)> {
    let content = std::mem::take(&mut q.content);
    let mut n = 0;
    content
        .into_iter()
        .map(|(field, value)| {
            while q.params.contains_key(&format!("v_{n}")) {
                n += 1;
            }
            let key = format!("v_{n}");
            n += 1;
            let token = format!("{PLACEHOLDER_SIGIL}{key}");
            q.params.insert(key, value);
            (field, token)
        })
        .collect()
}

fn push_where(sql: &mut String, q: &QueryState) {
    if let Some(clause) = q.where_clause.as_deref() {
        sql.push_str(" WHERE ");
        sql.push_str(clause);
    }
}

fn push_order(sql: &mut String, q: &QueryState) {
    if let Some(order) = q.order.as_deref() {
        sql.push_str(" ORDER BY ");
        sql.push_str(order);
    }
}

fn push_limit(sql: &mut String, dialect: Dialect, q: &QueryState) {
    if let Some(limit) = dialect.limit_clause(q.limit, q.offset) {
        sql.push(' ');
        sql.push_str(&limit);
    }
}

/// WHERE/ORDER/LIMIT for DELETE and UPDATE. Engines that reject ORDER BY
/// and LIMIT there get the bound applied through a row-identity sub-select.
/// In-place LIMIT takes no offset.
fn push_mutation_filter(
    sql: &mut String,
    dialect: Dialect,
    table: &str,
    q: &QueryState,
) -> Result<(), SiloError> {
    match dialect.row_identity() {
        Some(identity) if q.limit.is_some() => {
            sql.push_str(&format!(
                " WHERE {identity} IN (SELECT {identity} FROM {table}"
            ));
            push_where(sql, q);
            push_order(sql, q);
            push_limit(sql, dialect, q);
            sql.push(')');
        }
        // ORDER BY without a bound changes nothing for a mutation
        Some(_) => push_where(sql, q),
        None => {
            if q.limit.is_some() && q.offset.is_some() {
                return Err(SiloError::ParameterError(format!(
                    "{dialect:?} cannot apply an offset to UPDATE or DELETE on {table}"
                )));
            }
            push_where(sql, q);
            push_order(sql, q);
            push_limit(sql, dialect, q);
        }
    }
    Ok(())
}
