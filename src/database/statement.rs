//! Single-row SQL statements used by the mapper
//!
//! Only the three statements a record needs are rendered here: load one row,
//! insert one row, update one row. NULL values appear as literals in WHERE
//! clauses (`IS NULL`) and are bound as parameters everywhere else.

use crate::database::{DatabaseBackend, Filter, Row, SqlValue};

impl DatabaseBackend {
    /// Quote an identifier (table name, column name) for this database
    pub fn quote_identifier(&self, identifier: &str) -> String {
        match self {
            DatabaseBackend::MySQL => format!("`{}`", identifier.replace('`', "``")),
            DatabaseBackend::SQLite | DatabaseBackend::Memory => {
                format!("\"{}\"", identifier.replace('"', "\"\""))
            }
        }
    }

    /// Generate a parameter placeholder
    pub fn placeholder(&self) -> &'static str {
        "?"
    }
}

fn where_clause(
    backend: DatabaseBackend,
    filter: &Filter,
    params: &mut Vec<SqlValue>,
) -> Option<String> {
    if filter.is_empty() {
        return None;
    }
    let parts: Vec<String> = filter
        .conditions()
        .iter()
        .map(|condition| {
            let column = backend.quote_identifier(&condition.column);
            if condition.value.is_null() {
                format!("{} IS NULL", column)
            } else {
                params.push(condition.value.clone());
                format!("{} = {}", column, backend.placeholder())
            }
        })
        .collect();
    Some(parts.join(" AND "))
}

/// `SELECT * FROM table WHERE ... LIMIT 1`
pub fn select_one(backend: DatabaseBackend, table: &str, filter: &Filter) -> (String, Vec<SqlValue>) {
    let mut params = Vec::new();
    let mut sql = format!("SELECT * FROM {}", backend.quote_identifier(table));
    if let Some(clause) = where_clause(backend, filter, &mut params) {
        sql.push_str(" WHERE ");
        sql.push_str(&clause);
    }
    sql.push_str(" LIMIT 1");
    (sql, params)
}

/// `INSERT INTO table (...) VALUES (...)`
pub fn insert(backend: DatabaseBackend, table: &str, values: &Row) -> (String, Vec<SqlValue>) {
    let table = backend.quote_identifier(table);
    if values.is_empty() {
        let sql = match backend {
            DatabaseBackend::MySQL => format!("INSERT INTO {} () VALUES ()", table),
            _ => format!("INSERT INTO {} DEFAULT VALUES", table),
        };
        return (sql, Vec::new());
    }

    let columns: Vec<String> = values
        .keys()
        .map(|column| backend.quote_identifier(column))
        .collect();
    let placeholders = vec![backend.placeholder(); values.len()];
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders.join(", ")
    );
    (sql, values.values().cloned().collect())
}

/// `UPDATE table SET ... WHERE ...`
pub fn update(
    backend: DatabaseBackend,
    table: &str,
    values: &Row,
    filter: &Filter,
) -> (String, Vec<SqlValue>) {
    let mut params: Vec<SqlValue> = Vec::with_capacity(values.len() + filter.len());
    let assignments: Vec<String> = values
        .iter()
        .map(|(column, value)| {
            params.push(value.clone());
            format!(
                "{} = {}",
                backend.quote_identifier(column),
                backend.placeholder()
            )
        })
        .collect();

    let mut sql = format!(
        "UPDATE {} SET {}",
        backend.quote_identifier(table),
        assignments.join(", ")
    );
    if let Some(clause) = where_clause(backend, filter, &mut params) {
        sql.push_str(" WHERE ");
        sql.push_str(&clause);
    }
    (sql, params)
}
