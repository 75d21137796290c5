//! `Executor` Module
//!
//! Provides the `Executor` trait that abstracts statement execution. The query
//! builder, hydrator and repository only ever talk to a store through this
//! trait, so any relational backend (the bundled SQLite executor, a pooled
//! PostgreSQL connection, a scripted mock in tests) can sit underneath.

use sea_query::{
    Alias, Expr, MysqlQueryBuilder, PostgresQueryBuilder, Query, QueryStatementWriter,
    SqliteQueryBuilder, Value,
};

use crate::error::{OrmError, Result};
use crate::value::TryGetable;

/// SQL flavour used when rendering statements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Sqlite,
    Postgres,
    MySql,
}

impl Backend {
    /// Render a statement for this backend, returning SQL and positional values
    pub fn build<S: QueryStatementWriter>(self, statement: &S) -> (String, Vec<Value>) {
        let (sql, values) = match self {
            Backend::Sqlite => statement.build(SqliteQueryBuilder),
            Backend::Postgres => statement.build(PostgresQueryBuilder),
            Backend::MySql => statement.build(MysqlQueryBuilder),
        };
        (sql, values.0)
    }

    /// Marker for the `n`th (1-based) value of a custom SQL fragment
    pub fn placeholder(self, n: usize) -> String {
        match self {
            Backend::Postgres => format!("${n}"),
            Backend::Sqlite | Backend::MySql => "?".to_string(),
        }
    }
}

/// One raw result row: ordered result names with their values
///
/// SQL NULL is stored as `None`; the hydrator turns it into a typed null once
/// it knows which column the value belongs to.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    fields: Vec<(String, Option<Value>)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: Option<Value>) {
        self.fields.push((name.into(), value));
    }

    /// Builder-style [`push`](Self::push)
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: Option<Value>) -> Self {
        self.push(name, value);
        self
    }

    /// Raw field by result name; `Some(None)` is SQL NULL
    pub fn field(&self, name: &str) -> Option<&Option<Value>> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Typed field by result name; `Ok(None)` when missing or NULL
    pub fn try_get<T: TryGetable>(&self, name: &str) -> Result<Option<T>> {
        match self.field(name) {
            Some(Some(value)) => T::try_get(value.clone()).map(Some).map_err(|e| {
                OrmError::TypeMismatch {
                    property: name.to_string(),
                    expected: std::any::type_name::<T>().to_string(),
                    actual: e.to_string(),
                }
            }),
            Some(None) | None => Ok(None),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, Option<Value>)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Option<Value>)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Trait for executing database operations
///
/// Implementations must be shareable across threads; a `DataSource` holds its
/// executor behind an `Arc`.
pub trait Executor: Send + Sync {
    /// SQL flavour the executor speaks
    fn backend(&self) -> Backend;

    /// Execute a query and return all rows
    ///
    /// # Errors
    ///
    /// Returns `OrmError` if the query execution fails.
    fn query_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Execute a statement and return the number of rows affected
    ///
    /// # Errors
    ///
    /// Returns `OrmError` if the statement fails; constraint failures surface as
    /// `OrmError::ConstraintViolation`.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Insert one row and return its primary key values
    ///
    /// The default implementation renders `INSERT ... RETURNING <pk>` for
    /// [`backend`](Self::backend) and runs it through
    /// [`query_all`](Self::query_all).
    fn persist(
        &self,
        table: &str,
        primary_key: &[String],
        values: &[(String, Value)],
    ) -> Result<Vec<Value>> {
        let mut insert = Query::insert();
        insert.into_table(Alias::new(table));

        if values.is_empty() {
            insert.or_default_values();
        } else {
            insert.columns(values.iter().map(|(column, _)| Alias::new(column.as_str())));
            insert
                .values(values.iter().map(|(_, value)| Expr::val(value.clone())))
                .map_err(|e| OrmError::QueryError(e.to_string()))?;
        }
        insert.returning(Query::returning().columns(primary_key.iter().map(|c| Alias::new(c.as_str()))));

        let (sql, params) = self.backend().build(&insert);
        let rows = self.query_all(&sql, &params)?;
        let row = rows.into_iter().next().ok_or_else(|| {
            OrmError::ExecutionError(format!("insert into {table} returned no primary key"))
        })?;

        primary_key
            .iter()
            .map(|column| match row.field(column) {
                Some(Some(value)) => Ok(value.clone()),
                _ => Err(OrmError::ExecutionError(format!(
                    "insert into {table} did not return {column}"
                ))),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_field_lookup() {
        let row = Row::new()
            .with("p_id", Some(Value::BigInt(Some(1))))
            .with("p_category_name", None);

        assert_eq!(row.field("p_id"), Some(&Some(Value::BigInt(Some(1)))));
        assert_eq!(row.field("p_category_name"), Some(&None));
        assert_eq!(row.field("p_title"), None);
        assert_eq!(row.try_get::<i64>("p_id").unwrap(), Some(1));
        assert_eq!(row.try_get::<String>("p_category_name").unwrap(), None);
    }

    #[test]
    fn test_backend_placeholders() {
        let mut select = Query::select();
        select
            .expr(Expr::cust("1"))
            .from(Alias::new("post"))
            .and_where(Expr::cust_with_values(
                format!("id = {}", Backend::Sqlite.placeholder(1)),
                [7],
            ));
        let (sqlite, values) = Backend::Sqlite.build(&select);
        assert!(sqlite.contains("id = ?"), "{sqlite}");
        assert_eq!(values, vec![Value::Int(Some(7))]);

        let mut select = Query::select();
        select
            .expr(Expr::cust("1"))
            .from(Alias::new("post"))
            .and_where(Expr::cust_with_values(
                format!("id = {}", Backend::Postgres.placeholder(1)),
                [7],
            ));
        let (postgres, values) = Backend::Postgres.build(&select);
        assert!(postgres.contains("id = $1"), "{postgres}");
        assert_eq!(values, vec![Value::Int(Some(7))]);
    }
}
