//! SQLite executor backed by `rusqlite`.
//!
//! One connection guarded by a mutex: statements from concurrent callers are
//! serialized. Open it in memory for tests or against a file for anything
//! persistent.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
#[cfg(feature = "metrics")]
use std::time::Instant;

use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::Connection;
use sea_query::Value;

use crate::error::{OrmError, Result};
use crate::executor::{Backend, Executor, Row};
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

#[derive(Debug)]
pub struct SqliteExecutor {
    connection: Mutex<Connection>,
}

impl SqliteExecutor {
    /// Create an in-memory SQLite database
    pub fn in_memory() -> Result<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    /// Open a SQLite database at the specified file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_connection(Connection::open(path)?))
    }

    /// Open from a connection URL
    ///
    /// Accepts `sqlite::memory:`, `sqlite://<path>` and `sqlite:<path>`.
    pub fn from_url(url: &str) -> Result<Self> {
        let rest = url.strip_prefix("sqlite:").ok_or_else(|| {
            OrmError::Config(format!(
                "connection URL does not have a `sqlite` scheme; url={url}"
            ))
        })?;
        let path = rest.strip_prefix("//").unwrap_or(rest);

        match path {
            ":memory:" => Self::in_memory(),
            "" => Err(OrmError::Config(format!("connection URL has no path; url={url}"))),
            path => Self::open(path),
        }
    }

    pub fn from_connection(connection: Connection) -> Self {
        Self {
            connection: Mutex::new(connection),
        }
    }

    /// Run a batch of semicolon separated statements, typically DDL
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.lock()?.execute_batch(sql)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| OrmError::ExecutionError("sqlite connection mutex poisoned".to_string()))
    }

    fn run_query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let connection = self.lock()?;
        let mut stmt = connection.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(rusqlite::params_from_iter(params.iter().map(SqlParam)))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (index, name) in names.iter().enumerate() {
                record.push(name.clone(), from_sql(row.get_ref(index)?));
            }
            out.push(record);
        }
        Ok(out)
    }

    fn run_execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let connection = self.lock()?;
        let affected =
            connection.execute(sql, rusqlite::params_from_iter(params.iter().map(SqlParam)))?;
        Ok(affected as u64)
    }

    fn instrument<T>(&self, sql: &str, run: impl FnOnce() -> Result<T>) -> Result<T> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_query_span(sql).entered();
        #[cfg(not(feature = "tracing"))]
        let _ = sql;

        #[cfg(feature = "metrics")]
        let start = Instant::now();

        let result = run();

        #[cfg(feature = "metrics")]
        {
            METRICS.record_query_duration(start.elapsed());
            if result.is_err() {
                METRICS.record_query_error();
            }
        }

        result
    }
}

impl Executor for SqliteExecutor {
    fn backend(&self) -> Backend {
        Backend::Sqlite
    }

    fn query_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.instrument(sql, || self.run_query(sql, params))
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        self.instrument(sql, || self.run_execute(sql, params))
    }
}

/// Borrowed parameter adapter for rusqlite
struct SqlParam<'a>(&'a Value);

impl ToSql for SqlParam<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let owned = |v: SqlValue| Ok(ToSqlOutput::Owned(v));
        let int = |v: Option<i64>| owned(v.map_or(SqlValue::Null, SqlValue::Integer));

        match self.0 {
            Value::Bool(v) => int(v.map(i64::from)),
            Value::TinyInt(v) => int(v.map(i64::from)),
            Value::SmallInt(v) => int(v.map(i64::from)),
            Value::Int(v) => int(v.map(i64::from)),
            Value::BigInt(v) => int(*v),
            Value::TinyUnsigned(v) => int(v.map(i64::from)),
            Value::SmallUnsigned(v) => int(v.map(i64::from)),
            Value::Unsigned(v) => int(v.map(i64::from)),
            Value::BigUnsigned(Some(v)) => i64::try_from(*v)
                .map(|v| ToSqlOutput::Owned(SqlValue::Integer(v)))
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e))),
            Value::BigUnsigned(None) => owned(SqlValue::Null),
            Value::Float(v) => owned(v.map_or(SqlValue::Null, |f| SqlValue::Real(f64::from(f)))),
            Value::Double(v) => owned(v.map_or(SqlValue::Null, SqlValue::Real)),
            Value::String(Some(s)) => Ok(ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes()))),
            Value::Char(Some(c)) => owned(SqlValue::Text(c.to_string())),
            Value::Bytes(Some(b)) => Ok(ToSqlOutput::Borrowed(ValueRef::Blob(&b[..]))),
            Value::Json(Some(j)) => owned(SqlValue::Text(j.to_string())),
            Value::String(None) | Value::Char(None) | Value::Bytes(None) | Value::Json(None) => {
                owned(SqlValue::Null)
            }
            #[allow(unreachable_patterns)]
            other => Err(rusqlite::Error::ToSqlConversionFailure(
                format!("unsupported parameter value {other:?}").into(),
            )),
        }
    }
}

/// SQLite value to a loosely typed sea-query value; NULL becomes `None`
fn from_sql(value: ValueRef<'_>) -> Option<Value> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(Value::BigInt(Some(i))),
        ValueRef::Real(f) => Some(Value::Double(Some(f))),
        ValueRef::Text(t) => Some(Value::String(Some(String::from_utf8_lossy(t).into_owned()))),
        ValueRef::Blob(b) => Some(Value::Bytes(Some(b.to_vec()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url_variants() {
        assert!(SqliteExecutor::from_url("sqlite::memory:").is_ok());
        assert!(SqliteExecutor::from_url("sqlite://:memory:").is_ok());
        assert!(matches!(
            SqliteExecutor::from_url("postgres://localhost/db"),
            Err(OrmError::Config(_))
        ));
    }

    #[test]
    fn test_query_round_trip_and_nulls() {
        let executor = SqliteExecutor::in_memory().unwrap();
        executor
            .execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, score REAL)")
            .unwrap();

        let inserted = executor
            .execute(
                "INSERT INTO t (id, name, score) VALUES (?, ?, ?)",
                &[Value::Int(Some(1)), Value::String(None), Value::Double(Some(1.5))],
            )
            .unwrap();
        assert_eq!(inserted, 1);

        let rows = executor.query_all("SELECT id, name, score FROM t", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].field("id"), Some(&Some(Value::BigInt(Some(1)))));
        assert_eq!(rows[0].field("name"), Some(&None));
        assert_eq!(rows[0].try_get::<f64>("score").unwrap(), Some(1.5));
    }

    #[test]
    fn test_constraint_violation_is_mapped() {
        let executor = SqliteExecutor::in_memory().unwrap();
        executor
            .execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT NOT NULL)")
            .unwrap();

        let err = executor
            .execute("INSERT INTO t (id) VALUES (?)", &[Value::BigInt(Some(1))])
            .unwrap_err();
        assert!(matches!(err, OrmError::ConstraintViolation(_)));
    }

    #[test]
    fn test_persist_returns_generated_key() {
        let executor = SqliteExecutor::in_memory().unwrap();
        executor
            .execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT)")
            .unwrap();

        let pk = executor
            .persist(
                "t",
                &["id".to_string()],
                &[("name".to_string(), Value::String(Some("a".into())))],
            )
            .unwrap();
        assert_eq!(pk, vec![Value::BigInt(Some(1))]);
    }
}
