//! Error type shared by the registry, query builder, hydrator and executors.
//!
//! `OrmError` follows the same shape as the rest of the crate's errors: a plain
//! enum with a hand-written `Display`, so callers can match on the variant they
//! care about (`UnboundParameter`, `ConstraintViolation`, ...) and forward the
//! rest with `?`.

use std::fmt;

/// Convenience alias used throughout the crate
pub type Result<T, E = OrmError> = std::result::Result<T, E>;

/// Error type for every driftwood operation
#[derive(Debug, Clone, PartialEq)]
pub enum OrmError {
    /// No descriptor registered under this entity name
    UnknownEntity(String),
    /// A select, join or order clause referenced an alias the query does not define
    UnknownAlias(String),
    /// The entity bound to an alias has no such property
    UnknownProperty {
        entity: String,
        property: String,
    },
    /// Two sources in the same query were given the same alias
    DuplicateAlias(String),
    /// An entity schema could not be turned into a descriptor
    InvalidSchema(String),
    /// A `:name` placeholder has no bound value
    UnboundParameter(String),
    /// The store rejected a write (NOT NULL, UNIQUE, ...)
    ConstraintViolation(String),
    /// A value could not be converted to the requested type
    TypeMismatch {
        property: String,
        expected: String,
        actual: String,
    },
    /// A non-null value was required but the column was null
    NullValue(String),
    /// The query could not be built
    QueryError(String),
    /// The executor failed while running a statement
    ExecutionError(String),
    /// Configuration could not be loaded
    Config(String),
}

impl fmt::Display for OrmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrmError::UnknownEntity(name) => write!(f, "Unknown entity: {name}"),
            OrmError::UnknownAlias(alias) => write!(f, "Unknown alias: {alias}"),
            OrmError::UnknownProperty { entity, property } => {
                write!(f, "Entity {entity} has no property {property}")
            }
            OrmError::DuplicateAlias(alias) => write!(f, "Alias already in use: {alias}"),
            OrmError::InvalidSchema(msg) => write!(f, "Invalid entity schema: {msg}"),
            OrmError::UnboundParameter(name) => {
                write!(f, "No value bound for parameter :{name}")
            }
            OrmError::ConstraintViolation(msg) => write!(f, "Constraint violation: {msg}"),
            OrmError::TypeMismatch {
                property,
                expected,
                actual,
            } => write!(
                f,
                "Type mismatch for {property}: expected {expected}, got {actual}"
            ),
            OrmError::NullValue(property) => write!(f, "Value of {property} is null"),
            OrmError::QueryError(msg) => write!(f, "Query error: {msg}"),
            OrmError::ExecutionError(msg) => write!(f, "Execution error: {msg}"),
            OrmError::Config(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for OrmError {}

impl From<rusqlite::Error> for OrmError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::ConstraintViolation) => {
                OrmError::ConstraintViolation(err.to_string())
            }
            _ => OrmError::ExecutionError(err.to_string()),
        }
    }
}

impl From<config::ConfigError> for OrmError {
    fn from(err: config::ConfigError) -> Self {
        OrmError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for OrmError {
    fn from(err: serde_json::Error) -> Self {
        OrmError::TypeMismatch {
            property: String::new(),
            expected: "json".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orm_error_display() {
        let err = OrmError::UnboundParameter("id".to_string());
        assert_eq!(err.to_string(), "No value bound for parameter :id");

        let err = OrmError::UnknownProperty {
            entity: "Post".to_string(),
            property: "body".to_string(),
        };
        assert!(err.to_string().contains("Post"));
        assert!(err.to_string().contains("body"));
    }

    #[test]
    fn test_constraint_violation_from_sqlite() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT NOT NULL)")
            .unwrap();
        let err = conn
            .execute("INSERT INTO t (id) VALUES (1)", [])
            .unwrap_err();

        assert!(matches!(
            OrmError::from(err),
            OrmError::ConstraintViolation(_)
        ));
    }

    #[test]
    fn test_other_sqlite_errors_are_execution_errors() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err = conn.execute("SELECT * FROM missing", []).unwrap_err();

        assert!(matches!(OrmError::from(err), OrmError::ExecutionError(_)));
    }
}
