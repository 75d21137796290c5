//! Helpers for tests that need a live database.
//!
//! [`TestDatabase`] opens a fresh in-memory SQLite database, runs the given
//! DDL/fixture script and wires it to a registry, so each test starts from a
//! known state without touching the filesystem.

use crate::data_source::DataSource;
use crate::error::Result;
use crate::model::Entity;
use crate::schema::{EntitySchema, Registry};
use crate::sqlite::SqliteExecutor;

/// In-memory database plus the registry it will be opened with
pub struct TestDatabase {
    executor: SqliteExecutor,
    registry: Registry,
}

impl TestDatabase {
    /// Fresh in-memory database with `script` already applied
    pub fn new(script: &str) -> Result<Self> {
        let executor = SqliteExecutor::in_memory()?;
        executor.execute_batch(script)?;
        Ok(Self {
            executor,
            registry: Registry::new(),
        })
    }

    /// Register a typed entity
    pub fn with_entity<E: Entity>(mut self) -> Result<Self> {
        self.registry.register_entity::<E>()?;
        Ok(self)
    }

    /// Register a schema built by hand
    pub fn with_schema(mut self, schema: EntitySchema) -> Result<Self> {
        self.registry.register(schema)?;
        Ok(self)
    }

    /// Run more SQL before the data source is built
    pub fn seed(self, script: &str) -> Result<Self> {
        self.executor.execute_batch(script)?;
        Ok(self)
    }

    pub fn into_data_source(self) -> DataSource {
        DataSource::new(self.registry, self.executor).with_query_logging(true)
    }
}
