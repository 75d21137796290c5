//! `DataSource`: the registry plus an executor.
//!
//! Entry point for everything that touches the store: query builders and
//! repositories borrow the data source, resolve descriptors through its
//! registry and run statements through its executor.

use std::fmt;
use std::sync::Arc;

use sea_query::Value;

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::executor::{Executor, Row};
use crate::model::{Entity, Model};
use crate::query::QueryBuilder;
use crate::repository::Repository;
use crate::schema::Registry;
use crate::sqlite::SqliteExecutor;

#[derive(Clone)]
pub struct DataSource {
    registry: Arc<Registry>,
    executor: Arc<dyn Executor>,
    log_queries: bool,
    default_limit: Option<u64>,
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSource")
            .field("entities", &self.registry.len())
            .field("backend", &self.executor.backend())
            .field("log_queries", &self.log_queries)
            .field("default_limit", &self.default_limit)
            .finish()
    }
}

impl DataSource {
    /// Wrap a populated registry and an executor
    pub fn new(registry: Registry, executor: impl Executor + 'static) -> Self {
        Self {
            registry: Arc::new(registry),
            executor: Arc::new(executor),
            log_queries: false,
            default_limit: None,
        }
    }

    /// Open the SQLite database named by `config.url`
    pub fn connect(config: &DatabaseConfig, registry: Registry) -> Result<Self> {
        let executor = SqliteExecutor::from_url(&config.url)?;
        log::info!(
            "Connected to {} with {} registered entities",
            config.url,
            registry.len()
        );

        Ok(Self {
            log_queries: config.log_queries,
            default_limit: config.default_limit,
            ..Self::new(registry, executor)
        })
    }

    /// Log every statement at `info` instead of `debug`
    #[must_use]
    pub fn with_query_logging(mut self, enabled: bool) -> Self {
        self.log_queries = enabled;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn executor(&self) -> &dyn Executor {
        self.executor.as_ref()
    }

    /// Row cap applied by `find` when the criteria set no `take`
    pub fn default_limit(&self) -> Option<u64> {
        self.default_limit
    }

    /// Start a query on a typed entity under `alias`
    pub fn create_query_builder<E: Entity>(&self, alias: &str) -> Result<QueryBuilder<'_, E>> {
        let descriptor = self.registry.resolve(E::NAME)?;
        Ok(QueryBuilder::new(self, descriptor, alias))
    }

    /// Start a query on an entity by name, hydrating into [`Model`]s
    pub fn query_builder(&self, entity: &str, alias: &str) -> Result<QueryBuilder<'_, Model>> {
        let descriptor = self.registry.resolve(entity)?;
        Ok(QueryBuilder::new(self, descriptor, alias))
    }

    pub fn repository<E: Entity>(&self) -> Result<Repository<'_, E>> {
        let descriptor = self.registry.resolve(E::NAME)?;
        Ok(Repository::new(self, descriptor))
    }

    /// Repository over an entity by name, reading and writing [`Model`]s
    pub fn repository_for(&self, entity: &str) -> Result<Repository<'_, Model>> {
        let descriptor = self.registry.resolve(entity)?;
        Ok(Repository::new(self, descriptor))
    }

    pub(crate) fn query(&self, sql: &str, values: &[Value]) -> Result<Vec<Row>> {
        self.log_statement(sql, values);
        self.executor.query_all(sql, values)
    }

    pub(crate) fn execute(&self, sql: &str, values: &[Value]) -> Result<u64> {
        self.log_statement(sql, values);
        self.executor.execute(sql, values)
    }

    fn log_statement(&self, sql: &str, values: &[Value]) {
        if self.log_queries {
            log::info!("{sql} -- {} parameter(s)", values.len());
        } else {
            log::debug!("{sql} -- {} parameter(s)", values.len());
        }
    }
}
