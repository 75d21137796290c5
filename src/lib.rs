//! # Driftwood
//!
//! Partial-selection query builder and hydrating repository on top of
//! `sea-query` and a pluggable relational executor.
//!
//! Entities are declared once at startup (`EntitySchema` builders or the
//! [`entity!`] macro) and registered in a [`Registry`]. A [`DataSource`]
//! pairs the registry with an [`Executor`] and hands out query builders and
//! repositories. Hydrated records only carry the properties a query actually
//! selected: a property that was not selected is absent, a selected property
//! that came back NULL is present and null.
//!
//! ```no_run
//! use driftwood::{entity, params, DataSource, DatabaseConfig, Registry, Result};
//!
//! entity! {
//!     #[derive(Debug, Default)]
//!     pub struct Post in "post" {
//!         id: i64 { generated() },
//!         title: String,
//!         category_id: i64 { nullable() },
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let mut registry = Registry::new();
//! registry.register_entity::<Post>()?;
//!
//! let config = DatabaseConfig::load()?;
//! let ds = DataSource::connect(&config, registry)?;
//!
//! let post = ds
//!     .create_query_builder::<Post>("p")?
//!     .select("p.id")
//!     .filter("p.id = :id", params! { "id" => 1 })
//!     .get_one()?;
//! if let Some(post) = post {
//!     assert!(post.title.is_unset());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data_source;
pub mod error;
pub mod executor;
pub mod hydrate;
mod macros;
pub mod metrics;
pub mod model;
pub mod query;
pub mod repository;
pub mod schema;
pub mod sqlite;
pub mod test_helpers;
pub mod value;

pub use config::DatabaseConfig;
pub use data_source::DataSource;
pub use error::{OrmError, Result};
pub use executor::{Backend, Executor, Row};
pub use hydrate::Hydrated;
pub use model::{Entity, FromModel, Model};
pub use query::{JoinKind, Order, Params, QueryBuilder, QuerySpec};
pub use repository::{FindOptions, Repository};
pub use schema::{ColumnDef, ColumnType, EntityDescriptor, EntitySchema, Registry};
pub use sqlite::SqliteExecutor;
pub use value::{Attr, FieldType, TryGetable, ValueExtractionError};

pub use sea_query::Value;
