//! Query execution methods for `QueryBuilder`.
//!
//! Raw methods return rows keyed by result name; hydrated methods run the
//! rows through [`hydrate`](crate::hydrate::hydrate) and convert the primary
//! alias into `E`.

use super::builder::QueryBuilder;
use crate::error::{OrmError, Result};
use crate::executor::Row;
use crate::hydrate::{hydrate, Hydrated};
use crate::model::{FromModel, Model};

impl<'a, E: FromModel> QueryBuilder<'a, E> {
    /// Execute the query and return every raw row
    ///
    /// Raw rows carry every selected result name, including names that do not
    /// hydrate into any alias.
    pub fn get_raw_many(&self) -> Result<Vec<Row>> {
        let spec = self.build()?;
        self.data_source.query(spec.sql(), spec.values())
    }

    /// First raw row, with a row limit of 1
    pub fn get_raw_one(&self) -> Result<Option<Row>> {
        let spec = self.build_with_limit(Some(1))?;
        Ok(self
            .data_source
            .query(spec.sql(), spec.values())?
            .into_iter()
            .next())
    }

    /// Execute and hydrate every alias that owns selected columns
    pub fn get_hydrated(&self) -> Result<Vec<Hydrated>> {
        let spec = self.build()?;
        let rows = self.data_source.query(spec.sql(), spec.values())?;
        hydrate(&rows, &spec)
    }

    pub fn get_many_models(&self) -> Result<Vec<Model>> {
        Ok(self.get_hydrated()?.into_iter().map(|h| h.model).collect())
    }

    /// First hydrated primary model, with a row limit of 1
    pub fn get_one_model(&self) -> Result<Option<Model>> {
        let spec = self.build_with_limit(Some(1))?;
        let rows = self.data_source.query(spec.sql(), spec.values())?;
        Ok(hydrate(&rows, &spec)?.into_iter().next().map(|h| h.model))
    }

    /// Execute the query and return all primary entities
    pub fn get_many(&self) -> Result<Vec<E>> {
        self.get_many_models()?
            .into_iter()
            .map(E::try_from_model)
            .collect()
    }

    /// Execute with a row limit of 1 and return the primary entity, if any
    ///
    /// A query that matches nothing yields `Ok(None)`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use driftwood::{params, DataSource, Model, Result};
    /// # fn demo(ds: &DataSource) -> Result<Option<Model>> {
    /// ds.query_builder("Post", "p")?
    ///     .filter("p.id = :id", params! { "id" => 1 })
    ///     .get_one()
    /// # }
    /// ```
    pub fn get_one(&self) -> Result<Option<E>> {
        self.get_one_model()?.map(E::try_from_model).transpose()
    }

    /// Number of distinct primary entities matching the joins and predicate
    pub fn get_count(&self) -> Result<u64> {
        let (sql, values) = self.build_count()?;
        let rows = self.data_source.query(&sql, &values)?;
        let count = rows
            .first()
            .map(|row| row.try_get::<i64>("cnt"))
            .transpose()?
            .flatten()
            .unwrap_or(0);

        u64::try_from(count).map_err(|_| OrmError::QueryError(format!("negative row count {count}")))
    }
}
