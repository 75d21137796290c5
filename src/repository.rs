//! Repository: typed CRUD over one entity.
//!
//! Reads go through the query builder and hydrator, writes through the
//! executor's `execute` / `persist`. Every query the repository builds uses
//! the entity's table name as its alias.

use std::marker::PhantomData;
use std::sync::Arc;

use sea_query::{Alias, Expr, ExprTrait, Order, Query, Value};

use crate::data_source::DataSource;
use crate::error::{OrmError, Result};
use crate::model::{Entity, FromModel, Model};
use crate::query::{Params, QueryBuilder};
use crate::schema::{ColumnDef, EntityDescriptor};
use crate::value::is_null;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// Criteria for [`Repository::find`]
///
/// ```
/// use driftwood::{FindOptions, Order};
///
/// let options = FindOptions::new()
///     .where_eq("category_id", 1)
///     .select(["id", "title"])
///     .order_by("id", Order::Desc)
///     .take(10);
/// assert_eq!(options.take, Some(10));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// `property = value` conditions, all of which must hold
    pub where_eq: Vec<(String, Value)>,
    /// Properties to populate; `None` means the default selection
    pub select: Option<Vec<String>>,
    pub order: Vec<(String, Order)>,
    pub take: Option<u64>,
    pub skip: Option<u64>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn where_eq(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_eq.push((property.into(), value.into()));
        self
    }

    #[must_use]
    pub fn select<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = Some(properties.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn order_by(mut self, property: impl Into<String>, order: Order) -> Self {
        self.order.push((property.into(), order));
        self
    }

    #[must_use]
    pub fn take(mut self, take: u64) -> Self {
        self.take = Some(take);
        self
    }

    #[must_use]
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }
}

/// Repository for one registered entity
pub struct Repository<'a, E> {
    data_source: &'a DataSource,
    descriptor: Arc<EntityDescriptor>,
    _entity: PhantomData<fn() -> E>,
}

impl<'a, E> Repository<'a, E> {
    pub(crate) fn new(data_source: &'a DataSource, descriptor: Arc<EntityDescriptor>) -> Self {
        Self {
            data_source,
            descriptor,
            _entity: PhantomData,
        }
    }

    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    /// Query builder on this entity, aliased by its table name
    pub fn create_query_builder(&self) -> QueryBuilder<'a, E> {
        QueryBuilder::new(
            self.data_source,
            Arc::clone(&self.descriptor),
            self.descriptor.table(),
        )
    }

    /// Insert or update a model, returning its primary key values
    ///
    /// When every primary key property is set and a row with that key exists,
    /// the remaining properties are written with an UPDATE. Otherwise the
    /// model is inserted; a generated key left unset (or null) is filled in by
    /// the store. Extensions write through their own column mapping.
    ///
    /// # Errors
    ///
    /// - `UnknownProperty` for properties the entity does not declare
    /// - `ConstraintViolation` when a required column is null, missing from an
    ///   insert, or the store rejects the row
    pub fn save_model(&self, model: &Model) -> Result<Vec<Value>> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::save_entity_span(self.descriptor.name()).entered();

        let mut columns: Vec<(String, &str, Value)> = Vec::with_capacity(model.len());
        for (property, value) in model.iter() {
            let column = self.descriptor.require_column(property)?;
            columns.push((column.column.clone(), property, value.clone()));
        }
        if let Some(column) = self
            .descriptor
            .required_columns()
            .find(|c| model.get(&c.property).is_some_and(is_null))
        {
            return Err(self.not_null_violation(column));
        }

        if let Some(pk) = model.primary_key(&self.descriptor) {
            if self.exists(&pk)? {
                self.update(&pk, &columns)?;
                log::debug!("Updated {} {:?}", self.descriptor.name(), pk);
                return Ok(pk);
            }
        }

        if let Some(column) = self
            .descriptor
            .required_columns()
            .find(|c| !model.contains(&c.property))
        {
            return Err(self.not_null_violation(column));
        }

        let values: Vec<(String, Value)> = columns
            .into_iter()
            .filter(|(_, property, value)| {
                let generated = self
                    .descriptor
                    .column(property)
                    .is_some_and(|c| c.generated);
                !(generated && is_null(value))
            })
            .map(|(column, _, value)| (column, value))
            .collect();

        let pk = self
            .data_source
            .executor()
            .persist(self.descriptor.table(), &self.primary_key_columns()?, &values)?;
        log::debug!("Inserted {} {:?}", self.descriptor.name(), pk);
        Ok(pk)
    }

    /// Delete by a single-column primary key, returning the rows removed
    pub fn delete_by_id(&self, id: impl Into<Value>) -> Result<u64> {
        let key = self.single_key()?;

        let mut delete = Query::delete();
        delete
            .from_table(Alias::new(self.descriptor.table()))
            .and_where(Expr::col(Alias::new(key.column.as_str())).eq(id.into()));

        let (sql, values) = self.data_source.executor().backend().build(&delete);
        self.data_source.execute(&sql, &values)
    }

    fn not_null_violation(&self, column: &ColumnDef) -> OrmError {
        OrmError::ConstraintViolation(format!(
            "NOT NULL constraint failed: {}.{} ({}.{})",
            self.descriptor.table(),
            column.column,
            self.descriptor.name(),
            column.property
        ))
    }

    fn primary_key_columns(&self) -> Result<Vec<String>> {
        self.descriptor
            .primary_key()
            .iter()
            .map(|pk| Ok(self.descriptor.require_column(pk)?.column.clone()))
            .collect()
    }

    fn single_key(&self) -> Result<&ColumnDef> {
        match self.descriptor.primary_key() {
            [property] => self.descriptor.require_column(property),
            _ => Err(OrmError::QueryError(format!(
                "{} has a composite primary key; look it up with where_eq",
                self.descriptor.name()
            ))),
        }
    }

    fn key_condition(&self, pk: &[Value]) -> Result<Vec<(String, Value)>> {
        Ok(self
            .primary_key_columns()?
            .into_iter()
            .zip(pk.iter().cloned())
            .collect())
    }

    fn exists(&self, pk: &[Value]) -> Result<bool> {
        let mut select = Query::select();
        select
            .expr(Expr::cust("1"))
            .from(Alias::new(self.descriptor.table()))
            .limit(1);
        for (column, value) in self.key_condition(pk)? {
            select.and_where(Expr::col(Alias::new(column.as_str())).eq(value));
        }

        let (sql, values) = self.data_source.executor().backend().build(&select);
        Ok(!self.data_source.query(&sql, &values)?.is_empty())
    }

    fn update(&self, pk: &[Value], columns: &[(String, &str, Value)]) -> Result<()> {
        let key = self.descriptor.primary_key();
        let mut update = Query::update();
        update.table(Alias::new(self.descriptor.table()));

        let mut assignments = 0;
        for (column, property, value) in columns {
            if key.iter().any(|k| k.as_str() == *property) {
                continue;
            }
            update.value(Alias::new(column.as_str()), value.clone());
            assignments += 1;
        }
        if assignments == 0 {
            return Ok(());
        }
        for (column, value) in self.key_condition(pk)? {
            update.and_where(Expr::col(Alias::new(column.as_str())).eq(value));
        }

        let (sql, values) = self.data_source.executor().backend().build(&update);
        self.data_source.execute(&sql, &values)?;
        Ok(())
    }

    fn query(&self, options: &FindOptions, limit: Option<u64>) -> Result<QueryBuilder<'a, E>> {
        let alias = self.descriptor.table();
        let mut qb = self.create_query_builder();

        if let Some((first, rest)) = options.select.as_deref().and_then(<[String]>::split_first) {
            qb = qb.select(&format!("{alias}.{first}"));
            for property in rest {
                qb = qb.add_select(&format!("{alias}.{property}"));
            }
        }

        for (index, (property, value)) in options.where_eq.iter().enumerate() {
            let column = &self.descriptor.require_column(property)?.column;
            qb = if is_null(value) {
                qb.and_filter(&format!("{alias}.{column} IS NULL"), Params::new())
            } else {
                let name = format!("w{index}");
                qb.and_filter(
                    &format!("{alias}.{column} = :{name}"),
                    Params::new().bind(name, value.clone()),
                )
            };
        }

        for (property, order) in &options.order {
            qb = qb.add_order_by(&format!("{alias}.{property}"), order.clone());
        }
        if let Some(limit) = limit {
            qb = qb.limit(limit);
        }
        if let Some(skip) = options.skip {
            qb = qb.offset(skip);
        }
        Ok(qb)
    }
}

impl<'a, E: FromModel> Repository<'a, E> {
    /// Every entity matching `options`
    ///
    /// Without `take`, the data source's `default_limit` (if any) caps the
    /// result.
    pub fn find(&self, options: &FindOptions) -> Result<Vec<E>> {
        let limit = options.take.or(self.data_source.default_limit());
        self.query(options, limit)?.get_many()
    }

    /// First entity matching `options`, or `None`
    pub fn get_one(&self, options: &FindOptions) -> Result<Option<E>> {
        self.query(options, None)?.get_one()
    }

    /// First entity whose `property` equals `value`
    pub fn find_one_by(&self, property: &str, value: impl Into<Value>) -> Result<Option<E>> {
        self.get_one(&FindOptions::new().where_eq(property, value))
    }

    /// Entity by single-column primary key
    pub fn find_by_id(&self, id: impl Into<Value>) -> Result<Option<E>> {
        let property = self.single_key()?.property.clone();
        self.find_one_by(&property, id)
    }

    /// Number of entities matching the `where_eq` conditions
    pub fn count(&self, options: &FindOptions) -> Result<u64> {
        self.query(options, None)?.get_count()
    }
}

impl<'a, E: Entity> Repository<'a, E> {
    /// Save a typed entity; see [`save_model`](Self::save_model)
    ///
    /// Only fields that are not `Attr::Unset` are written, so a partially
    /// populated entity updates just the properties it carries.
    pub fn save(&self, entity: E) -> Result<Vec<Value>> {
        self.save_model(&entity.into_model())
    }
}
