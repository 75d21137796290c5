//! Select query builder.
//!
//! `QueryBuilder` accumulates the primary alias, joins, the select list,
//! predicates and ordering. Nothing is validated until [`build`](QueryBuilder::build)
//! (or an execution method) runs, at which point aliases, properties and
//! parameters are resolved and a [`QuerySpec`] is produced.
//!
//! Selection follows two rules:
//!
//! - the builder starts out selecting the whole primary alias, i.e. every
//!   selectable-by-default column of the primary entity;
//! - [`select`](QueryBuilder::select) replaces the selection,
//!   [`add_select`](QueryBuilder::add_select) appends to it.

use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use sea_query::{Alias, Expr, Order, Query, SelectStatement, Value};

use super::params::Params;
use super::predicate::Predicate;
use super::spec::{BindingOwner, JoinKind, JoinSpec, JoinTarget, QuerySpec, SelectBinding, SelectSource};
use crate::data_source::DataSource;
use crate::error::{OrmError, Result};
use crate::model::Entity;
use crate::schema::EntityDescriptor;

#[derive(Debug, Clone)]
enum PendingTarget {
    Entity(String),
    Table(String),
}

#[derive(Debug, Clone)]
struct PendingJoin {
    kind: JoinKind,
    target: PendingTarget,
    alias: String,
    on: String,
}

#[derive(Debug, Clone)]
enum SelectRequest {
    Path {
        path: String,
        result_name: Option<String>,
    },
    Expr {
        expr: String,
        result_name: String,
    },
}

/// Query builder for selecting records
///
/// Returned by [`DataSource::create_query_builder`] and
/// [`DataSource::query_builder`]. `E` is the type the primary alias hydrates
/// into: a typed [`Entity`] or [`Model`](crate::Model).
///
/// # Example
///
/// ```no_run
/// # use driftwood::{entity, params, DataSource, Result};
/// # entity! { pub struct PostEx in "post" { id: i64 { primary_key() }, category_name: String { select(false) } } }
/// # fn demo(ds: &DataSource) -> Result<()> {
/// let post = ds
///     .create_query_builder::<PostEx>("p")?
///     .left_join_table("category", "c", "p.category_id = c.id")
///     .select("p.id")
///     .add_select_as("c.name", "p_category_name")
///     .and_filter("p.id = :id", params! { "id" => 1 })
///     .get_one()?;
/// # Ok(())
/// # }
/// ```
pub struct QueryBuilder<'a, E> {
    pub(crate) data_source: &'a DataSource,
    entity: Arc<EntityDescriptor>,
    alias: String,
    joins: Vec<PendingJoin>,
    selects: Vec<SelectRequest>,
    predicate: Option<Predicate>,
    params: Params,
    order: Vec<(String, Order)>,
    limit: Option<u64>,
    offset: Option<u64>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> fmt::Debug for QueryBuilder<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("entity", &self.entity.name())
            .field("alias", &self.alias)
            .field("joins", &self.joins)
            .field("selects", &self.selects)
            .field("predicate", &self.predicate)
            .field("params", &self.params)
            .field("order", &self.order)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .finish()
    }
}

impl<'a, E> QueryBuilder<'a, E> {
    pub(crate) fn new(
        data_source: &'a DataSource,
        entity: Arc<EntityDescriptor>,
        alias: &str,
    ) -> Self {
        Self {
            data_source,
            entity,
            alias: alias.to_string(),
            joins: Vec::new(),
            selects: vec![SelectRequest::Path {
                path: alias.to_string(),
                result_name: None,
            }],
            predicate: None,
            params: Params::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
            _entity: PhantomData,
        }
    }

    /// Join a registered entity by name
    #[must_use]
    pub fn join(mut self, kind: JoinKind, entity: &str, alias: &str, on: &str) -> Self {
        self.joins.push(PendingJoin {
            kind,
            target: PendingTarget::Entity(entity.to_string()),
            alias: alias.to_string(),
            on: on.to_string(),
        });
        self
    }

    /// Join a raw table that has no descriptor
    #[must_use]
    pub fn join_table(mut self, kind: JoinKind, table: &str, alias: &str, on: &str) -> Self {
        self.joins.push(PendingJoin {
            kind,
            target: PendingTarget::Table(table.to_string()),
            alias: alias.to_string(),
            on: on.to_string(),
        });
        self
    }

    #[must_use]
    pub fn inner_join<T: Entity>(self, alias: &str, on: &str) -> Self {
        self.join(JoinKind::Inner, T::NAME, alias, on)
    }

    #[must_use]
    pub fn left_join<T: Entity>(self, alias: &str, on: &str) -> Self {
        self.join(JoinKind::Left, T::NAME, alias, on)
    }

    #[must_use]
    pub fn inner_join_table(self, table: &str, alias: &str, on: &str) -> Self {
        self.join_table(JoinKind::Inner, table, alias, on)
    }

    #[must_use]
    pub fn left_join_table(self, table: &str, alias: &str, on: &str) -> Self {
        self.join_table(JoinKind::Left, table, alias, on)
    }

    /// Replace the selection with `alias.property` (or a bare alias)
    #[must_use]
    pub fn select(mut self, path: &str) -> Self {
        self.selects.clear();
        self.add_select(path)
    }

    /// Replace the selection with `alias.property` under `result_name`
    #[must_use]
    pub fn select_as(mut self, path: &str, result_name: &str) -> Self {
        self.selects.clear();
        self.add_select_as(path, result_name)
    }

    /// Append `alias.property` (or a bare alias) to the selection
    #[must_use]
    pub fn add_select(mut self, path: &str) -> Self {
        self.selects.push(SelectRequest::Path {
            path: path.to_string(),
            result_name: None,
        });
        self
    }

    /// Append `alias.property` under `result_name`
    ///
    /// A result name of the form `<alias>_<property>` (or `<alias>_<column>`)
    /// hydrates into that alias, which is how computed or joined columns land
    /// on an extension entity.
    #[must_use]
    pub fn add_select_as(mut self, path: &str, result_name: &str) -> Self {
        self.selects.push(SelectRequest::Path {
            path: path.to_string(),
            result_name: Some(result_name.to_string()),
        });
        self
    }

    /// Append a raw SQL expression under `result_name`
    #[must_use]
    pub fn add_select_expr(mut self, expr: &str, result_name: &str) -> Self {
        self.selects.push(SelectRequest::Expr {
            expr: expr.to_string(),
            result_name: result_name.to_string(),
        });
        self
    }

    /// Replace the predicate
    #[must_use]
    pub fn filter(mut self, predicate: &str, params: Params) -> Self {
        self.predicate = Some(Predicate::raw(predicate));
        self.params.extend(params);
        self
    }

    /// Conjoin with the current predicate
    #[must_use]
    pub fn and_filter(mut self, predicate: &str, params: Params) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(current) => current.and(Predicate::raw(predicate)),
            None => Predicate::raw(predicate),
        });
        self.params.extend(params);
        self
    }

    /// Disjoin with the current predicate
    #[must_use]
    pub fn or_filter(mut self, predicate: &str, params: Params) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(current) => current.or(Predicate::raw(predicate)),
            None => Predicate::raw(predicate),
        });
        self.params.extend(params);
        self
    }

    /// Bind a parameter used by a predicate or join condition
    #[must_use]
    pub fn set_parameter(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name, value);
        self
    }

    #[must_use]
    pub fn set_parameters(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }

    /// Replace the ordering with `alias.property` (or a result name)
    #[must_use]
    pub fn order_by(mut self, path: &str, order: Order) -> Self {
        self.order.clear();
        self.add_order_by(path, order)
    }

    #[must_use]
    pub fn add_order_by(mut self, path: &str, order: Order) -> Self {
        self.order.push((path.to_string(), order));
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Resolve everything and render the statement
    pub fn build(&self) -> Result<QuerySpec> {
        self.build_with_limit(self.limit)
    }

    /// Rendered SQL, mostly for logging and tests
    pub fn to_sql(&self) -> Result<String> {
        Ok(self.build()?.sql)
    }

    pub(crate) fn build_with_limit(&self, limit: Option<u64>) -> Result<QuerySpec> {
        let (mut stmt, joins) = self.base_statement()?;
        let sources = self.sources(&joins);
        let bindings = self.resolve_bindings(&sources)?;

        for binding in &bindings {
            let expr = match &binding.source {
                SelectSource::Column { alias, column, .. } => {
                    Expr::col((Alias::new(alias.as_str()), Alias::new(column.as_str())))
                }
                SelectSource::Expr(expr) => Expr::cust(expr.clone()),
            };
            stmt.expr_as(expr, Alias::new(binding.result_name.as_str()));
        }

        for (path, order) in &self.order {
            match path.split_once('.') {
                Some((alias, property)) => {
                    let column = column_name(&sources, alias, property)?;
                    stmt.order_by(
                        (Alias::new(alias), Alias::new(column.as_str())),
                        order.clone(),
                    );
                }
                None => {
                    if !bindings.iter().any(|b| &b.result_name == path) {
                        return Err(OrmError::QueryError(format!(
                            "cannot order by {path}: not an alias.property or a selected result name"
                        )));
                    }
                    stmt.order_by(Alias::new(path.as_str()), order.clone());
                }
            }
        }

        if let Some(limit) = limit {
            stmt.limit(limit);
        }
        if let Some(offset) = self.offset {
            stmt.offset(offset);
        }

        let (sql, values) = self.data_source.executor().backend().build(&stmt);
        Ok(QuerySpec {
            entity: Arc::clone(&self.entity),
            alias: self.alias.clone(),
            joins,
            bindings,
            sql,
            values,
        })
    }

    /// `SELECT COUNT(...)` over the same sources and predicate
    pub(crate) fn build_count(&self) -> Result<(String, Vec<Value>)> {
        let (mut stmt, _) = self.base_statement()?;

        let count = match self.entity.primary_key() {
            [pk] => {
                let column = self.entity.require_column(pk)?.column.clone();
                format!("COUNT(DISTINCT {}.{})", self.alias, column)
            }
            _ => "COUNT(*)".to_string(),
        };
        stmt.expr_as(Expr::cust(count), Alias::new("cnt"));

        Ok(self.data_source.executor().backend().build(&stmt))
    }

    /// FROM, joins and WHERE; shared by the row and count statements
    fn base_statement(&self) -> Result<(SelectStatement, Vec<JoinSpec>)> {
        let registry = self.data_source.registry();
        let mut joins: Vec<JoinSpec> = Vec::with_capacity(self.joins.len());

        for join in &self.joins {
            if join.alias == self.alias || joins.iter().any(|j| j.alias == join.alias) {
                return Err(OrmError::DuplicateAlias(join.alias.clone()));
            }
            let target = match &join.target {
                PendingTarget::Entity(name) => JoinTarget::Entity(registry.resolve(name)?),
                PendingTarget::Table(table) => JoinTarget::Table(table.clone()),
            };
            joins.push(JoinSpec {
                kind: join.kind,
                target,
                alias: join.alias.clone(),
                on: join.on.clone(),
            });
        }

        let backend = self.data_source.executor().backend();
        let mut stmt = Query::select();
        stmt.from_as(
            Alias::new(self.entity.table()),
            Alias::new(self.alias.as_str()),
        );

        for join in &joins {
            let (on, values) = Predicate::raw(join.on.as_str()).bind(&self.params, backend)?;
            stmt.join_as(
                join.kind.into(),
                Alias::new(join.target.table()),
                Alias::new(join.alias.as_str()),
                Expr::cust_with_values(on, values),
            );
        }

        if let Some(predicate) = &self.predicate {
            let (sql, values) = predicate.bind(&self.params, backend)?;
            stmt.and_where(Expr::cust_with_values(sql, values));
        }

        Ok((stmt, joins))
    }

    /// Aliases in hydration priority order: primary first, then joins
    fn sources<'s>(&'s self, joins: &'s [JoinSpec]) -> Vec<(&'s str, Option<&'s Arc<EntityDescriptor>>)> {
        std::iter::once((self.alias.as_str(), Some(&self.entity)))
            .chain(joins.iter().map(|j| (j.alias.as_str(), j.target.descriptor())))
            .collect()
    }

    fn resolve_bindings(
        &self,
        sources: &[(&str, Option<&Arc<EntityDescriptor>>)],
    ) -> Result<Vec<SelectBinding>> {
        let mut bindings: Vec<SelectBinding> = Vec::new();
        let mut explicit_names: HashSet<String> = HashSet::new();

        for request in &self.selects {
            match request {
                SelectRequest::Path { path, result_name } => match path.split_once('.') {
                    None => {
                        let descriptor = lookup(sources, path)?.ok_or_else(|| {
                            OrmError::QueryError(format!(
                                "cannot select every column of raw table alias {path}"
                            ))
                        })?;
                        if result_name.is_some() {
                            return Err(OrmError::QueryError(format!(
                                "whole-alias selection of {path} cannot be renamed"
                            )));
                        }
                        for column in descriptor.default_columns() {
                            push_binding(
                                &mut bindings,
                                &mut explicit_names,
                                sources,
                                format!("{path}_{}", column.property),
                                SelectSource::Column {
                                    alias: path.clone(),
                                    property: column.property.clone(),
                                    column: column.column.clone(),
                                },
                                false,
                            )?;
                        }
                    }
                    Some((alias, property)) => {
                        let column = column_name(sources, alias, property)?;
                        let (explicit, name) = match result_name {
                            Some(name) => (true, name.clone()),
                            None => (false, format!("{alias}_{property}")),
                        };
                        push_binding(
                            &mut bindings,
                            &mut explicit_names,
                            sources,
                            name,
                            SelectSource::Column {
                                alias: alias.to_string(),
                                property: property.to_string(),
                                column,
                            },
                            explicit,
                        )?;
                    }
                },
                SelectRequest::Expr { expr, result_name } => push_binding(
                    &mut bindings,
                    &mut explicit_names,
                    sources,
                    result_name.clone(),
                    SelectSource::Expr(expr.clone()),
                    true,
                )?,
            }
        }

        if bindings.is_empty() {
            return Err(OrmError::QueryError("query selects no columns".to_string()));
        }
        Ok(bindings)
    }
}

fn lookup<'s>(
    sources: &[(&str, Option<&'s Arc<EntityDescriptor>>)],
    alias: &str,
) -> Result<Option<&'s Arc<EntityDescriptor>>> {
    sources
        .iter()
        .find(|(a, _)| *a == alias)
        .map(|(_, descriptor)| *descriptor)
        .ok_or_else(|| OrmError::UnknownAlias(alias.to_string()))
}

/// Column behind `alias.property`; raw table aliases take the property as-is
fn column_name(
    sources: &[(&str, Option<&Arc<EntityDescriptor>>)],
    alias: &str,
    property: &str,
) -> Result<String> {
    match lookup(sources, alias)? {
        Some(descriptor) => Ok(descriptor.require_column(property)?.column.clone()),
        None => Ok(property.to_string()),
    }
}

/// Add a binding and resolve its owner
///
/// A derived result name never displaces an existing binding. An explicit one
/// replaces a derived binding of the same name in place, and fails with
/// `QueryError` when the name was already given explicitly.
fn push_binding(
    bindings: &mut Vec<SelectBinding>,
    explicit_names: &mut HashSet<String>,
    sources: &[(&str, Option<&Arc<EntityDescriptor>>)],
    result_name: String,
    source: SelectSource,
    explicit: bool,
) -> Result<()> {
    let existing = bindings.iter().position(|b| b.result_name == result_name);
    if explicit && !explicit_names.insert(result_name.clone()) {
        return Err(OrmError::QueryError(format!(
            "result name {result_name} is selected more than once"
        )));
    }
    if existing.is_some() && !explicit {
        return Ok(());
    }

    let owner = if explicit {
        sources.iter().find_map(|(alias, descriptor)| {
            let column = (*descriptor)?.column_for_result(alias, &result_name)?;
            Some(BindingOwner {
                alias: alias.to_string(),
                property: column.property.clone(),
                column_type: column.column_type,
            })
        })
    } else {
        match &source {
            SelectSource::Column {
                alias, property, ..
            } => sources
                .iter()
                .find(|(a, _)| *a == alias.as_str())
                .and_then(|(_, descriptor)| (*descriptor)?.column(property))
                .map(|column| BindingOwner {
                    alias: alias.clone(),
                    property: property.clone(),
                    column_type: column.column_type,
                }),
            SelectSource::Expr(_) => None,
        }
    };

    let binding = SelectBinding {
        result_name,
        source,
        owner,
    };
    match existing {
        Some(index) => bindings[index] = binding,
        None => bindings.push(binding),
    }
    Ok(())
}
