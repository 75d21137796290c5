//! Immutable result of building a query.
//!
//! A [`QuerySpec`] carries the rendered statement together with the binding
//! list the hydrator needs: for every result column, where it was selected
//! from and which alias/property (if any) it populates.

use std::sync::Arc;

use sea_query::{JoinType, Value};

use crate::schema::{ColumnType, EntityDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    Left,
}

impl From<JoinKind> for JoinType {
    fn from(kind: JoinKind) -> Self {
        match kind {
            JoinKind::Inner => JoinType::InnerJoin,
            JoinKind::Left => JoinType::LeftJoin,
        }
    }
}

/// What a join (or the primary alias) reads from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinTarget {
    /// A registered entity; its alias can be hydrated
    Entity(Arc<EntityDescriptor>),
    /// A raw table with no descriptor
    Table(String),
}

impl JoinTarget {
    pub fn table(&self) -> &str {
        match self {
            JoinTarget::Entity(descriptor) => descriptor.table(),
            JoinTarget::Table(table) => table,
        }
    }

    pub fn descriptor(&self) -> Option<&Arc<EntityDescriptor>> {
        match self {
            JoinTarget::Entity(descriptor) => Some(descriptor),
            JoinTarget::Table(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    pub kind: JoinKind,
    pub target: JoinTarget,
    pub alias: String,
    /// ON condition as written, placeholders intact
    pub on: String,
}

/// Where a result column comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectSource {
    Column {
        alias: String,
        property: String,
        column: String,
    },
    Expr(String),
}

/// Alias/property a result column populates during hydration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingOwner {
    pub alias: String,
    pub property: String,
    pub column_type: ColumnType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectBinding {
    pub result_name: String,
    pub source: SelectSource,
    /// `None` for raw-only columns
    pub owner: Option<BindingOwner>,
}

/// Built query: statement plus hydration bindings
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub(crate) entity: Arc<EntityDescriptor>,
    pub(crate) alias: String,
    pub(crate) joins: Vec<JoinSpec>,
    pub(crate) bindings: Vec<SelectBinding>,
    pub(crate) sql: String,
    pub(crate) values: Vec<Value>,
}

impl QuerySpec {
    /// Descriptor of the primary entity
    pub fn entity(&self) -> &Arc<EntityDescriptor> {
        &self.entity
    }

    /// Primary alias
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn joins(&self) -> &[JoinSpec] {
        &self.joins
    }

    pub fn bindings(&self) -> &[SelectBinding] {
        &self.bindings
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Positional parameter values, in placeholder order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Result names in select order
    pub fn result_names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|b| b.result_name.as_str())
    }

    /// Descriptor bound to an alias, if the alias is hydratable
    pub fn descriptor_for(&self, alias: &str) -> Option<&Arc<EntityDescriptor>> {
        if alias == self.alias {
            return Some(&self.entity);
        }
        self.joins
            .iter()
            .find(|j| j.alias == alias)
            .and_then(|j| j.target.descriptor())
    }

    /// Bindings owned by `alias`
    pub fn bindings_for<'s>(&'s self, alias: &'s str) -> impl Iterator<Item = &'s SelectBinding> {
        self.bindings
            .iter()
            .filter(move |b| b.owner.as_ref().is_some_and(|o| o.alias == alias))
    }

    /// Whether every primary key property of `alias` is selected
    pub fn primary_key_selected(&self, alias: &str) -> bool {
        let Some(descriptor) = self.descriptor_for(alias) else {
            return false;
        };
        descriptor
            .primary_key()
            .iter()
            .all(|pk| self.bindings_for(alias).any(|b| b.owner.as_ref().is_some_and(|o| &o.property == pk)))
    }
}
