//! Predicate tree built by `filter` / `and_filter` / `or_filter`.

use sea_query::Value;

use super::params::{bind_placeholders, Params};
use crate::error::Result;
use crate::executor::Backend;

/// Boolean expression over raw SQL fragments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Raw(String),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn raw(fragment: impl Into<String>) -> Self {
        Predicate::Raw(fragment.into())
    }

    /// Conjoin, flattening nested `And`s
    #[must_use]
    pub fn and(self, other: Predicate) -> Self {
        match self {
            Predicate::And(mut parts) => {
                parts.push(other);
                Predicate::And(parts)
            }
            first => Predicate::And(vec![first, other]),
        }
    }

    /// Disjoin, flattening nested `Or`s
    #[must_use]
    pub fn or(self, other: Predicate) -> Self {
        match self {
            Predicate::Or(mut parts) => {
                parts.push(other);
                Predicate::Or(parts)
            }
            first => Predicate::Or(vec![first, other]),
        }
    }

    /// Render to SQL text with `:name` placeholders intact
    pub fn render(&self) -> String {
        match self {
            Predicate::Raw(fragment) => fragment.clone(),
            Predicate::And(parts) => join(parts, " AND "),
            Predicate::Or(parts) => join(parts, " OR "),
        }
    }

    /// Render and bind parameters, yielding positional SQL and values
    pub fn bind(&self, params: &Params, backend: Backend) -> Result<(String, Vec<Value>)> {
        bind_placeholders(&self.render(), params, backend)
    }
}

fn join(parts: &[Predicate], op: &str) -> String {
    parts
        .iter()
        .map(|p| format!("({})", p.render()))
        .collect::<Vec<_>>()
        .join(op)
}
