//! Named query parameters.
//!
//! Predicates and join conditions are raw SQL fragments that reference values
//! as `:name`. [`Params`] holds the bound values; [`bind_placeholders`]
//! rewrites each placeholder to the backend's positional marker (`?`, or
//! `$1..$n` for PostgreSQL) and collects the values in order.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_query::Value;

use crate::error::{OrmError, Result};
use crate::executor::Backend;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").expect("placeholder pattern is valid"));

/// Named parameter values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: IndexMap<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value under `name` (without the leading colon)
    #[must_use]
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Merge `other` into `self`; later bindings win
    pub fn extend(&mut self, other: Params) {
        self.values.extend(other.values);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Rewrite `:name` placeholders to positional markers and collect their values
/// in order
///
/// Markers are numbered from 1 within the fragment. Placeholders inside
/// single-quoted literals and `::type` casts are left alone. A placeholder
/// without a binding fails with `UnboundParameter`.
pub fn bind_placeholders(
    fragment: &str,
    params: &Params,
    backend: Backend,
) -> Result<(String, Vec<Value>)> {
    let mut sql = String::with_capacity(fragment.len());
    let mut values = Vec::new();
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(fragment) {
        let Some(whole) = caps.get(0) else { continue };
        let start = whole.start();

        let after_colon = start > 0 && fragment.as_bytes()[start - 1] == b':';
        let in_literal = fragment[..start].matches('\'').count() % 2 == 1;
        if after_colon || in_literal {
            continue;
        }

        let name = &caps[1];
        let value = params
            .get(name)
            .ok_or_else(|| OrmError::UnboundParameter(name.to_string()))?;

        sql.push_str(&fragment[last..start]);
        values.push(value.clone());
        sql.push_str(&backend.placeholder(values.len()));
        last = whole.end();
    }
    sql.push_str(&fragment[last..]);

    Ok((sql, values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_single_placeholder() {
        let params = Params::new().bind("id", 1);
        let (sql, values) = bind_placeholders("p.id = :id", &params, Backend::Sqlite).unwrap();

        assert_eq!(sql, "p.id = ?");
        assert_eq!(values, vec![Value::Int(Some(1))]);
    }

    #[test]
    fn test_bind_repeated_placeholder() {
        let params = Params::new().bind("v", 2);
        let (sql, values) = bind_placeholders("a = :v OR b = :v", &params, Backend::Sqlite).unwrap();

        assert_eq!(sql, "a = ? OR b = ?");
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_unbound_parameter() {
        let err = bind_placeholders("p.id = :id", &Params::new(), Backend::Sqlite).unwrap_err();
        assert_eq!(err, OrmError::UnboundParameter("id".to_string()));
    }

    #[test]
    fn test_casts_and_literals_are_ignored() {
        let params = Params::new().bind("x", 1);
        let (sql, values) = bind_placeholders(
            "p.created::date = ':nope' AND p.x = :x",
            &params,
            Backend::Sqlite,
        )
        .unwrap();

        assert_eq!(sql, "p.created::date = ':nope' AND p.x = ?");
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_postgres_markers_are_numbered() {
        let params = Params::new().bind("a", 1).bind("b", 2);
        let (sql, values) =
            bind_placeholders("p.id = :a OR p.id = :b OR p.rating = :a", &params, Backend::Postgres)
                .unwrap();

        assert_eq!(sql, "p.id = $1 OR p.id = $2 OR p.rating = $3");
        assert_eq!(
            values,
            vec![Value::Int(Some(1)), Value::Int(Some(2)), Value::Int(Some(1))]
        );
    }

    #[test]
    fn test_later_bindings_win() {
        let mut params = Params::new().bind("id", 1);
        params.extend(Params::new().bind("id", 2));
        assert_eq!(params.get("id"), Some(&Value::Int(Some(2))));
    }
}
