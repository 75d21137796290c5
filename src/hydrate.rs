//! Row hydration
//!
//! Turns raw rows into [`Model`]s using the bindings recorded in a
//! [`QuerySpec`]. Only properties that were actually selected for an alias are
//! set on its model; everything else stays absent.

use indexmap::IndexMap;
use sea_query::Value;

use crate::error::Result;
use crate::executor::Row;
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
use crate::model::Model;
use crate::query::QuerySpec;

/// One primary entity instance plus the joined instances collected for it
#[derive(Debug, Clone, PartialEq)]
pub struct Hydrated {
    pub model: Model,
    /// Joined entity aliases to their distinct models, in first-seen order
    pub joined: IndexMap<String, Vec<Model>>,
}

impl Hydrated {
    /// Joined models for `alias`; empty when the alias hydrated nothing
    pub fn joined(&self, alias: &str) -> &[Model] {
        self.joined.get(alias).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Hydrate every row of a result set
///
/// Rows sharing a primary key collapse into one [`Hydrated`] when the key is
/// fully selected; otherwise each row yields its own instance.
pub fn hydrate(rows: &[Row], spec: &QuerySpec) -> Result<Vec<Hydrated>> {
    let primary = spec.alias();
    let dedupe = spec.primary_key_selected(primary);
    let joined_aliases: Vec<&str> = spec
        .joins()
        .iter()
        .filter(|j| j.target.descriptor().is_some())
        .map(|j| j.alias.as_str())
        .filter(|alias| spec.bindings_for(alias).next().is_some())
        .collect();

    let mut out: Vec<Hydrated> = Vec::new();
    let mut by_key: IndexMap<String, usize> = IndexMap::new();

    for row in rows {
        let model = hydrate_alias(row, spec, primary)?;

        let slot = match dedupe.then(|| model.primary_key(spec.entity())).flatten() {
            Some(pk) => {
                let key = key_of(&pk);
                match by_key.get(&key) {
                    Some(&index) => index,
                    None => {
                        by_key.insert(key, out.len());
                        out.push(Hydrated {
                            model,
                            joined: IndexMap::new(),
                        });
                        out.len() - 1
                    }
                }
            }
            None => {
                out.push(Hydrated {
                    model,
                    joined: IndexMap::new(),
                });
                out.len() - 1
            }
        };

        for alias in &joined_aliases {
            let joined = hydrate_alias(row, spec, alias)?;
            let models = out[slot].joined.entry(alias.to_string()).or_default();
            if !contains_instance(models, &joined, spec, alias) {
                models.push(joined);
            }
        }
    }

    log::trace!(
        "Hydrated {} row(s) into {} {} instance(s)",
        rows.len(),
        out.len(),
        spec.entity().name()
    );
    #[cfg(feature = "metrics")]
    METRICS.record_rows_hydrated(rows.len() as u64);

    Ok(out)
}

/// Build the model for one alias from the bindings it owns
fn hydrate_alias(row: &Row, spec: &QuerySpec, alias: &str) -> Result<Model> {
    let entity = spec
        .descriptor_for(alias)
        .map(|d| d.name().to_string())
        .unwrap_or_default();
    let mut model = Model::new(entity);

    for binding in spec.bindings_for(alias) {
        let Some(owner) = &binding.owner else { continue };
        let Some(raw) = row.field(&binding.result_name) else {
            continue;
        };
        let value = match raw {
            Some(value) => owner.column_type.coerce(&owner.property, value.clone())?,
            None => owner.column_type.null_value(),
        };
        model.set(owner.property.clone(), value);
    }

    Ok(model)
}

fn contains_instance(models: &[Model], candidate: &Model, spec: &QuerySpec, alias: &str) -> bool {
    let key = spec
        .descriptor_for(alias)
        .filter(|_| spec.primary_key_selected(alias))
        .and_then(|d| candidate.primary_key(d));

    match key {
        Some(pk) => models.iter().any(|m| {
            spec.descriptor_for(alias)
                .and_then(|d| m.primary_key(d))
                .is_some_and(|other| other == pk)
        }),
        None => models.iter().any(|m| m == candidate),
    }
}

fn key_of(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| format!("{v:?}"))
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::DataSource;
    use crate::schema::{ColumnDef, ColumnType, EntitySchema, Registry};
    use crate::sqlite::SqliteExecutor;

    fn data_source() -> DataSource {
        let mut registry = Registry::new();
        registry
            .register(
                EntitySchema::new("Post", "post")
                    .column(ColumnDef::new("id", ColumnType::Integer).primary_key())
                    .column(ColumnDef::new("title", ColumnType::Text))
                    .column(ColumnDef::new("category_id", ColumnType::Integer).nullable()),
            )
            .unwrap();
        registry
            .register(
                EntitySchema::new("Category", "category")
                    .column(ColumnDef::new("id", ColumnType::Integer).primary_key())
                    .column(ColumnDef::new("name", ColumnType::Text)),
            )
            .unwrap();
        DataSource::new(registry, SqliteExecutor::in_memory().unwrap())
    }

    #[test]
    fn test_rows_with_same_key_collapse() {
        let ds = data_source();
        let spec = ds
            .query_builder("Post", "p")
            .unwrap()
            .join(crate::query::JoinKind::Left, "Category", "k", "k.id = p.category_id")
            .select("p.id")
            .add_select("k.name")
            .build()
            .unwrap();

        let rows = vec![
            Row::new()
                .with("p_id", Some(Value::BigInt(Some(1))))
                .with("k_name", Some(Value::String(Some("a".into())))),
            Row::new()
                .with("p_id", Some(Value::BigInt(Some(1))))
                .with("k_name", Some(Value::String(Some("b".into())))),
        ];

        let hydrated = hydrate(&rows, &spec).unwrap();
        assert_eq!(hydrated.len(), 1);
        assert_eq!(hydrated[0].joined("k").len(), 2);
    }

    #[test]
    fn test_rows_without_key_do_not_collapse() {
        let ds = data_source();
        let spec = ds
            .query_builder("Post", "p")
            .unwrap()
            .select("p.title")
            .build()
            .unwrap();

        let row = Row::new().with("p_title", Some(Value::String(Some("same".into()))));
        let hydrated = hydrate(&[row.clone(), row], &spec).unwrap();

        assert_eq!(hydrated.len(), 2);
        assert!(!hydrated[0].model.contains("id"));
    }

    #[test]
    fn test_null_becomes_typed_null() {
        let ds = data_source();
        let spec = ds
            .query_builder("Post", "p")
            .unwrap()
            .select("p.id")
            .add_select("p.category_id")
            .build()
            .unwrap();

        let row = Row::new()
            .with("p_id", Some(Value::BigInt(Some(2))))
            .with("p_category_id", None);
        let hydrated = hydrate(&[row], &spec).unwrap();

        assert_eq!(hydrated[0].model.get("category_id"), Some(&Value::BigInt(None)));
        assert!(!hydrated[0].model.contains("title"));
    }

    #[test]
    fn test_composite_key_collapses_only_when_fully_selected() {
        let mut registry = Registry::new();
        registry
            .register(
                EntitySchema::new("PostTag", "post_tag")
                    .column(ColumnDef::new("post_id", ColumnType::Integer).primary_key())
                    .column(ColumnDef::new("tag", ColumnType::Text).primary_key())
                    .column(ColumnDef::new("weight", ColumnType::Integer)),
            )
            .unwrap();
        let ds = DataSource::new(registry, SqliteExecutor::in_memory().unwrap());

        let tagged = |post_id: i64, tag: &str| {
            Row::new()
                .with("t_post_id", Some(Value::BigInt(Some(post_id))))
                .with("t_tag", Some(Value::String(Some(tag.to_string()))))
        };
        let rows = vec![tagged(1, "rust"), tagged(1, "sql"), tagged(1, "rust"), tagged(2, "rust")];

        let spec = ds
            .query_builder("PostTag", "t")
            .unwrap()
            .select("t.post_id")
            .add_select("t.tag")
            .build()
            .unwrap();
        let hydrated = hydrate(&rows, &spec).unwrap();
        assert_eq!(hydrated.len(), 3);
        assert_eq!(hydrated[2].model.get("post_id"), Some(&Value::BigInt(Some(2))));

        let spec = ds
            .query_builder("PostTag", "t")
            .unwrap()
            .select("t.post_id")
            .build()
            .unwrap();
        let rows: Vec<Row> = (0..3)
            .map(|_| Row::new().with("t_post_id", Some(Value::BigInt(Some(1)))))
            .collect();
        assert_eq!(hydrate(&rows, &spec).unwrap().len(), 3);
    }
}
