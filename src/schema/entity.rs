//! Entity schemas (what the application declares) and entity descriptors (what
//! the registry hands out).

use crate::error::{OrmError, Result};

use super::column::ColumnDef;

/// Declared shape of an entity
///
/// Schemas are plain builders evaluated once at startup and passed to
/// [`Registry::register`](super::Registry::register).
///
/// # Example
///
/// ```
/// use driftwood::{ColumnDef, ColumnType, EntitySchema};
///
/// let post = EntitySchema::new("Post", "post")
///     .column(ColumnDef::new("id", ColumnType::Integer).primary_key())
///     .column(ColumnDef::new("title", ColumnType::Text));
///
/// // Same table, extra column only fetched on request
/// let post_ex = EntitySchema::new("PostEx", "post")
///     .extends("Post")
///     .column(ColumnDef::new("category_name", ColumnType::Text).select(false));
/// assert!(!post_ex.synchronize);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    pub name: String,
    pub table: String,
    pub columns: Vec<ColumnDef>,
    /// Base entity this schema is layered on
    pub extends: Option<String>,
    /// Whether the entity owns its table (false for extensions)
    pub synchronize: bool,
}

impl EntitySchema {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            columns: Vec::new(),
            extends: None,
            synchronize: true,
        }
    }

    #[must_use]
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Declare this schema as a non-synchronizing extension of `base`
    #[must_use]
    pub fn extends(mut self, base: impl Into<String>) -> Self {
        self.extends = Some(base.into());
        self.synchronize = false;
        self
    }
}

/// Immutable table/column mapping for one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    name: String,
    table: String,
    primary_key: Vec<String>,
    columns: Vec<ColumnDef>,
    /// Leading columns declared by the entity itself; the rest are inherited
    own_columns: usize,
    extends: Option<String>,
    synchronize: bool,
}

impl EntityDescriptor {
    /// Build a descriptor for a schema with no base
    pub(crate) fn from_schema(schema: EntitySchema) -> Result<Self> {
        let own_columns = schema.columns.len();
        Self::build(
            schema.name,
            schema.table,
            schema.columns,
            own_columns,
            schema.extends,
            schema.synchronize,
        )
    }

    /// Overlay an extension schema onto its base descriptor
    ///
    /// Same property name overrides the inherited column, a new property is
    /// appended. The extension's own declarations come first, followed by the
    /// inherited columns it left untouched.
    pub(crate) fn overlay(base: &EntityDescriptor, schema: EntitySchema) -> Result<Self> {
        if base.table != schema.table {
            return Err(OrmError::InvalidSchema(format!(
                "{} extends {} but maps table {} instead of {}",
                schema.name, base.name, schema.table, base.table
            )));
        }

        let own_columns = schema.columns.len();
        let mut columns = schema.columns;
        let inherited: Vec<ColumnDef> = base
            .columns
            .iter()
            .filter(|c| !columns.iter().any(|own| own.property == c.property))
            .cloned()
            .collect();
        columns.extend(inherited);

        Self::build(
            schema.name,
            schema.table,
            columns,
            own_columns,
            schema.extends,
            schema.synchronize,
        )
    }

    fn build(
        name: String,
        table: String,
        columns: Vec<ColumnDef>,
        own_columns: usize,
        extends: Option<String>,
        synchronize: bool,
    ) -> Result<Self> {
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.property == column.property) {
                return Err(OrmError::InvalidSchema(format!(
                    "{name} declares property {} twice",
                    column.property
                )));
            }
        }

        let primary_key: Vec<String> = columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.property.clone())
            .collect();
        if primary_key.is_empty() {
            return Err(OrmError::InvalidSchema(format!("{name} has no primary key")));
        }

        Ok(Self {
            name,
            table,
            primary_key,
            columns,
            own_columns,
            extends,
            synchronize,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Primary key properties in declaration order
    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn extends(&self) -> Option<&str> {
        self.extends.as_deref()
    }

    pub fn synchronize(&self) -> bool {
        self.synchronize
    }

    /// Look up a column by property name
    pub fn column(&self, property: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.property == property)
    }

    /// Look up a column by property name, failing with `UnknownProperty`
    pub fn require_column(&self, property: &str) -> Result<&ColumnDef> {
        self.column(property).ok_or_else(|| OrmError::UnknownProperty {
            entity: self.name.clone(),
            property: property.to_string(),
        })
    }

    /// Columns an insert must give a non-null value
    ///
    /// Non-nullable columns the store does not generate. For an extension only
    /// the inherited columns count; its own declarations may map values that
    /// exist only in queries.
    pub fn required_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        let start = if self.extends.is_some() {
            self.own_columns
        } else {
            0
        };
        self.columns[start..]
            .iter()
            .filter(|c| !c.nullable && !c.generated)
    }

    /// Columns fetched when a query does not restrict the selection
    pub fn default_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| c.select)
    }

    /// Find the column a result name refers to for `alias`
    ///
    /// Accepts both `alias_property` and `alias_column`.
    pub fn column_for_result(&self, alias: &str, result_name: &str) -> Option<&ColumnDef> {
        let suffix = result_name
            .strip_prefix(alias)
            .and_then(|rest| rest.strip_prefix('_'))?;
        self.columns
            .iter()
            .find(|c| c.property == suffix)
            .or_else(|| self.columns.iter().find(|c| c.column == suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    fn post() -> EntityDescriptor {
        EntityDescriptor::from_schema(
            EntitySchema::new("Post", "post")
                .column(ColumnDef::new("id", ColumnType::Integer).primary_key())
                .column(ColumnDef::new("title", ColumnType::Text))
                .column(ColumnDef::new("description", ColumnType::Text))
                .column(ColumnDef::new("category_id", ColumnType::Integer)),
        )
        .unwrap()
    }

    #[test]
    fn test_descriptor_primary_key() {
        assert_eq!(post().primary_key(), ["id".to_string()]);
    }

    #[test]
    fn test_descriptor_requires_primary_key() {
        let result = EntityDescriptor::from_schema(
            EntitySchema::new("Loose", "loose").column(ColumnDef::new("a", ColumnType::Text)),
        );
        assert!(matches!(result, Err(OrmError::InvalidSchema(_))));
    }

    #[test]
    fn test_overlay_order_and_override() {
        let ex = EntityDescriptor::overlay(
            &post(),
            EntitySchema::new("PostEx", "post")
                .extends("Post")
                .column(ColumnDef::new("category_name", ColumnType::Text).select(false))
                .column(
                    ColumnDef::new("description", ColumnType::Text)
                        .name("category_description")
                        .select(false),
                ),
        )
        .unwrap();

        let order: Vec<&str> = ex.columns().iter().map(|c| c.property.as_str()).collect();
        assert_eq!(order, ["category_name", "description", "id", "title", "category_id"]);
        assert_eq!(ex.column("description").unwrap().column, "category_description");
        assert_eq!(ex.primary_key(), ["id".to_string()]);
        assert!(!ex.synchronize());
    }

    #[test]
    fn test_required_columns() {
        let post = EntityDescriptor::from_schema(
            EntitySchema::new("Post", "post")
                .column(ColumnDef::new("id", ColumnType::Integer).generated())
                .column(ColumnDef::new("title", ColumnType::Text))
                .column(ColumnDef::new("subtitle", ColumnType::Text).nullable()),
        )
        .unwrap();
        let required: Vec<&str> = post.required_columns().map(|c| c.property.as_str()).collect();
        assert_eq!(required, ["title"]);

        let ex = EntityDescriptor::overlay(
            &post,
            EntitySchema::new("PostEx", "post")
                .extends("Post")
                .column(ColumnDef::new("category_name", ColumnType::Text).select(false)),
        )
        .unwrap();
        let required: Vec<&str> = ex.required_columns().map(|c| c.property.as_str()).collect();
        assert_eq!(required, ["title"]);
    }

    #[test]
    fn test_overlay_rejects_other_table() {
        let result = EntityDescriptor::overlay(
            &post(),
            EntitySchema::new("PostEx", "posts_v2").extends("Post"),
        );
        assert!(matches!(result, Err(OrmError::InvalidSchema(_))));
    }

    #[test]
    fn test_column_for_result() {
        let post = post();
        assert_eq!(post.column_for_result("p", "p_title").unwrap().property, "title");
        assert_eq!(post.column_for_result("p", "p_category_id").unwrap().property, "category_id");
        assert!(post.column_for_result("p", "c_title").is_none());
        assert!(post.column_for_result("p", "ptitle").is_none());
    }
}
