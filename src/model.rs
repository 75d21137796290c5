//! Hydrated entity instances
//!
//! [`Model`] is the dynamic form of a hydrated entity: a sparse, ordered map
//! from property name to value. A property that was not selected is simply not
//! in the map; a selected property that came back NULL is present with a typed
//! null. [`Entity`] converts between a `Model` and a user struct whose fields
//! are [`Attr`]s, and is normally implemented with the [`entity!`](crate::entity)
//! macro.

use indexmap::IndexMap;
use sea_query::Value;

use crate::error::{OrmError, Result};
use crate::schema::{EntityDescriptor, EntitySchema};
use crate::value::{is_null, Attr, FieldType, TryGetable, ValueExtractionError};

/// Typed entity mapped through the registry
///
/// # Example
///
/// ```
/// use driftwood::{entity, Attr, Entity};
///
/// entity! {
///     #[derive(Debug, Default)]
///     pub struct Category in "category" {
///         id: i64 { generated() },
///         name: String,
///     }
/// }
///
/// let category = Category { id: Attr::Unset, name: Attr::Set("News".to_string()) };
/// let model = category.into_model();
/// assert!(!model.contains("id"));
/// assert_eq!(Category::schema().table, "category");
/// ```
pub trait Entity: Sized {
    /// Registry name of the entity
    const NAME: &'static str;

    /// Declared schema, registered once at startup
    fn schema() -> EntitySchema;

    /// Build the typed entity from a hydrated model
    fn from_model(model: &Model) -> Result<Self>;

    /// Convert into a sparse model; `Attr::Unset` fields are left out
    fn into_model(self) -> Model;
}

/// Target of a query: either a typed [`Entity`] or the dynamic [`Model`]
pub trait FromModel: Sized {
    fn try_from_model(model: Model) -> Result<Self>;
}

impl FromModel for Model {
    fn try_from_model(model: Model) -> Result<Self> {
        Ok(model)
    }
}

impl<E: Entity> FromModel for E {
    fn try_from_model(model: Model) -> Result<Self> {
        <E as Entity>::from_model(&model)
    }
}

/// Sparse hydrated record for one entity instance
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    entity: String,
    values: IndexMap<String, Value>,
}

impl Model {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            values: IndexMap::new(),
        }
    }

    /// Name of the entity this record belongs to
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Value of a property; `None` means the property is absent
    pub fn get(&self, property: &str) -> Option<&Value> {
        self.values.get(property)
    }

    /// Whether the property was populated (possibly with NULL)
    pub fn contains(&self, property: &str) -> bool {
        self.values.contains_key(property)
    }

    /// Whether the property was populated with NULL
    pub fn is_null(&self, property: &str) -> bool {
        self.values.get(property).is_some_and(is_null)
    }

    pub fn set(&mut self, property: impl Into<String>, value: Value) {
        self.values.insert(property.into(), value);
    }

    pub fn remove(&mut self, property: &str) -> Option<Value> {
        self.values.shift_remove(property)
    }

    /// Populated properties in the order they were set
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Read a property as a typed attribute
    pub fn attr<T: TryGetable>(&self, property: &str) -> Result<Attr<T>> {
        let Some(value) = self.values.get(property) else {
            return Ok(Attr::Unset);
        };
        if is_null(value) {
            return Ok(Attr::Null);
        }
        T::try_get(value.clone())
            .map(Attr::Set)
            .map_err(|err| match err {
                ValueExtractionError::NullValue => OrmError::NullValue(property.to_string()),
                ValueExtractionError::TypeMismatch { expected, actual } => OrmError::TypeMismatch {
                    property: property.to_string(),
                    expected,
                    actual,
                },
                ValueExtractionError::ConversionError(msg) => OrmError::TypeMismatch {
                    property: property.to_string(),
                    expected: std::any::type_name::<T>().to_string(),
                    actual: msg,
                },
            })
    }

    /// Store a typed attribute; `Unset` removes the property
    pub fn set_attr<T: FieldType>(&mut self, property: &str, attr: Attr<T>) {
        match attr {
            Attr::Unset => {
                self.values.shift_remove(property);
            }
            Attr::Null => self.set(property, T::COLUMN_TYPE.null_value()),
            Attr::Set(v) => self.set(property, v.into_value()),
        }
    }

    /// Primary key values, if every key property is present and non-null
    pub fn primary_key(&self, descriptor: &EntityDescriptor) -> Option<Vec<Value>> {
        descriptor
            .primary_key()
            .iter()
            .map(|pk| self.values.get(pk).filter(|v| !is_null(v)).cloned())
            .collect()
    }
}
