//! Column metadata and declared column types.
//!
//! `ColumnDef` stores how one entity property maps onto a table column: the
//! column name, whether it is part of the default select list, its declared
//! type and its constraints. It doubles as the builder used when declaring an
//! entity schema.

use sea_query::Value;

use crate::error::{OrmError, Result};
use crate::value::is_null;

/// Declared type of a mapped column
///
/// Hydration coerces raw executor values to this type, and SQL NULL becomes
/// the matching typed null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    Double,
    Text,
    Boolean,
    Bytes,
    Json,
}

impl ColumnType {
    /// Name used in error messages
    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Double => "double",
            ColumnType::Text => "text",
            ColumnType::Boolean => "boolean",
            ColumnType::Bytes => "bytes",
            ColumnType::Json => "json",
        }
    }

    /// Typed NULL for this column type
    pub fn null_value(self) -> Value {
        match self {
            ColumnType::Integer => Value::BigInt(None),
            ColumnType::Double => Value::Double(None),
            ColumnType::Text => Value::String(None),
            ColumnType::Boolean => Value::Bool(None),
            ColumnType::Bytes => Value::Bytes(None),
            ColumnType::Json => Value::Json(None),
        }
    }

    /// Coerce a raw value into this column type
    ///
    /// Stores like SQLite hand back loosely typed scalars (booleans as
    /// integers, JSON as text), so widening and the obvious reinterpretations
    /// are accepted. Anything else is a `TypeMismatch` for `property`.
    pub fn coerce(self, property: &str, value: Value) -> Result<Value> {
        if is_null(&value) {
            return Ok(self.null_value());
        }

        let coerced = match (self, value) {
            (ColumnType::Integer, v @ Value::BigInt(_)) => v,
            (ColumnType::Integer, Value::Int(Some(i))) => Value::BigInt(Some(i64::from(i))),
            (ColumnType::Integer, Value::SmallInt(Some(i))) => Value::BigInt(Some(i64::from(i))),
            (ColumnType::Integer, Value::TinyInt(Some(i))) => Value::BigInt(Some(i64::from(i))),
            (ColumnType::Integer, Value::Unsigned(Some(u))) => Value::BigInt(Some(i64::from(u))),
            (ColumnType::Integer, Value::Bool(Some(b))) => Value::BigInt(Some(i64::from(b))),

            (ColumnType::Double, v @ Value::Double(_)) => v,
            (ColumnType::Double, Value::Float(Some(f))) => Value::Double(Some(f64::from(f))),
            (ColumnType::Double, Value::BigInt(Some(i))) => Value::Double(Some(i as f64)),
            (ColumnType::Double, Value::Int(Some(i))) => Value::Double(Some(f64::from(i))),

            (ColumnType::Text, v @ Value::String(_)) => v,
            (ColumnType::Text, Value::Char(Some(c))) => Value::String(Some(c.to_string())),

            (ColumnType::Boolean, v @ Value::Bool(_)) => v,
            (ColumnType::Boolean, Value::BigInt(Some(i))) => Value::Bool(Some(i != 0)),
            (ColumnType::Boolean, Value::Int(Some(i))) => Value::Bool(Some(i != 0)),

            (ColumnType::Bytes, v @ Value::Bytes(_)) => v,
            (ColumnType::Bytes, Value::String(Some(s))) => Value::Bytes(Some(s.into_bytes())),

            (ColumnType::Json, v @ Value::Json(_)) => v,
            (ColumnType::Json, Value::String(Some(s))) => {
                let json: serde_json::Value =
                    serde_json::from_str(&s).map_err(|e| OrmError::TypeMismatch {
                        property: property.to_string(),
                        expected: self.name().to_string(),
                        actual: e.to_string(),
                    })?;
                Value::Json(Some(Box::new(json)))
            }

            (ty, other) => {
                return Err(OrmError::TypeMismatch {
                    property: property.to_string(),
                    expected: ty.name().to_string(),
                    actual: format!("{other:?}"),
                })
            }
        };

        Ok(coerced)
    }
}

/// Column definition metadata
///
/// # Example
///
/// ```
/// use driftwood::{ColumnDef, ColumnType};
///
/// let def = ColumnDef::new("category_name", ColumnType::Text)
///     .name("category_name")
///     .select(false);
/// assert!(!def.select);
/// assert_eq!(def.column, "category_name");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Property name on the entity
    pub property: String,
    /// Column name in the table (defaults to the property name)
    pub column: String,
    /// Part of the default select list
    pub select: bool,
    /// Declared type
    pub column_type: ColumnType,
    /// Whether the column accepts NULL
    pub nullable: bool,
    /// Whether the column is (part of) the primary key
    pub primary_key: bool,
    /// Whether the store generates the value on insert
    pub generated: bool,
}

impl ColumnDef {
    pub fn new(property: impl Into<String>, column_type: ColumnType) -> Self {
        let property = property.into();
        Self {
            column: property.clone(),
            property,
            select: true,
            column_type,
            nullable: false,
            primary_key: false,
            generated: false,
        }
    }

    /// Map the property onto a differently named column
    #[must_use]
    pub fn name(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    /// Include or exclude the column from the default select list
    #[must_use]
    pub fn select(mut self, select: bool) -> Self {
        self.select = select;
        self
    }

    #[must_use]
    pub fn column_type(mut self, column_type: ColumnType) -> Self {
        self.column_type = column_type;
        self
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Primary key generated by the store (e.g. `INTEGER PRIMARY KEY`)
    #[must_use]
    pub fn generated(mut self) -> Self {
        self.primary_key = true;
        self.generated = true;
        self
    }
}
