//! `FieldType` maps Rust field types to declared column types.
//!
//! The `entity!` macro uses it to infer a column's [`ColumnType`] from the
//! field's Rust type, and to turn `Attr<T>` fields back into `sea_query::Value`s
//! when an entity is saved.
//!
//! ```rust
//! use driftwood::{ColumnType, FieldType};
//! use sea_query::Value;
//!
//! assert_eq!(<i64 as FieldType>::COLUMN_TYPE, ColumnType::Integer);
//! assert!(matches!(42i64.into_value(), Value::BigInt(Some(42))));
//! ```

use sea_query::Value;

use super::TryGetable;
use crate::schema::ColumnType;

/// Rust types that can back an entity field
pub trait FieldType: TryGetable {
    /// Declared column type used when the schema does not override it
    const COLUMN_TYPE: ColumnType;

    /// Convert this value into a `sea_query::Value`.
    fn into_value(self) -> Value;
}

impl FieldType for i64 {
    const COLUMN_TYPE: ColumnType = ColumnType::Integer;

    fn into_value(self) -> Value {
        Value::BigInt(Some(self))
    }
}

impl FieldType for i32 {
    const COLUMN_TYPE: ColumnType = ColumnType::Integer;

    fn into_value(self) -> Value {
        Value::BigInt(Some(i64::from(self)))
    }
}

impl FieldType for f64 {
    const COLUMN_TYPE: ColumnType = ColumnType::Double;

    fn into_value(self) -> Value {
        Value::Double(Some(self))
    }
}

impl FieldType for bool {
    const COLUMN_TYPE: ColumnType = ColumnType::Boolean;

    fn into_value(self) -> Value {
        Value::Bool(Some(self))
    }
}

impl FieldType for String {
    const COLUMN_TYPE: ColumnType = ColumnType::Text;

    fn into_value(self) -> Value {
        Value::String(Some(self))
    }
}

impl FieldType for Vec<u8> {
    const COLUMN_TYPE: ColumnType = ColumnType::Bytes;

    fn into_value(self) -> Value {
        Value::Bytes(Some(self))
    }
}

impl FieldType for serde_json::Value {
    const COLUMN_TYPE: ColumnType = ColumnType::Json;

    fn into_value(self) -> Value {
        Value::Json(Some(Box::new(self)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_i32_widens() {
        assert_eq!(<i32 as FieldType>::COLUMN_TYPE, ColumnType::Integer);
        assert!(matches!(7i32.into_value(), Value::BigInt(Some(7))));
    }

    #[test]
    fn test_field_type_string() {
        assert_eq!(<String as FieldType>::COLUMN_TYPE, ColumnType::Text);
        assert!(matches!(
            "x".to_string().into_value(),
            Value::String(Some(ref s)) if s == "x"
        ));
    }
}
