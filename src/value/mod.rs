//! Value helpers shared by hydration and entity conversion
//!
//! - **`Attr`** - tri-state field wrapper (unset / null / set)
//! - **`FieldType`** - maps Rust field types to declared column types
//! - **`TryGetable`** - safe extraction from `sea_query::Value`

pub mod attr;
pub mod try_getable;
pub mod types;

pub use attr::Attr;
pub use try_getable::{TryGetable, ValueExtractionError};
pub use types::FieldType;

use sea_query::Value;

/// Check whether a `sea_query::Value` is one of the typed NULL variants
pub fn is_null(value: &Value) -> bool {
    matches!(
        value,
        Value::Bool(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::TinyUnsigned(None)
            | Value::SmallUnsigned(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::Float(None)
            | Value::Double(None)
            | Value::String(None)
            | Value::Char(None)
            | Value::Bytes(None)
            | Value::Json(None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_null() {
        assert!(is_null(&Value::BigInt(None)));
        assert!(is_null(&Value::String(None)));
        assert!(!is_null(&Value::BigInt(Some(0))));
        assert!(!is_null(&Value::String(Some(String::new()))));
    }
}
