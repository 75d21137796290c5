//! `TryGetable` for safe value extraction
//!
//! Hydrated models store `sea_query::Value`s that have already been coerced to
//! the column's declared type. `TryGetable` turns them back into Rust values
//! with type checking, keeping NULL distinct from a type mismatch.

use sea_query::Value;

use super::is_null;

/// Error type for value extraction failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueExtractionError {
    /// The value is null (None variant)
    NullValue,
    /// The value type doesn't match the expected type
    TypeMismatch {
        expected: String,
        actual: String,
    },
    /// Value conversion failed (e.g., overflow, invalid format)
    ConversionError(String),
}

impl std::fmt::Display for ValueExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueExtractionError::NullValue => write!(f, "Value is null"),
            ValueExtractionError::TypeMismatch { expected, actual } => {
                write!(f, "Type mismatch: expected {}, got {}", expected, actual)
            }
            ValueExtractionError::ConversionError(msg) => {
                write!(f, "Conversion error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ValueExtractionError {}

/// Trait for safe value extraction with error handling
///
/// ```
/// use driftwood::{TryGetable, ValueExtractionError};
/// use sea_query::Value;
///
/// let value = Value::BigInt(Some(42));
/// assert_eq!(i64::try_get(value), Ok(42));
///
/// let null_value = Value::BigInt(None);
/// assert!(matches!(i64::try_get(null_value), Err(ValueExtractionError::NullValue)));
/// ```
pub trait TryGetable: Sized {
    /// Try to extract a value from `sea_query::Value`.
    fn try_get(value: Value) -> Result<Self, ValueExtractionError>;
}

fn mismatch(expected: &str, value: &Value) -> ValueExtractionError {
    if is_null(value) {
        ValueExtractionError::NullValue
    } else {
        ValueExtractionError::TypeMismatch {
            expected: expected.to_string(),
            actual: format!("{:?}", value),
        }
    }
}

impl TryGetable for i64 {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::BigInt(Some(v)) => Ok(v),
            Value::Int(Some(v)) => Ok(i64::from(v)),
            Value::SmallInt(Some(v)) => Ok(i64::from(v)),
            Value::TinyInt(Some(v)) => Ok(i64::from(v)),
            Value::Unsigned(Some(v)) => Ok(i64::from(v)),
            Value::BigUnsigned(Some(v)) => i64::try_from(v).map_err(|_| {
                ValueExtractionError::ConversionError(format!("{} exceeds i64::MAX", v))
            }),
            other => Err(mismatch("BigInt", &other)),
        }
    }
}

impl TryGetable for i32 {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        let wide = i64::try_get(value)?;
        i32::try_from(wide).map_err(|_| {
            ValueExtractionError::ConversionError(format!("{} does not fit in i32", wide))
        })
    }
}

impl TryGetable for f64 {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Double(Some(v)) => Ok(v),
            Value::Float(Some(v)) => Ok(f64::from(v)),
            other => Err(mismatch("Double", &other)),
        }
    }
}

impl TryGetable for bool {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Bool(Some(v)) => Ok(v),
            other => Err(mismatch("Bool", &other)),
        }
    }
}

impl TryGetable for String {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::String(Some(v)) => Ok(v),
            Value::Char(Some(c)) => Ok(c.to_string()),
            other => Err(mismatch("String", &other)),
        }
    }
}

impl TryGetable for Vec<u8> {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Bytes(Some(v)) => Ok(v),
            other => Err(mismatch("Bytes", &other)),
        }
    }
}

impl TryGetable for serde_json::Value {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Json(Some(v)) => Ok(*v),
            Value::String(Some(s)) => serde_json::from_str(&s)
                .map_err(|e| ValueExtractionError::ConversionError(e.to_string())),
            other => Err(mismatch("Json", &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_get_widens_integers() {
        assert_eq!(i64::try_get(Value::Int(Some(5))), Ok(5));
        assert_eq!(i32::try_get(Value::BigInt(Some(5))), Ok(5));
    }

    #[test]
    fn test_try_get_i32_overflow() {
        let result = i32::try_get(Value::BigInt(Some(i64::MAX)));
        assert!(matches!(result, Err(ValueExtractionError::ConversionError(_))));
    }

    #[test]
    fn test_try_get_null_vs_mismatch() {
        assert_eq!(
            String::try_get(Value::String(None)),
            Err(ValueExtractionError::NullValue)
        );
        assert!(matches!(
            String::try_get(Value::BigInt(Some(1))),
            Err(ValueExtractionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_try_get_json_from_text() {
        let json = serde_json::Value::try_get(Value::String(Some("{\"a\":1}".to_string())))
            .unwrap();
        assert_eq!(json["a"], 1);
    }
}
