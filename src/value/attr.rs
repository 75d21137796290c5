//! `Attr` tri-state wrapper for entity fields.
//!
//! A hydrated entity has to tell apart three situations for every property:
//! the property was never selected, it was selected and came back NULL, or it
//! was selected and carries a value. `Attr<T>` encodes exactly that.

/// Field value with selection metadata
///
/// # Example
///
/// ```
/// use driftwood::Attr;
///
/// let title: Attr<String> = Attr::Set("Post".to_string());
/// assert_eq!(title.value(), Some(&"Post".to_string()));
///
/// let missing: Attr<String> = Attr::Unset;
/// assert!(missing.is_unset());
/// assert!(!Attr::<i64>::Null.is_unset());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Attr<T> {
    /// Property was not selected (observably undefined)
    Unset,
    /// Property was selected but holds SQL NULL
    Null,
    /// Property was selected and has a value
    Set(T),
}

impl<T> Attr<T> {
    /// Build an attribute from a nullable value: `None` becomes `Null`
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Attr::Set(v),
            None => Attr::Null,
        }
    }

    /// Check if the property was never populated
    #[must_use]
    pub fn is_unset(&self) -> bool {
        matches!(self, Attr::Unset)
    }

    /// Check if the property was populated with NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Attr::Null)
    }

    /// Check if the property holds a value
    #[must_use]
    pub fn is_set(&self) -> bool {
        matches!(self, Attr::Set(_))
    }

    /// Borrow the value if one is set
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Attr::Set(v) => Some(v),
            Attr::Null | Attr::Unset => None,
        }
    }

    /// Consume the attribute, returning the value if one is set
    #[must_use]
    pub fn into_value(self) -> Option<T> {
        match self {
            Attr::Set(v) => Some(v),
            Attr::Null | Attr::Unset => None,
        }
    }

    /// `None` when unset, `Some(None)` when null, `Some(Some(v))` when set
    #[must_use]
    pub fn into_option(self) -> Option<Option<T>> {
        match self {
            Attr::Unset => None,
            Attr::Null => Some(None),
            Attr::Set(v) => Some(Some(v)),
        }
    }

    pub fn as_ref(&self) -> Attr<&T> {
        match self {
            Attr::Unset => Attr::Unset,
            Attr::Null => Attr::Null,
            Attr::Set(v) => Attr::Set(v),
        }
    }
}

impl<T> Default for Attr<T> {
    fn default() -> Self {
        Attr::Unset
    }
}

impl<T> From<T> for Attr<T> {
    fn from(value: T) -> Self {
        Attr::Set(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_default_is_unset() {
        let attr: Attr<i64> = Attr::default();
        assert!(attr.is_unset());
        assert_eq!(attr.into_option(), None);
    }

    #[test]
    fn test_attr_null_is_not_unset() {
        let attr: Attr<String> = Attr::from_option(None);
        assert!(attr.is_null());
        assert!(!attr.is_unset());
        assert_eq!(attr.into_option(), Some(None));
    }

    #[test]
    fn test_attr_set_value() {
        let attr = Attr::from(7_i64);
        assert!(attr.is_set());
        assert_eq!(attr.value(), Some(&7));
        assert_eq!(attr.as_ref(), Attr::Set(&7));
        assert_eq!(attr.into_value(), Some(7));
    }
}
