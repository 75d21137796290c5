/// Declare an entity struct of [`Attr`](crate::Attr) fields together with its schema.
///
/// Every field becomes a `pub Attr<T>` and a column named after the field.
/// Column options are `ColumnDef` builder calls in braces after the type:
/// `name("col")`, `select(false)`, `nullable()`, `primary_key()`,
/// `generated()`, `column_type(ColumnType::Json)`.
///
/// An extension entity names its base after `extends`, declares its own
/// columns (new properties or overrides of base properties) in the first
/// block, and lists the base properties it also wants as struct fields under
/// `inherits`. Extensions are registered as non-synchronizing.
///
/// # Example
/// ```
/// use driftwood::{entity, Entity};
///
/// entity! {
///     #[derive(Debug, Default)]
///     pub struct Post in "post" {
///         id: i64 { primary_key() },
///         title: String,
///         description: String,
///         category_id: i64,
///     }
/// }
///
/// entity! {
///     #[derive(Debug, Default)]
///     pub struct PostEx in "post" extends Post {
///         category_name: String { select(false) },
///         description: String { name("category_description"), select(false) },
///     } inherits {
///         id: i64,
///         title: String,
///         category_id: i64,
///     }
/// }
///
/// let schema = PostEx::schema();
/// assert_eq!(schema.extends.as_deref(), Some("Post"));
/// assert!(!schema.synchronize);
/// ```
#[macro_export]
macro_rules! entity {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident in $table:literal extends $base:ty {
            $($field:ident : $ty:ty $({ $($m:ident($($arg:expr),*)),* $(,)? })?),* $(,)?
        } inherits {
            $($ifield:ident : $ity:ty),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(pub $field: $crate::Attr<$ty>,)*
            $(pub $ifield: $crate::Attr<$ity>,)*
        }

        impl $crate::Entity for $name {
            const NAME: &'static str = stringify!($name);

            fn schema() -> $crate::EntitySchema {
                $crate::EntitySchema::new(Self::NAME, $table)
                    .extends(<$base as $crate::Entity>::NAME)
                    $(.column(
                        $crate::ColumnDef::new(
                            stringify!($field),
                            <$ty as $crate::FieldType>::COLUMN_TYPE,
                        )
                        $($(.$m($($arg),*))*)?
                    ))*
            }

            fn from_model(model: &$crate::Model) -> $crate::Result<Self> {
                Ok(Self {
                    $($field: model.attr::<$ty>(stringify!($field))?,)*
                    $($ifield: model.attr::<$ity>(stringify!($ifield))?,)*
                })
            }

            fn into_model(self) -> $crate::Model {
                let mut model = $crate::Model::new(Self::NAME);
                $(model.set_attr(stringify!($field), self.$field);)*
                $(model.set_attr(stringify!($ifield), self.$ifield);)*
                model
            }
        }
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident in $table:literal {
            $($field:ident : $ty:ty $({ $($m:ident($($arg:expr),*)),* $(,)? })?),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(pub $field: $crate::Attr<$ty>,)*
        }

        impl $crate::Entity for $name {
            const NAME: &'static str = stringify!($name);

            fn schema() -> $crate::EntitySchema {
                $crate::EntitySchema::new(Self::NAME, $table)
                    $(.column(
                        $crate::ColumnDef::new(
                            stringify!($field),
                            <$ty as $crate::FieldType>::COLUMN_TYPE,
                        )
                        $($(.$m($($arg),*))*)?
                    ))*
            }

            fn from_model(model: &$crate::Model) -> $crate::Result<Self> {
                Ok(Self {
                    $($field: model.attr::<$ty>(stringify!($field))?,)*
                })
            }

            fn into_model(self) -> $crate::Model {
                let mut model = $crate::Model::new(Self::NAME);
                $(model.set_attr(stringify!($field), self.$field);)*
                model
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{Attr, ColumnType, Entity, EntityDescriptor};

    entity! {
        #[derive(Debug, Default, PartialEq)]
        struct Category in "category" {
            id: i64 { generated() },
            name: String,
            meta: serde_json::Value { nullable() },
        }
    }

    entity! {
        #[derive(Debug, Default)]
        struct CategoryLabel in "category" extends Category {
            name: String { name("label"), select(false) },
        } inherits {
            id: i64,
        }
    }

    #[test]
    fn test_entity_schema_from_macro() {
        let schema = Category::schema();
        assert_eq!(schema.name, "Category");
        assert_eq!(schema.table, "category");
        assert!(schema.synchronize);

        let descriptor = EntityDescriptor::from_schema(schema).unwrap();
        assert_eq!(descriptor.primary_key(), ["id".to_string()]);
        let meta = descriptor.column("meta").unwrap();
        assert_eq!(meta.column_type, ColumnType::Json);
        assert!(meta.nullable);
    }

    #[test]
    fn test_entity_model_conversion() {
        let category = Category {
            id: Attr::Set(3),
            name: Attr::Set("News".to_string()),
            meta: Attr::Null,
        };
        let model = category.into_model();
        assert_eq!(model.len(), 3);
        assert!(model.is_null("meta"));

        let back = Category::from_model(&model).unwrap();
        assert_eq!(back.id, Attr::Set(3));
        assert_eq!(back.meta, Attr::Null);
    }

    #[test]
    fn test_extension_macro_overrides_column() {
        let base = EntityDescriptor::from_schema(Category::schema()).unwrap();
        let ext = EntityDescriptor::overlay(&base, CategoryLabel::schema()).unwrap();

        let name = ext.column("name").unwrap();
        assert_eq!(name.column, "label");
        assert!(!name.select);
        assert!(!ext.synchronize());
        assert_eq!(base.column("name").unwrap().column, "name");

        let label = CategoryLabel::default();
        assert!(label.name.is_unset());
        assert!(label.id.is_unset());
    }
}
