//! Macros for reducing boilerplate when defining listable entities
//!
//! These macros generate the struct and the `Listable` implementation
//! needed for each directory entity.

/// Complete macro to create a listable entity
///
/// Every generated struct carries the base fields `id`, `name`, `slug`,
/// `created_at` and `updated_at` followed by the specific fields. Each
/// specific field type must convert into a `FieldValue` by reference.
///
/// # Example
///
/// ```rust,ignore
/// use listing::prelude::*;
///
/// impl_listable_entity!(
///     Shop,
///     "shop",
///     "shops",
///     {
///         country: String,
///         city: String,
///     }
/// );
///
/// let shop = Shop::new("Green Grocer", "FR".to_string(), "Lyon".to_string());
/// assert_eq!(shop.slug, "green-grocer");
/// ```
#[macro_export]
macro_rules! impl_listable_entity {
    (
        $type:ident,
        $singular:expr,
        $plural:expr,
        {
            $( $specific_field:ident : $specific_type:ty ),* $(,)?
        }
    ) => {
        #[derive(Debug, Clone, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $type {
            /// Unique identifier for this entity
            pub id: ::uuid::Uuid,

            /// Display name
            pub name: String,

            /// URL-safe name
            pub slug: String,

            /// When this entity was created
            pub created_at: ::chrono::DateTime<::chrono::Utc>,

            /// When this entity was last updated
            pub updated_at: ::chrono::DateTime<::chrono::Utc>,

            $( pub $specific_field : $specific_type ),*
        }

        impl $crate::core::entity::Listable for $type {
            fn resource_name() -> &'static str {
                $plural
            }

            fn resource_name_singular() -> &'static str {
                $singular
            }

            fn fields() -> &'static [&'static str] {
                &[
                    "id",
                    "name",
                    "slug",
                    "created_at",
                    "updated_at",
                    $( stringify!($specific_field) ),*
                ]
            }

            fn id(&self) -> ::uuid::Uuid {
                self.id
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn created_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.created_at
            }

            fn field_value(&self, field: &str) -> Option<$crate::core::field::FieldValue> {
                use $crate::core::field::FieldValue;
                match field {
                    "id" => Some(FieldValue::from(&self.id)),
                    "name" => Some(FieldValue::from(&self.name)),
                    "slug" => Some(FieldValue::from(&self.slug)),
                    "created_at" => Some(FieldValue::from(&self.created_at)),
                    "updated_at" => Some(FieldValue::from(&self.updated_at)),
                    $( stringify!($specific_field) => Some(FieldValue::from(&self.$specific_field)), )*
                    _ => None,
                }
            }
        }

        impl $type {
            /// Create a new instance; the slug is derived from the name
            pub fn new(
                name: impl Into<String>,
                $( $specific_field: $specific_type ),*
            ) -> Self {
                let name = name.into();
                let now = ::chrono::Utc::now();
                Self {
                    id: ::uuid::Uuid::new_v4(),
                    slug: $crate::entities::slugify(&name),
                    name,
                    created_at: now,
                    updated_at: now,
                    $( $specific_field ),*
                }
            }

            /// Set the creation timestamp (imports, fixtures)
            pub fn created(mut self, at: ::chrono::DateTime<::chrono::Utc>) -> Self {
                self.created_at = at;
                self.updated_at = at;
                self
            }

            /// Update the updated_at timestamp to now
            pub fn touch(&mut self) {
                self.updated_at = ::chrono::Utc::now();
            }
        }
    };
}
