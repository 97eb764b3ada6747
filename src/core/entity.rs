//! Entity trait defining what the listing pipeline needs from a record

use crate::core::field::FieldValue;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Base trait for every entity that can appear on a listing page.
///
/// All listable entities have:
/// - id: Unique identifier
/// - name: Human-readable name (default search and sort key)
/// - created_at: Creation timestamp (pagination tiebreaker)
/// - a closed set of named fields reachable through `field_value`
pub trait Listable: Clone + Send + Sync + 'static {
    /// The plural resource name used in URLs (e.g., "tools", "categories")
    fn resource_name() -> &'static str;

    /// The singular resource name (e.g., "tool", "category")
    fn resource_name_singular() -> &'static str;

    /// Every field name `field_value` answers for.
    ///
    /// This is the allowed key set for sorting and filtering; nothing outside
    /// it ever reaches a store.
    fn fields() -> &'static [&'static str];

    /// Get the unique identifier for this entity instance
    fn id(&self) -> Uuid;

    /// Get the name of this entity
    fn name(&self) -> &str;

    /// Get the creation timestamp
    fn created_at(&self) -> DateTime<Utc>;

    /// Get the value of a specific field by name
    fn field_value(&self, field: &str) -> Option<FieldValue>;

    /// Check whether a field name belongs to this entity
    fn has_field(field: &str) -> bool {
        Self::fields().contains(&field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    struct TestEntity {
        id: Uuid,
        name: String,
        created_at: DateTime<Utc>,
    }

    impl Listable for TestEntity {
        fn resource_name() -> &'static str {
            "test_entities"
        }

        fn resource_name_singular() -> &'static str {
            "test_entity"
        }

        fn fields() -> &'static [&'static str] {
            &["id", "name", "created_at"]
        }

        fn id(&self) -> Uuid {
            self.id
        }

        fn name(&self) -> &str {
            &self.name
        }

        fn created_at(&self) -> DateTime<Utc> {
            self.created_at
        }

        fn field_value(&self, field: &str) -> Option<FieldValue> {
            match field {
                "id" => Some(FieldValue::from(&self.id)),
                "name" => Some(FieldValue::from(&self.name)),
                "created_at" => Some(FieldValue::from(&self.created_at)),
                _ => None,
            }
        }
    }

    #[test]
    fn test_has_field() {
        assert!(TestEntity::has_field("name"));
        assert!(!TestEntity::has_field("password_hash"));
    }

    #[test]
    fn test_field_value_lookup() {
        let entity = TestEntity {
            id: Uuid::new_v4(),
            name: "Alpha".to_string(),
            created_at: Utc::now(),
        };
        assert_eq!(entity.field_value("name"), Some(FieldValue::from("Alpha")));
        assert_eq!(entity.field_value("unknown"), None);
    }
}
