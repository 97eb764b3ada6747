//! Entities listed by the tools directory

use crate::impl_listable_entity;
use chrono::{DateTime, Utc};
use uuid::Uuid;

impl_listable_entity!(
    Tool,
    "tool",
    "tools",
    {
        tagline: String,
        category: String,
        tags: Vec<String>,
        country: Option<String>,
        submitter_id: Option<Uuid>,
        published_at: Option<DateTime<Utc>>,
    }
);

impl_listable_entity!(
    Category,
    "category",
    "categories",
    {
        order: i64,
    }
);

impl_listable_entity!(Tag, "tag", "tags", {});

impl_listable_entity!(
    Location,
    "location",
    "locations",
    {
        country: String,
    }
);

impl_listable_entity!(
    Shop,
    "shop",
    "shops",
    {
        country: String,
        city: String,
    }
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FieldValue, Listable, Predicate};

    fn tool() -> Tool {
        Tool::new(
            "Alpha Tool",
            "Does alpha things".to_string(),
            "ai".to_string(),
            vec!["cli".to_string(), "rust".to_string()],
            Some("FR".to_string()),
            None,
            None,
        )
    }

    #[test]
    fn test_generated_fields() {
        assert_eq!(Tool::resource_name(), "tools");
        assert_eq!(Tool::resource_name_singular(), "tool");
        assert!(Tool::has_field("published_at"));
        assert!(!Tool::has_field("password"));
        assert_eq!(Tag::fields(), &["id", "name", "slug", "created_at", "updated_at"]);
    }

    #[test]
    fn test_field_values() {
        let tool = tool();
        assert_eq!(tool.slug, "alpha-tool");
        assert_eq!(
            tool.field_value("category"),
            Some(FieldValue::String("ai".to_string()))
        );
        assert_eq!(tool.field_value("submitter_id"), Some(FieldValue::Null));
        assert_eq!(tool.field_value("unknown"), None);
    }

    #[test]
    fn test_tags_match_by_membership() {
        let tool = tool();
        assert!(Predicate::equals("tags", "rust").evaluate(&tool));
        assert!(!Predicate::equals("tags", "go").evaluate(&tool));
    }

    #[test]
    fn test_serde_round_trip() {
        let shop = Shop::new("Green Grocer", "FR".to_string(), "Lyon".to_string());
        let json = serde_json::to_value(&shop).unwrap();
        assert_eq!(json["city"], "Lyon");
        let back: Shop = serde_json::from_value(json).unwrap();
        assert_eq!(back, shop);
    }
}
