//! Tools directory example
//!
//! This example demonstrates:
//! - Seeding in-memory stores for the directory entities
//! - Overlaying a YAML configuration on the default listings
//! - Serving JSON listings, HTML listing pages and a user dashboard

use chrono::{Duration, TimeZone};
use listing::prelude::*;

const OVERLAY: &str = r#"
debounce_ms: 300
entities:
  - entity: shops
    per_page: 6
    facets:
      - param: country
        values: [DE, FR, IT]
      - param: city
    letter_field: name
"#;

fn tool(name: &str, tagline: &str, category: &str, tags: &[&str], country: &str) -> Tool {
    Tool::new(
        name,
        tagline.to_string(),
        category.to_string(),
        tags.iter().map(|t| t.to_string()).collect(),
        Some(country.to_string()),
        None,
        None,
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "listing=debug,tower_http=info".into()),
        )
        .init();

    println!("Tools Directory Example");
    println!("=======================\n");

    let submitter = Uuid::new_v4();
    let launch = Utc
        .with_ymd_and_hms(2024, 1, 15, 9, 0, 0)
        .single()
        .ok_or_else(|| anyhow::anyhow!("invalid launch date"))?;

    let mut tools = vec![
        tool("Alpha", "Vector search in a box", "ai", &["search", "rust"], "FR"),
        tool("alpha-tool", "Alpha channel editor", "design", &["images"], "DE"),
        tool("Beta", "Feature flags", "dev", &["cli"], "US"),
        tool("Cargo Watch", "Rebuild on change", "dev", &["rust", "cli"], "FR"),
        tool("3D Forge", "Mesh repair", "design", &["3d"], "JP"),
    ];
    for (i, tool) in tools.iter_mut().enumerate() {
        tool.published_at = Some(launch + Duration::days(i as i64 * 10));
        if i % 2 == 0 {
            tool.submitter_id = Some(submitter);
        }
    }

    let categories = ["AI", "Design", "Developer Tools"]
        .iter()
        .enumerate()
        .map(|(order, name)| Category::new(*name, order as i64));

    let shops = vec![
        Shop::new("Green Grocer", "FR".to_string(), "Lyon".to_string()),
        Shop::new("Bakery 21", "FR".to_string(), "Paris".to_string()),
        Shop::new("Deli", "DE".to_string(), "Berlin".to_string()),
    ];

    let overlay = ListingConfig::from_yaml_str(OVERLAY)?;

    println!("Endpoints:");
    println!("   GET /tools                 - JSON listing (?q=&category=&tag=&letter=&sort=&page=)");
    println!("   GET /tools/page            - HTML listing page");
    println!("   GET /dashboard/tools       - Own submissions (x-user-id header)");
    println!("   GET /categories            - Admin listing (?sort=[{{\"id\":\"order\",\"desc\":true}}])");
    println!("   GET /shops/page            - HTML shop listing");
    println!();
    println!("Example requests:");
    println!("   curl 'http://127.0.0.1:3000/tools?q=alpha'");
    println!(
        "   curl -H 'x-user-id: {}' http://127.0.0.1:3000/dashboard/tools",
        submitter
    );
    println!();

    ServerBuilder::new()
        .with_config(ListingConfig::default_config())
        .with_config(overlay)
        .register_listing::<Tool>(InMemoryListingStore::with_records(tools))?
        .register_listing::<Category>(InMemoryListingStore::with_records(categories))?
        .register_listing::<Tag>(InMemoryListingStore::with_records(vec![
            Tag::new("rust"),
            Tag::new("cli"),
            Tag::new("3d"),
        ]))?
        .register_listing::<Shop>(InMemoryListingStore::with_records(shops))?
        .serve("127.0.0.1:3000")
        .await?;

    Ok(())
}
