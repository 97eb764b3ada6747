//! HTTP tests for the listing routes

use anyhow::anyhow;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use listing::prelude::*;
use listing::server::{USER_ID_HEADER, UNAVAILABLE_MESSAGE};
use serde_json::Value;

fn tool(name: &str, category: &str, submitter: Option<Uuid>) -> Tool {
    Tool::new(
        name,
        format!("{} tagline", name),
        category.to_string(),
        Vec::new(),
        None,
        submitter,
        None,
    )
}

fn server_with(store: InMemoryListingStore<Tool>) -> TestServer {
    let app = ServerBuilder::new()
        .register_listing::<Tool>(store)
        .expect("tools listing registers")
        .register_listing::<Category>(InMemoryListingStore::with_records(vec![
            Category::new("Zeta", 1),
            Category::new("Eta", 2),
        ]))
        .expect("categories listing registers")
        .build()
        .expect("router builds");

    TestServer::try_new(app).expect("Failed to create test server")
}

fn user_header(id: Uuid) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static(USER_ID_HEADER),
        HeaderValue::from_str(&id.to_string()).unwrap(),
    )
}

#[tokio::test]
async fn test_health() {
    let server = server_with(InMemoryListingStore::new());

    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_json_listing_shape() {
    let server = server_with(InMemoryListingStore::with_records(vec![
        tool("Alpha", "ai", None),
        tool("Beta", "ai", None),
        tool("alpha-tool", "dev", None),
    ]));

    let response = server.get("/tools").add_query_param("q", "alpha").await;
    response.assert_status_ok();

    let body: Value = response.json();
    let names: Vec<&str> = body["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Alpha", "alpha-tool"]);
    assert_eq!(body["toolsTotal"], 2);
    assert_eq!(body["page"], 1);
    assert_eq!(body["perPage"], 24);
    assert_eq!(body["pageCount"], 1);
}

#[tokio::test]
async fn test_malformed_parameters_fall_back() {
    let server = server_with(InMemoryListingStore::with_records(vec![tool("Alpha", "ai", None)]));

    let response = server
        .get("/tools")
        .add_query_param("page", "banana")
        .add_query_param("sort", "password.desc")
        .add_query_param("perPage", "-3")
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["page"], 1);
    assert_eq!(body["perPage"], 24);
    assert_eq!(body["toolsTotal"], 1);
}

#[tokio::test]
async fn test_admin_json_sort() {
    let server = server_with(InMemoryListingStore::new());

    let response = server
        .get("/categories")
        .add_query_param("sort", r#"[{"id":"name","desc":false}]"#)
        .await;
    let body: Value = response.json();
    assert_eq!(body["categories"][0]["name"], "Eta");

    // Unknown column: default order by `order`
    let response = server
        .get("/categories")
        .add_query_param("sort", r#"[{"id":"secretField","desc":true}]"#)
        .await;
    let body: Value = response.json();
    assert_eq!(body["categories"][0]["name"], "Zeta");
    assert_eq!(body["perPage"], 25);
}

#[tokio::test]
async fn test_dashboard_requires_user() {
    let server = server_with(InMemoryListingStore::new());

    let response = server.get("/dashboard/tools").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .get("/dashboard/tools")
        .add_header(
            HeaderName::from_static(USER_ID_HEADER),
            HeaderValue::from_static("not-a-uuid"),
        )
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_dashboard_lists_own_submissions() {
    let me = Uuid::new_v4();
    let server = server_with(InMemoryListingStore::with_records(vec![
        tool("Alpha Mine", "ai", Some(me)),
        tool("Alpha Theirs", "ai", Some(Uuid::new_v4())),
        tool("Beta Mine", "dev", Some(me)),
    ]));

    let (name, value) = user_header(me);
    let response = server
        .get("/dashboard/tools")
        .add_header(name, value)
        .add_query_param("q", "alpha")
        .add_query_param("operator", "or")
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["toolsTotal"], 1);
    assert_eq!(body["tools"][0]["name"], "Alpha Mine");
}

#[tokio::test]
async fn test_dashboard_not_routed_without_submitter() {
    let server = server_with(InMemoryListingStore::new());
    let (name, value) = user_header(Uuid::new_v4());

    let response = server.get("/dashboard/categories").add_header(name, value).await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_html_page_renders_cards_and_pagination() {
    let records: Vec<Tool> = (1..=30)
        .map(|i| tool(&format!("Tool {:02}", i), "dev", None))
        .collect();
    let server = server_with(InMemoryListingStore::with_records(records));

    let response = server.get("/tools/page").add_query_param("page", "2").await;
    response.assert_status_ok();

    let html = response.text();
    assert!(html.contains(r#"data-entity="tools""#));
    assert!(html.contains("Tool 25"));
    assert!(!html.contains("Tool 24"));
    assert!(html.contains("2 / 2"));
    assert!(html.contains("pagination-next"));
    assert!(html.contains(r#"aria-disabled="true""#));
}

#[tokio::test]
async fn test_html_page_empty_state() {
    let server = server_with(InMemoryListingStore::new());

    let response = server.get("/tools/page").add_query_param("q", "nothing").await;
    response.assert_status_ok();

    let html = response.text();
    assert!(html.contains("listing-empty"));
    assert!(html.contains("No results found."));
    assert!(!html.contains("class=\"pagination"));
}

#[tokio::test]
async fn test_html_page_offers_configured_facet_values() {
    let server = server_with(InMemoryListingStore::with_records(vec![tool("Alpha", "ai", None)]));

    let response = server.get("/tools/page").add_query_param("category", "ai").await;
    response.assert_status_ok();

    let html = response.text();
    assert!(html.contains(r#"<option value="design">design</option>"#));
    assert!(html.contains(r#"<option value="ai" selected>ai</option>"#));
    assert!(html.contains(r#"<option value="US">US</option>"#));
    // No configured values: free text
    assert!(html.contains(r#"<input type="text" name="tag""#));
}

#[tokio::test]
async fn test_html_page_keeps_unlisted_facet_value() {
    let server = server_with(InMemoryListingStore::new());

    let response = server
        .get("/tools/page")
        .add_query_param("category", "robotics")
        .await;

    let html = response.text();
    assert!(html.contains(r#"<option value="robotics" selected>robotics</option>"#));
}

struct BrokenStore;

#[async_trait]
impl ListingStore<Tool> for BrokenStore {
    async fn fetch_page(&self, _query: &ListingQuery) -> anyhow::Result<Page<Tool>> {
        Err(anyhow!("connection refused"))
    }
}

#[tokio::test]
async fn test_store_failure_degrades_page_but_not_json() {
    let app = ServerBuilder::new()
        .register_listing::<Tool>(BrokenStore)
        .unwrap()
        .build()
        .unwrap();
    let server = TestServer::try_new(app).expect("Failed to create test server");

    let page = server.get("/tools/page").await;
    page.assert_status_ok();
    assert!(page.text().contains(UNAVAILABLE_MESSAGE));

    let json = server.get("/tools").await;
    json.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = json.json();
    assert!(!body.to_string().contains("connection refused"));
}
