//! Integration tests for parameter schemas and the URL state serializer

use chrono::NaiveDate;
use listing::prelude::*;

fn tools_schema() -> FilterSchema {
    ListingConfig::default_config()
        .entity("tools")
        .unwrap()
        .schema()
        .unwrap()
}

fn categories_schema() -> FilterSchema {
    ListingConfig::default_config()
        .entity("categories")
        .unwrap()
        .schema()
        .unwrap()
}

fn sample_states(schema: &FilterSchema) -> Vec<FilterState> {
    let defaults = schema.defaults();
    let patches = vec![
        FilterPatch::new(),
        FilterPatch::new().set("q", ParamValue::text("alpha tool")),
        FilterPatch::new().set("q", ParamValue::text("a&b=c?d#e%f")),
        FilterPatch::new()
            .set("q", ParamValue::text("ünïcödé"))
            .set("operator", ParamValue::text("or")),
        FilterPatch::new().set(
            "from",
            ParamValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29)),
        ),
        FilterPatch::new().set(
            "sort",
            ParamValue::Sort(SortingState::new(vec![
                SortColumn::desc("created_at"),
                SortColumn::asc("name"),
            ])),
        ),
        FilterPatch::new().set(PER_PAGE_PARAM, ParamValue::Integer(50)),
    ];

    let mut states: Vec<FilterState> = patches
        .iter()
        .map(|patch| schema.apply_patch(&defaults, patch))
        .collect();

    // A state on a later page
    states.push(schema.parse("q=beta&page=7"));
    states
}

// =============================================================================
// parse(serialize(s)) == s
// =============================================================================

#[test]
fn test_round_trip_public_schema() {
    let schema = tools_schema();
    for state in sample_states(&schema) {
        let query = schema.serialize(&state);
        assert_eq!(schema.parse(&query), state, "round trip of {:?}", query);
    }
}

#[test]
fn test_round_trip_admin_schema() {
    let schema = categories_schema();
    for state in sample_states(&schema) {
        let query = schema.serialize(&state);
        assert_eq!(schema.parse(&query), state, "round trip of {:?}", query);
    }
}

#[test]
fn test_round_trip_with_leading_question_mark() {
    let schema = tools_schema();
    let state = schema.parse("q=alpha&category=ai&page=2");
    let query = format!("?{}", schema.serialize(&state));
    assert_eq!(schema.parse(&query), state);
}

// =============================================================================
// Defaults never reach the query string
// =============================================================================

#[test]
fn test_defaults_serialize_to_empty_query() {
    for schema in [tools_schema(), categories_schema()] {
        assert_eq!(schema.serialize(&schema.defaults()), "");
    }
}

#[test]
fn test_default_valued_keys_are_omitted() {
    let schema = tools_schema();
    let state = schema.parse("q=alpha&page=1&perPage=24&operator=and&sort=name.asc");
    assert_eq!(schema.serialize(&state), "q=alpha");
}

#[test]
fn test_serialized_keys_differ_from_default() {
    let schema = tools_schema();
    for state in sample_states(&schema) {
        let query = schema.serialize(&state);
        let parsed = schema.parse(&query);
        for name in schema.names() {
            let key = format!("{}=", name);
            if query.split('&').any(|pair| pair.starts_with(&key)) {
                assert!(!schema.is_default(&parsed, &exclude_all_but(&schema, name)));
            }
        }
    }
}

fn exclude_all_but<'a>(schema: &'a FilterSchema, keep: &str) -> Vec<&'a str> {
    schema.names().filter(|n| *n != keep).collect()
}

// =============================================================================
// Malformed or missing values fall back to defaults
// =============================================================================

#[test]
fn test_malformed_values_use_defaults() {
    let schema = tools_schema();
    let defaults = schema.defaults();

    for raw in [
        "page=abc",
        "page=-1",
        "page=0",
        "page=1e3",
        "perPage=100000",
        "perPage=",
        "operator=xor",
        "from=2024-13-45",
        "to=yesterday",
        "sort=name.sideways",
        "sort=%5B%7B%22id%22",
        "page",
        "&&==&",
    ] {
        assert_eq!(schema.parse(raw), defaults, "parsing {:?}", raw);
    }
}

#[test]
fn test_unknown_parameters_are_ignored() {
    let schema = tools_schema();
    let state = schema.parse("utm_source=newsletter&q=alpha&debug=1");
    assert_eq!(state.text("q"), Some("alpha"));
    assert!(state.get("utm_source").is_none());
    assert_eq!(schema.serialize(&state), "q=alpha");
}

#[test]
fn test_empty_query() {
    let schema = categories_schema();
    assert_eq!(schema.parse(""), schema.defaults());
    assert_eq!(schema.parse("?"), schema.defaults());
}

// =============================================================================
// Sort key safety
// =============================================================================

#[test]
fn test_unknown_sort_column_drops_whole_sort() {
    let schema = tools_schema();
    let defaults = schema.defaults();

    for raw in [
        "sort=password.desc",
        "sort=name.asc,password.desc",
        "sort=name.asc;DROP TABLE entities",
    ] {
        let state = schema.parse(raw);
        assert_eq!(state.sort("sort"), defaults.sort("sort"), "parsing {:?}", raw);
    }
}

#[test]
fn test_known_sort_columns_are_kept() {
    let schema = tools_schema();
    let state = schema.parse("sort=published_at.desc,name.asc");
    assert_eq!(
        state.sort("sort").unwrap().columns(),
        &[SortColumn::desc("published_at"), SortColumn::asc("name")]
    );
}

// =============================================================================
// Admin sort on a non-existent column
// =============================================================================

#[test]
fn test_admin_sort_on_secret_field_falls_back() {
    let schema = categories_schema();
    let state = schema.parse(r#"sort=[{"id":"secretField","desc":true}]"#);

    assert_eq!(
        state.sort("sort").unwrap(),
        &SortingState::new(vec![SortColumn::asc("order")])
    );
}

#[test]
fn test_admin_sort_malformed_json_falls_back() {
    let schema = categories_schema();
    let state = schema.parse(r#"sort=[{"id":"name","desc":tru"#);
    assert_eq!(state, schema.defaults());
}

// =============================================================================
// Equality rules
// =============================================================================

#[test]
fn test_sort_equality_is_element_wise() {
    let schema = categories_schema();
    let reordered = schema.parse(r#"sort=[{"id":"name","desc":false},{"id":"order","desc":false}]"#);
    let same = schema.parse(r#"sort=[{"id":"order","desc":false}]"#);

    assert!(!schema.is_default(&reordered, &[]));
    assert!(schema.is_default(&same, &[]));
}

#[test]
fn test_is_default_honours_exclusions() {
    let schema = tools_schema();
    let state = schema.parse("page=4");
    assert!(!schema.is_default(&state, &[]));
    assert!(schema.is_default(&state, &[PAGE_PARAM]));
}
