//! HTTP handlers for listing endpoints
//!
//! Handlers are generic over the entity type; the URL query string is the
//! whole filter state, so every request is independent.

use axum::{
    Json,
    extract::{RawQuery, State},
    http::HeaderMap,
    response::Html,
};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::listing::ListingState;
use crate::core::error::{ListingError, ListingResult, RequestError};
use crate::core::param::ParamValue;
use crate::core::{
    FieldValue, FilterPatch, FilterState, Listable, Predicate, QueryResult, SortColumn,
    SortingState, search,
};
use crate::render::{FacetProps, ListingOptions, ListingProps, SearchProps, SortOption};

/// Header carrying the authenticated user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Message shown when the store failed and the page degrades to no results
pub const UNAVAILABLE_MESSAGE: &str = "Search is temporarily unavailable. No results to show.";

/// Read the authenticated user from the request headers
pub fn extract_user_id(headers: &HeaderMap) -> Result<Uuid, RequestError> {
    let value = headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| RequestError::MissingHeader {
            header: USER_ID_HEADER.to_string(),
        })?;

    let value = value.to_str().map_err(|e| RequestError::InvalidHeader {
        header: USER_ID_HEADER.to_string(),
        message: e.to_string(),
    })?;

    Uuid::parse_str(value.trim()).map_err(|e| RequestError::InvalidHeader {
        header: USER_ID_HEADER.to_string(),
        message: e.to_string(),
    })
}

async fn run_search<T: Listable>(
    state: &ListingState<T>,
    query: Option<String>,
    base: Option<Predicate>,
) -> ListingResult<QueryResult<T>> {
    let filters = state.schema.parse(query.as_deref().unwrap_or_default());
    search(state.store.as_ref(), &state.spec, &filters, base).await
}

/// `GET /{plural}`
pub async fn list_json<T>(
    State(state): State<ListingState<T>>,
    RawQuery(query): RawQuery,
) -> Result<Json<Value>, ListingError>
where
    T: Listable + Serialize,
{
    let result = run_search(&state, query, None).await?;
    Ok(Json(result.named(state.plural())?))
}

/// `GET /dashboard/{plural}`: the caller's own submissions
pub async fn dashboard_json<T>(
    State(state): State<ListingState<T>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<Json<Value>, ListingError>
where
    T: Listable + Serialize,
{
    let user_id = extract_user_id(&headers)?;
    let field = state
        .config
        .submitter_field
        .clone()
        .ok_or_else(|| ListingError::Internal("listing has no submitter field".to_string()))?;

    let base = Predicate::Equals {
        field,
        value: FieldValue::Uuid(user_id),
    };

    tracing::debug!(entity = state.plural(), user = %user_id, "Dashboard listing");

    let result = run_search(&state, query, Some(base)).await?;
    Ok(Json(result.named(state.plural())?))
}

/// `GET /{plural}/page`
///
/// A store failure degrades to the empty state instead of an error page.
pub async fn list_page<T>(
    State(state): State<ListingState<T>>,
    RawQuery(query): RawQuery,
) -> Result<Html<String>, ListingError>
where
    T: Listable + Serialize,
{
    let filters = state.schema.parse(query.as_deref().unwrap_or_default());

    let (result, empty_message) =
        match search(state.store.as_ref(), &state.spec, &filters, None).await {
            Ok(result) => (result, None),
            Err(ListingError::Storage(e)) => {
                tracing::error!(entity = state.plural(), error = %e, "Listing page degraded to no results");
                let empty = QueryResult {
                    items: Vec::new(),
                    total: 0,
                    page: filters.page(),
                    per_page: filters.per_page(state.spec.per_page),
                };
                (empty, Some(UNAVAILABLE_MESSAGE.to_string()))
            }
            Err(e) => return Err(e),
        };

    // Pagination links carry every filter except the page itself
    let base_query = state
        .schema
        .serialize(&state.schema.apply_patch(&filters, &FilterPatch::new()));

    let mut props =
        ListingProps::from_result(state.plural(), result, &state.page_path(), base_query);
    if let Some(message) = empty_message {
        props.list.empty_message = message;
    }
    props.search = Some(search_props(&state, &filters));
    props.options = ListingOptions {
        enable_sort: !state.config.sortable_fields.is_empty(),
        enable_filters: !state.config.facets.is_empty(),
    };

    Ok(Html(state.renderer.render(&props)?))
}

fn humanize(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn encode_sort<T: Listable>(state: &ListingState<T>, sort: SortingState) -> Option<String> {
    state
        .schema
        .get(&state.spec.sort_param)
        .and_then(|def| def.kind.encode(&ParamValue::Sort(sort)))
}

fn search_props<T: Listable>(state: &ListingState<T>, filters: &FilterState) -> SearchProps {
    let config = &state.config;

    let sort_options = config
        .sortable_fields
        .iter()
        .flat_map(|field| [SortColumn::asc(field.as_str()), SortColumn::desc(field.as_str())])
        .filter_map(|column| {
            let label = format!(
                "{} ({})",
                humanize(&column.id),
                if column.desc { "descending" } else { "ascending" }
            );
            encode_sort(state, SortingState::new(vec![column])).map(|v| SortOption::new(v, label))
        })
        .collect();

    let selected_sort = filters
        .sort(&state.spec.sort_param)
        .and_then(|sort| encode_sort(state, sort.clone()))
        .unwrap_or_default();

    let facets = config
        .facets
        .iter()
        .map(|facet| {
            let selected = filters.text(&facet.param).unwrap_or_default().to_string();
            let mut values = facet.values.clone();
            // A value from the URL stays selectable even when not configured
            if !values.is_empty() && !selected.is_empty() && !values.contains(&selected) {
                values.push(selected.clone());
            }
            FacetProps {
                param: facet.param.clone(),
                label: humanize(&facet.param),
                values,
                selected,
            }
        })
        .collect();

    SearchProps {
        value: filters.text(&config.query_param).unwrap_or_default().to_string(),
        sort_param: config.sort_param.clone(),
        sort_options,
        selected_sort,
        facets,
        ..SearchProps::new(config.query_param.as_str(), format!("Search {}", state.plural()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_user_id() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            extract_user_id(&headers),
            Err(RequestError::MissingHeader { .. })
        ));

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert!(matches!(
            extract_user_id(&headers),
            Err(RequestError::InvalidHeader { .. })
        ));

        let id = Uuid::new_v4();
        headers.insert(
            USER_ID_HEADER,
            HeaderValue::from_str(&id.to_string()).unwrap(),
        );
        assert_eq!(extract_user_id(&headers).unwrap(), id);
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("created_at"), "Created at");
        assert_eq!(humanize("name"), "Name");
        assert_eq!(humanize(""), "");
    }
}
