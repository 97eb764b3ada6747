//! Filter state, query results and pagination utilities

use crate::core::param::{PAGE_PARAM, PER_PAGE_PARAM, ParamValue};
use crate::core::sorting::SortingState;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// Current value of every parameter of a listing.
///
/// Built by [`FilterSchema::parse`](crate::core::param::FilterSchema::parse)
/// or [`FilterSchema::defaults`](crate::core::param::FilterSchema::defaults),
/// so it is always fully populated. It is replaced as a whole on every
/// change; the URL is its only persistent form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterState {
    values: IndexMap<String, ParamValue>,
}

impl FilterState {
    pub(crate) fn from_map(values: IndexMap<String, ParamValue>) -> Self {
        Self { values }
    }

    pub(crate) fn set(&mut self, name: &str, value: ParamValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_text)
    }

    /// Text value, `None` when absent or blank
    pub fn non_empty_text(&self, name: &str) -> Option<&str> {
        self.text(name).map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ParamValue::as_integer)
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        self.get(name).and_then(ParamValue::as_date)
    }

    pub fn sort(&self, name: &str) -> Option<&SortingState> {
        self.get(name).and_then(ParamValue::as_sort)
    }

    /// Current page (1-based)
    pub fn page(&self) -> usize {
        self.integer(PAGE_PARAM)
            .and_then(|p| usize::try_from(p).ok())
            .unwrap_or(1)
            .max(1)
    }

    /// Page size
    pub fn per_page(&self, fallback: usize) -> usize {
        self.integer(PER_PAGE_PARAM)
            .and_then(|p| usize::try_from(p).ok())
            .unwrap_or(fallback)
            .max(1)
    }
}

/// Partial update of a filter state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPatch {
    values: IndexMap<String, ParamValue>,
}

impl FilterPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: &str, value: ParamValue) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of a paginated search
///
/// Invariants: `items.len() <= per_page`, `total >= items.len()`, `page >= 1`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult<T> {
    /// The items of the requested page
    pub items: Vec<T>,

    /// Total number of items matching the filters (ignoring pagination)
    pub total: usize,

    /// Requested page (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub per_page: usize,
}

impl<T> QueryResult<T> {
    /// Number of pages, `ceil(total / per_page)`
    pub fn page_count(&self) -> usize {
        self.total.div_ceil(self.per_page.max(1))
    }

    /// Pagination metadata for this result
    pub fn pagination(&self) -> PaginationMeta {
        PaginationMeta::new(self.page, self.per_page, self.total)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> QueryResult<U> {
        QueryResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

impl<T: Serialize> QueryResult<T> {
    /// Entity-specific JSON shape
    ///
    /// `named("categories")` yields
    /// `{"categories": [...], "categoriesTotal": N, "page": P, "perPage": S, "pageCount": C}`.
    pub fn named(&self, plural: &str) -> serde_json::Result<Value> {
        let mut body = Map::new();
        body.insert(plural.to_string(), serde_json::to_value(&self.items)?);
        body.insert(format!("{}Total", plural), Value::from(self.total));
        body.insert("page".to_string(), Value::from(self.page));
        body.insert("perPage".to_string(), Value::from(self.per_page));
        body.insert("pageCount".to_string(), Value::from(self.page_count()));
        Ok(Value::Object(body))
    }
}

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub per_page: usize,

    /// Total number of items (after filters)
    pub total: usize,

    /// Total number of pages
    pub page_count: usize,

    /// Whether there is a next page
    pub has_next: bool,

    /// Whether there is a previous page
    pub has_prev: bool,
}

impl PaginationMeta {
    /// Create pagination metadata from calculation
    pub fn new(page: usize, per_page: usize, total: usize) -> Self {
        // Guard the division below
        let per_page = per_page.max(1);
        let page = page.max(1);
        let page_count = total.div_ceil(per_page);

        Self {
            page,
            per_page,
            total,
            page_count,
            has_next: page < page_count,
            has_prev: page > 1,
        }
    }
}
