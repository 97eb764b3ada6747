//! Query executor: filter state → predicate + order + window → store
//!
//! ```text
//! FilterState ──▶ build_predicate ──┐
//!                                   ├─▶ base AND filters ─▶ ListingQuery ─▶ ListingStore::fetch_page
//! base predicate ───────────────────┘        build_order ─┘                         │
//!                                                                                   ▼
//!                                                        QueryResult { items, total, page, per_page }
//! ```

use crate::core::entity::Listable;
use crate::core::error::ListingResult;
use crate::core::field::FieldValue;
use crate::core::predicate::{Combinator, Predicate};
use crate::core::query::{FilterState, QueryResult};
use crate::core::sorting::SortColumn;
use crate::core::store::{ListingQuery, ListingStore};

/// Letter filter value selecting names that start with a digit
pub const DIGITS_LETTER: &str = "0-9";

/// Binds a URL parameter to an entity field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBinding {
    pub param: String,
    pub field: String,
}

impl FieldBinding {
    pub fn new(param: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            field: field.into(),
        }
    }
}

/// Binds a `from`/`to` parameter pair to a datetime field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRangeBinding {
    pub field: String,
    pub from_param: String,
    pub to_param: String,
}

/// How one listing maps its filter state onto entity fields
#[derive(Debug, Clone)]
pub struct SearchSpec {
    /// Free-text parameter (usually `q`)
    pub query_param: String,

    /// Fields matched case-insensitively by the free-text parameter
    pub text_fields: Vec<String>,

    /// Exact-match facets (`category`, `country`, ...)
    pub facets: Vec<FieldBinding>,

    /// Alphabet filter (`letter`), case-insensitive prefix
    pub letter: Option<FieldBinding>,

    /// Date range filter (`from`/`to`)
    pub date_range: Option<DateRangeBinding>,

    /// Parameter selecting the combinator (`operator`)
    pub operator_param: Option<String>,

    /// Sort parameter name
    pub sort_param: String,

    /// Order used when the sort parameter is empty
    pub default_order: Vec<SortColumn>,

    /// Appended to every order for stable pagination across ties
    pub tiebreaker: SortColumn,

    /// Page size when the state carries none
    pub per_page: usize,
}

impl SearchSpec {
    /// Search `name` with `q`, sort by name, 24 per page
    pub fn new() -> Self {
        Self {
            query_param: "q".to_string(),
            text_fields: vec!["name".to_string()],
            facets: Vec::new(),
            letter: None,
            date_range: None,
            operator_param: None,
            sort_param: "sort".to_string(),
            default_order: vec![SortColumn::asc("name")],
            tiebreaker: SortColumn::asc("created_at"),
            per_page: 24,
        }
    }

    /// Build the user filter expression, `None` when no filter applies.
    ///
    /// Parameters at their default/empty value contribute nothing: they are
    /// left out of the combination rather than added as always-true terms.
    pub fn build_predicate(&self, state: &FilterState) -> Option<Predicate> {
        let mut parts = Vec::new();

        if let Some(q) = state.non_empty_text(&self.query_param) {
            let matches: Vec<Predicate> = self
                .text_fields
                .iter()
                .map(|field| Predicate::contains(field.as_str(), q))
                .collect();
            parts.extend(Predicate::combine(Combinator::Or, matches));
        }

        for facet in &self.facets {
            if let Some(value) = state.non_empty_text(&facet.param) {
                parts.push(Predicate::Equals {
                    field: facet.field.clone(),
                    value: FieldValue::from(value),
                });
            }
        }

        if let Some(letter) = &self.letter {
            if let Some(value) = state.non_empty_text(&letter.param) {
                parts.push(if value == DIGITS_LETTER {
                    Predicate::StartsWithDigit {
                        field: letter.field.clone(),
                    }
                } else {
                    Predicate::StartsWith {
                        field: letter.field.clone(),
                        value: value.to_string(),
                    }
                });
            }
        }

        if let Some(range) = &self.date_range {
            let from = state.date(&range.from_param);
            let to = state.date(&range.to_param);
            if from.is_some() || to.is_some() {
                parts.push(Predicate::DateRange {
                    field: range.field.clone(),
                    from,
                    to,
                });
            }
        }

        let combinator = Combinator::from_param(
            self.operator_param
                .as_deref()
                .and_then(|param| state.text(param)),
        );

        Predicate::combine(combinator, parts)
    }

    /// Build the order: requested sort (or default), then the tiebreaker
    pub fn build_order(&self, state: &FilterState) -> Vec<SortColumn> {
        let mut order = match state.sort(&self.sort_param) {
            Some(sort) if !sort.is_empty() => sort.columns().to_vec(),
            _ => self.default_order.clone(),
        };

        if !order.iter().any(|c| c.id == self.tiebreaker.id) {
            order.push(self.tiebreaker.clone());
        }

        order
    }
}

impl Default for SearchSpec {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a listing search.
///
/// The effective predicate is `base AND filters`; nothing in the filter state
/// can widen the base. Out-of-range pages are not clamped: they return no
/// items with the correct total. Store failures propagate unchanged.
pub async fn search<T, S>(
    store: &S,
    spec: &SearchSpec,
    state: &FilterState,
    base: Option<Predicate>,
) -> ListingResult<QueryResult<T>>
where
    T: Listable,
    S: ListingStore<T> + ?Sized,
{
    let page = state.page();
    let per_page = state.per_page(spec.per_page);
    let offset = (page - 1).saturating_mul(per_page);

    let mut order = spec.build_order(state);
    order.retain(|column| {
        let known = T::has_field(&column.id);
        if !known {
            tracing::warn!(
                entity = T::resource_name(),
                column = %column.id,
                "Dropping sort column outside the entity's field set"
            );
        }
        known
    });

    let query = ListingQuery {
        predicate: Predicate::intersect(base, spec.build_predicate(state)),
        order,
        offset,
        limit: per_page,
    };

    tracing::debug!(
        entity = T::resource_name(),
        page,
        per_page,
        offset,
        predicate = ?query.predicate,
        "Executing listing search"
    );

    let fetched = store.fetch_page(&query).await.inspect_err(|e| {
        tracing::error!(entity = T::resource_name(), error = %e, "Listing search failed");
    })?;

    let mut items = fetched.items;
    if fetched.total < items.len() {
        tracing::warn!(
            entity = T::resource_name(),
            total = fetched.total,
            returned = items.len(),
            "Store returned more rows than its count; dropping the excess"
        );
    }
    items.truncate(per_page.min(fetched.total));

    Ok(QueryResult {
        total: fetched.total,
        items,
        page,
        per_page,
    })
}
