//! Listing renderer: search controls, results, empty state and pagination
//!
//! Rendering takes pre-fetched results; no store access happens here.

pub mod pagination;

pub use pagination::{PageItem, PaginationProps, page_window};

use crate::core::error::ListingResult;
use crate::core::QueryResult;
use pagination::PaginationView;
use serde::Serialize;
use tera::{Context, Tera};

const LISTING_TEMPLATE: &str = include_str!("templates/listing.html");
const SKELETON_TEMPLATE: &str = include_str!("templates/skeleton.html");
const SEARCH_TEMPLATE: &str = include_str!("templates/search.html");
const PAGINATION_TEMPLATE: &str = include_str!("templates/pagination.html");

/// Default number of pages shown on each side of the current one
pub const DEFAULT_SIBLINGS: usize = 1;

/// Message shown when a listing has no results
pub const DEFAULT_EMPTY_MESSAGE: &str = "No results found.";

/// Results to display
#[derive(Debug, Clone)]
pub struct ListData<T> {
    pub items: Vec<T>,
    pub empty_message: String,
}

impl<T> ListData<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            empty_message: DEFAULT_EMPTY_MESSAGE.to_string(),
        }
    }
}

/// A choice of the sort control
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortOption {
    /// Encoded sort parameter value
    pub value: String,
    pub label: String,
}

impl SortOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A facet control: a select over `values`, or a text input when there are none
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetProps {
    pub param: String,
    pub label: String,
    pub values: Vec<String>,
    pub selected: String,
}

/// Search input and controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchProps {
    /// Name of the free-text parameter
    pub param: String,
    pub value: String,
    pub placeholder: String,
    pub sort_param: String,
    pub sort_options: Vec<SortOption>,
    pub selected_sort: String,
    pub facets: Vec<FacetProps>,
}

impl SearchProps {
    pub fn new(param: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            value: String::new(),
            placeholder: placeholder.into(),
            sort_param: "sort".to_string(),
            sort_options: Vec::new(),
            selected_sort: String::new(),
            facets: Vec::new(),
        }
    }
}

/// Page-level feature toggles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ListingOptions {
    pub enable_sort: bool,
    pub enable_filters: bool,
}

/// Everything a listing needs to render
#[derive(Debug, Clone)]
pub struct ListingProps<T> {
    /// Plural entity name
    pub entity: String,
    pub list: ListData<T>,
    pub pagination: PaginationProps,
    pub search: Option<SearchProps>,
    pub options: ListingOptions,
}

impl<T> ListingProps<T> {
    /// Props for a search result
    pub fn from_result(
        entity: &str,
        result: QueryResult<T>,
        path: &str,
        query: String,
    ) -> Self {
        Self {
            entity: entity.to_string(),
            pagination: PaginationProps {
                total: result.total,
                per_page: result.per_page,
                page: result.page,
                path: path.to_string(),
                query,
            },
            list: ListData::new(result.items),
            search: None,
            options: ListingOptions::default(),
        }
    }
}

#[derive(Serialize)]
struct ListingView<'a, T> {
    entity: &'a str,
    path: &'a str,
    items: &'a [T],
    empty_message: &'a str,
    search: Option<&'a SearchProps>,
    options: ListingOptions,
    pagination: Option<PaginationView>,
    skeleton: bool,
}

#[derive(Serialize)]
struct SkeletonView<'a> {
    entity: &'a str,
    path: &'a str,
    search: Option<&'a SearchProps>,
    options: ListingOptions,
    placeholders: Vec<usize>,
    skeleton: bool,
}

/// Renders listings to HTML
pub struct ListingRenderer {
    tera: Tera,
    siblings: usize,
}

impl ListingRenderer {
    pub fn new() -> ListingResult<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("search.html", SEARCH_TEMPLATE),
            ("pagination.html", PAGINATION_TEMPLATE),
            ("listing.html", LISTING_TEMPLATE),
            ("skeleton.html", SKELETON_TEMPLATE),
        ])?;

        Ok(Self {
            tera,
            siblings: DEFAULT_SIBLINGS,
        })
    }

    pub fn with_siblings(mut self, siblings: usize) -> Self {
        self.siblings = siblings;
        self
    }

    /// Render loaded results.
    ///
    /// Items are exposed to the template as serialized values; cards use
    /// their `name` and `slug`.
    pub fn render<T: Serialize>(&self, props: &ListingProps<T>) -> ListingResult<String> {
        let view = ListingView {
            entity: &props.entity,
            path: &props.pagination.path,
            items: &props.list.items,
            empty_message: &props.list.empty_message,
            search: props.search.as_ref(),
            options: props.options,
            pagination: PaginationView::build(&props.pagination, self.siblings),
            skeleton: false,
        };

        let html = self
            .tera
            .render("listing.html", &Context::from_serialize(&view)?)?;
        Ok(html)
    }

    /// Render the loading state: disabled controls and placeholder cards
    pub fn skeleton(
        &self,
        entity: &str,
        path: &str,
        search: Option<&SearchProps>,
        options: ListingOptions,
        placeholders: usize,
    ) -> ListingResult<String> {
        let view = SkeletonView {
            entity,
            path,
            search,
            options,
            placeholders: (0..placeholders).collect(),
            skeleton: true,
        };

        let html = self
            .tera
            .render("skeleton.html", &Context::from_serialize(&view)?)?;
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Card {
        name: &'static str,
        slug: &'static str,
    }

    fn props(items: Vec<Card>, total: usize, page: usize) -> ListingProps<Card> {
        ListingProps {
            entity: "tools".into(),
            list: ListData::new(items),
            pagination: PaginationProps {
                total,
                per_page: 2,
                page,
                path: "/tools".into(),
                query: String::new(),
            },
            search: Some(SearchProps {
                value: "alp".into(),
                ..SearchProps::new("q", "Search tools")
            }),
            options: ListingOptions::default(),
        }
    }

    #[test]
    fn test_render_items_and_pagination() {
        let renderer = ListingRenderer::new().unwrap();
        let html = renderer
            .render(&props(
                vec![
                    Card {
                        name: "Alpha",
                        slug: "alpha",
                    },
                    Card {
                        name: "Alpine",
                        slug: "alpine",
                    },
                ],
                5,
                1,
            ))
            .unwrap();

        assert!(html.contains("Alpha"));
        assert!(html.contains("Alpine"));
        assert!(html.contains("1 / 3"));
        assert!(html.contains(r#"<span class="pagination-prev" aria-disabled="true">"#));
        assert!(html.contains(r#"value="alp""#));
        assert!(!html.contains("No results found."));
    }

    #[test]
    fn test_render_empty_state_without_pagination() {
        let renderer = ListingRenderer::new().unwrap();
        let html = renderer.render(&props(vec![], 0, 1)).unwrap();

        assert!(html.contains("No results found."));
        assert!(!html.contains("pagination"));
    }

    #[test]
    fn test_out_of_range_page_renders_empty_state() {
        let renderer = ListingRenderer::new().unwrap();
        let html = renderer.render(&props(vec![], 5, 4)).unwrap();

        assert!(html.contains("No results found."));
        assert!(html.contains(r#"<span class="pagination-next" aria-disabled="true">"#));
    }

    #[test]
    fn test_sort_control_follows_option() {
        let renderer = ListingRenderer::new().unwrap();
        let mut listing = props(vec![], 0, 1);
        if let Some(search) = listing.search.as_mut() {
            search.sort_options = vec![SortOption::new("name.asc", "Name")];
        }

        let hidden = renderer.render(&listing).unwrap();
        assert!(!hidden.contains("<select"));

        listing.options.enable_sort = true;
        let shown = renderer.render(&listing).unwrap();
        assert!(shown.contains("<select"));
    }

    #[test]
    fn test_skeleton_disables_input() {
        let renderer = ListingRenderer::new().unwrap();
        let search = SearchProps::new("q", "Search tools");
        let html = renderer
            .skeleton("tools", "/tools", Some(&search), ListingOptions::default(), 3)
            .unwrap();

        assert!(html.contains(r#"placeholder="Search tools""#));
        assert!(html.contains(" disabled"));
        assert_eq!(html.matches("listing-card-skeleton").count(), 3);
        assert!(html.contains(r#"aria-busy="true""#));
    }
}
