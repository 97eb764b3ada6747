//! Windowed pagination control

use serde::Serialize;
use url::form_urlencoded;

use crate::core::param::PAGE_PARAM;

/// One entry of a page window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "number", rename_all = "snake_case")]
pub enum PageItem {
    Page(usize),
    Ellipsis,
}

/// Page numbers to show around `page`.
///
/// The first and last pages are always present, along with `siblings` pages
/// on each side of the current one. Gaps become [`PageItem::Ellipsis`], except
/// a gap of a single page, which is shown as that page. A `page` beyond the
/// range is windowed as if it were the last page.
pub fn page_window(page: usize, page_count: usize, siblings: usize) -> Vec<PageItem> {
    if page_count == 0 {
        return Vec::new();
    }

    let page = page.clamp(1, page_count);
    let start = page.saturating_sub(siblings).max(1);
    let end = page.saturating_add(siblings).min(page_count);

    let mut items = vec![PageItem::Page(1)];

    if start > 3 {
        items.push(PageItem::Ellipsis);
    } else if start == 3 {
        items.push(PageItem::Page(2));
    }

    for p in start.max(2)..=end.min(page_count - 1) {
        items.push(PageItem::Page(p));
    }

    if page_count >= 3 && end + 2 < page_count {
        items.push(PageItem::Ellipsis);
    } else if page_count >= 3 && end + 2 == page_count {
        items.push(PageItem::Page(page_count - 1));
    }

    if page_count > 1 {
        items.push(PageItem::Page(page_count));
    }

    items
}

/// Pagination input of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationProps {
    pub total: usize,
    pub per_page: usize,
    pub page: usize,

    /// Listing path, e.g. `/tools`
    pub path: String,

    /// Serialized filter state without the page parameter
    pub query: String,
}

impl PaginationProps {
    pub fn page_count(&self) -> usize {
        if self.per_page == 0 {
            0
        } else {
            self.total.div_ceil(self.per_page)
        }
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count()
    }

    /// Link to page `n`; the first page carries no page parameter
    pub fn href(&self, n: usize) -> String {
        let mut query = self.query.clone();
        if n > 1 {
            let page = form_urlencoded::Serializer::new(String::new())
                .append_pair(PAGE_PARAM, &n.to_string())
                .finish();
            if !query.is_empty() {
                query.push('&');
            }
            query.push_str(&page);
        }

        if query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, query)
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PageLinkView {
    pub number: Option<usize>,
    pub href: Option<String>,
    pub current: bool,
}

/// Template-ready pagination
#[derive(Debug, Serialize)]
pub(crate) struct PaginationView {
    pub page: usize,
    pub page_count: usize,
    pub prev: Option<String>,
    pub next: Option<String>,
    pub links: Vec<PageLinkView>,
}

impl PaginationView {
    /// `None` when there is at most one page
    pub fn build(props: &PaginationProps, siblings: usize) -> Option<Self> {
        let page_count = props.page_count();
        if page_count <= 1 {
            return None;
        }

        let links = page_window(props.page, page_count, siblings)
            .into_iter()
            .map(|item| match item {
                PageItem::Page(n) => PageLinkView {
                    number: Some(n),
                    href: Some(props.href(n)),
                    current: n == props.page,
                },
                PageItem::Ellipsis => PageLinkView {
                    number: None,
                    href: None,
                    current: false,
                },
            })
            .collect();

        Some(Self {
            page: props.page,
            page_count,
            prev: props.has_prev().then(|| props.href(props.page - 1)),
            next: props.has_next().then(|| props.href(props.page + 1)),
            links,
        })
    }
}
