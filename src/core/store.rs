//! Store trait for paginated, counted listing reads

use crate::core::predicate::Predicate;
use crate::core::sorting::SortColumn;
use anyhow::Result;
use async_trait::async_trait;

/// A fully resolved listing read: what to match, how to order, which window
#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    /// Effective predicate (base AND filters); `None` matches everything
    pub predicate: Option<Predicate>,

    /// Ordering, most significant first
    pub order: Vec<SortColumn>,

    /// Number of matching rows to skip
    pub offset: usize,

    /// Maximum number of rows to return
    pub limit: usize,
}

/// One window of matching rows plus the count of all matching rows
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

/// Trait for stores backing a listing
///
/// Implementations must read `items` and `total` from the same snapshot so
/// the count always agrees with the returned rows, even under concurrent
/// writes. Failures are returned as-is: retrying belongs to the store client.
#[async_trait]
pub trait ListingStore<T>: Send + Sync {
    /// Fetch the filtered, ordered window and the filtered count atomically
    async fn fetch_page(&self, query: &ListingQuery) -> Result<Page<T>>;
}
