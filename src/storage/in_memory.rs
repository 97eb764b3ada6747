//! In-memory implementation of ListingStore for testing and development

use crate::core::{Listable, ListingQuery, ListingStore, Page, SortColumn};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// In-memory listing store
///
/// Useful for testing and development. Uses RwLock for thread-safe access;
/// a page and its count are computed under one read guard, so they always
/// describe the same snapshot.
#[derive(Clone)]
pub struct InMemoryListingStore<T> {
    records: Arc<RwLock<IndexMap<Uuid, T>>>,
}

impl<T: Listable> InMemoryListingStore<T> {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(IndexMap::new())),
        }
    }

    /// Create a store holding the given records
    pub fn with_records(records: impl IntoIterator<Item = T>) -> Self {
        let store = Self::new();
        if let Ok(mut guard) = store.records.write() {
            guard.extend(records.into_iter().map(|r| (r.id(), r)));
        }
        store
    }

    /// Insert or replace a record
    pub fn insert(&self, record: T) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        records.insert(record.id(), record);
        Ok(())
    }

    /// Remove a record
    pub fn remove(&self, id: &Uuid) -> Result<Option<T>> {
        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        Ok(records.shift_remove(id))
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Listable> Default for InMemoryListingStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Compare two records column by column
fn compare<T: Listable>(a: &T, b: &T, order: &[SortColumn]) -> Ordering {
    for column in order {
        let left = a.field_value(&column.id);
        let right = b.field_value(&column.id);
        let ordering = match (left, right) {
            (Some(l), Some(r)) => l.total_cmp(&r),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        let ordering = if column.desc {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl<T: Listable> ListingStore<T> for InMemoryListingStore<T> {
    async fn fetch_page(&self, query: &ListingQuery) -> Result<Page<T>> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let mut matching: Vec<&T> = records
            .values()
            .filter(|r| query.predicate.as_ref().is_none_or(|p| p.evaluate(*r)))
            .collect();

        let total = matching.len();
        matching.sort_by(|a, b| compare(*a, *b, &query.order));

        let items = matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect();

        Ok(Page { items, total })
    }
}
