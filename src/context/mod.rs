//! Filter context: the shared source of truth for one listing page
//!
//! A [`FilterContext`] owns the current [`FilterState`] of a listing while a
//! page is being browsed. Controls read it and call
//! [`update_filters`](FilterContext::update_filters); the context replaces the
//! state immediately and writes it to the URL through a [`Navigator`] once
//! input has been quiet for the debounce delay.
//!
//! ```text
//! control ──update_filters──▶ FilterContext ──(debounce)──▶ Navigator::navigate
//!                                 │                              │
//!                                 └── subscribe() ◀── state      └── is_loading()
//! ```
//!
//! Contexts are passed explicitly; render code reaches them through a
//! [`FilterScope`].

pub mod debounce;
pub mod navigator;

pub use debounce::{Debouncer, Pending};
pub use navigator::{HistoryMode, Navigation, Navigator, RecordingNavigator};

use crate::config::DEFAULT_DEBOUNCE_MS;
use crate::core::error::{ContextError, ListingResult};
use crate::core::{FilterPatch, FilterSchema, FilterState};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// Page-level options of a filter context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    /// Quiet period before a filter change is written to the URL
    pub debounce: Duration,

    /// The page shows a sort control
    pub enable_sort: bool,

    /// The page shows facet filters
    pub enable_filters: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            enable_sort: false,
            enable_filters: false,
        }
    }
}

/// How a scheduled navigation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Completed,

    /// The navigator reported an error
    Failed(String),

    /// Superseded by a newer update, or cancelled
    Abandoned,
}

/// Handle to the URL update scheduled by [`FilterContext::update_filters`]
#[derive(Debug)]
pub struct PendingNavigation {
    inner: Pending<NavigationOutcome>,
}

impl PendingNavigation {
    /// Wait until the navigation completes or is abandoned
    pub async fn wait(self) -> NavigationOutcome {
        self.inner
            .wait()
            .await
            .unwrap_or(NavigationOutcome::Abandoned)
    }

    pub fn cancel(&self) {
        self.inner.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}

struct Inner {
    schema: FilterSchema,
    options: FilterOptions,
    navigator: Arc<dyn Navigator>,
    debouncer: Debouncer,
    state: watch::Sender<FilterState>,
    loading: watch::Sender<bool>,
    /// Id of the last navigation that started its transition
    started: AtomicU64,
    next_id: AtomicU64,
}

/// Clears the loading flag when the transition that set it ends or is dropped
struct TransitionGuard {
    inner: Arc<Inner>,
    id: u64,
}

impl Drop for TransitionGuard {
    fn drop(&mut self) {
        if self.inner.started.load(Ordering::SeqCst) == self.id {
            self.inner.loading.send_replace(false);
        }
    }
}

/// Filter state coordinator of one listing page.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct FilterContext {
    inner: Arc<Inner>,
}

impl FilterContext {
    pub fn new(
        schema: FilterSchema,
        initial: FilterState,
        navigator: Arc<dyn Navigator>,
        options: FilterOptions,
    ) -> Self {
        let (state, _) = watch::channel(initial);
        let (loading, _) = watch::channel(false);

        Self {
            inner: Arc::new(Inner {
                debouncer: Debouncer::new(options.debounce),
                schema,
                options,
                navigator,
                state,
                loading,
                started: AtomicU64::new(0),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Context whose initial state is read from the current URL query
    pub fn from_query(
        schema: FilterSchema,
        raw_query: &str,
        navigator: Arc<dyn Navigator>,
        options: FilterOptions,
    ) -> Self {
        let initial = schema.parse(raw_query);
        Self::new(schema, initial, navigator, options)
    }

    pub fn schema(&self) -> &FilterSchema {
        &self.inner.schema
    }

    /// Current filter state
    pub fn filters(&self) -> FilterState {
        self.inner.state.borrow().clone()
    }

    /// True while a URL-driven transition is in flight
    pub fn is_loading(&self) -> bool {
        *self.inner.loading.borrow()
    }

    /// True when every parameter except the page is at its default
    pub fn is_default(&self) -> bool {
        let state = self.inner.state.borrow();
        self.inner
            .schema
            .is_default(&state, &[crate::core::param::PAGE_PARAM])
    }

    pub fn enable_sort(&self) -> bool {
        self.inner.options.enable_sort
    }

    pub fn enable_filters(&self) -> bool {
        self.inner.options.enable_filters
    }

    /// Receiver of every state change
    pub fn subscribe(&self) -> watch::Receiver<FilterState> {
        self.inner.state.subscribe()
    }

    /// Receiver of loading flag changes
    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.inner.loading.subscribe()
    }

    /// Merge `patch` into the state, or reset to defaults on `None`.
    ///
    /// The page always returns to its default. The new state is visible
    /// immediately; the URL follows after the debounce delay, superseding any
    /// navigation still pending.
    pub fn update_filters(&self, patch: Option<FilterPatch>) -> PendingNavigation {
        // Read and replace under one write lock so concurrent patches compose
        let mut query = String::new();
        self.inner.state.send_modify(|state| {
            *state = match &patch {
                Some(patch) => self.inner.schema.apply_patch(state, patch),
                None => self.inner.schema.defaults(),
            };
            query = self.inner.schema.serialize(state);
        });

        let navigation = Navigation::push_shallow(query);
        tracing::debug!(
            entity = %self.inner.schema.entity(),
            query = %navigation.query,
            reset = patch.is_none(),
            "Filters updated"
        );

        let inner = self.inner.clone();
        let id = inner.next_id.fetch_add(1, Ordering::SeqCst);
        let task = async move {
            inner.started.store(id, Ordering::SeqCst);
            inner.loading.send_replace(true);
            let guard = TransitionGuard {
                inner: inner.clone(),
                id,
            };

            let outcome = match inner.navigator.navigate(navigation).await {
                Ok(()) => NavigationOutcome::Completed,
                Err(e) => {
                    tracing::warn!(error = %e, "Filter navigation failed");
                    NavigationOutcome::Failed(e.to_string())
                }
            };
            drop(guard);
            outcome
        };

        PendingNavigation {
            inner: self.inner.debouncer.schedule(task),
        }
    }

    /// Abort the pending navigation, if any
    pub fn cancel_pending(&self) -> bool {
        self.inner.debouncer.cancel()
    }
}

/// A position in the render tree, with or without a filter provider above it
#[derive(Clone, Default)]
pub struct FilterScope {
    context: Option<FilterContext>,
}

impl FilterScope {
    /// Scope with no provider
    pub fn empty() -> Self {
        Self::default()
    }

    /// Scope provided by `context`
    pub fn provide(context: FilterContext) -> Self {
        Self {
            context: Some(context),
        }
    }

    /// The provided context.
    ///
    /// Asking for it outside a provider is a programming error: it is logged
    /// at error level and returned as [`ContextError::MissingProvider`].
    pub fn context(&self, consumer: &str) -> ListingResult<&FilterContext> {
        self.context.as_ref().ok_or_else(|| {
            tracing::error!(consumer, "Filter context used outside of a provider");
            ContextError::MissingProvider {
                consumer: consumer.to_string(),
            }
            .into()
        })
    }

    /// Current filters of the provided context
    pub fn filters(&self, consumer: &str) -> ListingResult<FilterState> {
        self.context(consumer).map(FilterContext::filters)
    }
}
