//! URL navigation seam between the filter context and the page host

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How a navigation affects browser history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryMode {
    /// New history entry (back/forward walks through filter states)
    #[default]
    Push,

    /// Replace the current entry
    Replace,
}

/// A URL update requested by the filter context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Serialized filter state, without leading `?`
    pub query: String,

    /// Update the URL without a full page reload
    pub shallow: bool,

    pub history: HistoryMode,
}

impl Navigation {
    /// Shallow navigation adding a history entry
    pub fn push_shallow(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            shallow: true,
            history: HistoryMode::Push,
        }
    }

    /// Target URL for a listing path
    pub fn url(&self, path: &str) -> String {
        if self.query.is_empty() {
            path.to_string()
        } else {
            format!("{}?{}", path, self.query)
        }
    }
}

/// Performs URL navigations.
///
/// The returned future resolves when the transition it started (URL change
/// and the re-render depending on it) has completed. Dropping the future
/// abandons the transition.
#[async_trait]
pub trait Navigator: Send + Sync + 'static {
    async fn navigate(&self, navigation: Navigation) -> Result<()>;
}

/// Navigator recording completed navigations in memory
///
/// Used by tests and by hosts that drain navigations themselves. A transition
/// delay simulates the time the page takes to re-render.
#[derive(Clone, Default)]
pub struct RecordingNavigator {
    completed: Arc<Mutex<Vec<Navigation>>>,
    transition: Duration,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Navigator whose transitions take `transition` to resolve
    pub fn with_transition(transition: Duration) -> Self {
        Self {
            completed: Arc::default(),
            transition,
        }
    }

    /// Completed navigations, oldest first
    pub fn navigations(&self) -> Vec<Navigation> {
        self.completed
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<Navigation> {
        self.navigations().pop()
    }
}

#[async_trait]
impl Navigator for RecordingNavigator {
    async fn navigate(&self, navigation: Navigation) -> Result<()> {
        if !self.transition.is_zero() {
            tokio::time::sleep(self.transition).await;
        }

        tracing::debug!(query = %navigation.query, "Navigation completed");

        self.completed
            .lock()
            .map_err(|e| anyhow!("Failed to acquire navigation lock: {}", e))?
            .push(navigation);
        Ok(())
    }
}
