//! # listing-rs
//!
//! Faceted listing pipeline for directory sites: URL-synchronized filter
//! state, paginated search and listing rendering.
//!
//! ## Features
//!
//! - **Parameter Schemas**: typed, defaulted query parameters per entity
//! - **Minimal URLs**: parameters at their default never reach the query string
//! - **Safe Sorting**: sort columns are checked against the entity's fields
//! - **Debounced Filter Context**: last-write-wins URL updates with a loading flag
//! - **Scoped Search**: caller predicates are always intersected, never widened
//! - **Consistent Pages**: items and total come from one snapshot
//! - **Configuration-Based**: listings declared in YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use listing::prelude::*;
//!
//! let config = ListingConfig::default_config();
//! let tools = config.entity("tools")?;
//! let schema = tools.schema()?;
//! let spec = tools.search_spec();
//!
//! let store = InMemoryListingStore::with_records(vec![
//!     Tool::new("Alpha", "First".into(), "ai".into(), vec![], None, None, None),
//! ]);
//!
//! let state = schema.parse("?q=alp&sort=name.desc");
//! let result = search(&store, &spec, &state, None).await?;
//! assert_eq!(result.total, 1);
//! ```

pub mod config;
pub mod context;
pub mod core;
pub mod entities;
pub mod render;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        Combinator, FieldValue, FilterPatch, FilterSchema, FilterState, Listable, ListingError,
        ListingQuery, ListingResult, ListingStore, Page, PaginationMeta, ParamKind, ParamValue,
        Predicate, QueryResult, SearchSpec, SortColumn, SortFormat, SortingState,
        SortingStateParser, search,
    };
    pub use crate::core::param::{PAGE_PARAM, PER_PAGE_PARAM};

    // === Macros ===
    pub use crate::impl_listable_entity;

    // === Entities ===
    pub use crate::entities::{Category, Location, Shop, Tag, Tool};

    // === Context ===
    pub use crate::context::{
        FilterContext, FilterOptions, FilterScope, HistoryMode, Navigation, NavigationOutcome,
        Navigator, PendingNavigation,
    };

    // === Rendering ===
    pub use crate::render::{
        ListData, ListingOptions, ListingProps, ListingRenderer, PaginationProps, SearchProps,
        page_window,
    };

    // === Storage ===
    pub use crate::storage::InMemoryListingStore;
    #[cfg(feature = "postgres")]
    pub use crate::storage::PostgresListingStore;

    // === Config ===
    pub use crate::config::{EntityListingConfig, FacetConfig, ListingConfig};

    // === Server ===
    pub use crate::server::{EntityListing, ListingDescriptor, ListingRegistry, ServerBuilder};

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
