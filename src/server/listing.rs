//! Per-entity listing descriptor: configuration, store and routes

use super::handlers::{dashboard_json, list_json, list_page};
use super::registry::ListingDescriptor;
use crate::config::EntityListingConfig;
use crate::core::{FilterSchema, Listable, ListingResult, ListingStore, SearchSpec};
use crate::render::ListingRenderer;
use axum::{Router, routing::get};
use serde::Serialize;
use std::sync::Arc;

/// State shared by the handlers of one entity listing
pub struct ListingState<T> {
    pub store: Arc<dyn ListingStore<T>>,
    pub schema: Arc<FilterSchema>,
    pub spec: Arc<SearchSpec>,
    pub config: Arc<EntityListingConfig>,
    pub renderer: Arc<ListingRenderer>,
}

impl<T> Clone for ListingState<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            schema: self.schema.clone(),
            spec: self.spec.clone(),
            config: self.config.clone(),
            renderer: self.renderer.clone(),
        }
    }
}

impl<T: Listable> ListingState<T> {
    pub fn plural(&self) -> &str {
        T::resource_name()
    }

    /// Path of the HTML listing
    pub fn page_path(&self) -> String {
        format!("/{}/page", T::resource_name())
    }
}

/// Listing of one entity type backed by a store
///
/// Routes:
/// - `GET /{plural}`: JSON results (`{plural, pluralTotal, page, perPage, pageCount}`)
/// - `GET /{plural}/page`: HTML listing
/// - `GET /dashboard/{plural}`: the caller's own records, when the
///   configuration names a submitter field
pub struct EntityListing<T> {
    state: ListingState<T>,
}

impl<T> EntityListing<T>
where
    T: Listable + Serialize,
{
    /// Build a listing from its configuration.
    ///
    /// Fails when the configuration names a field `T` does not have.
    pub fn new(
        config: &EntityListingConfig,
        store: impl ListingStore<T> + 'static,
        renderer: Arc<ListingRenderer>,
    ) -> ListingResult<Self> {
        Self::with_shared_store(config, Arc::new(store), renderer)
    }

    pub fn with_shared_store(
        config: &EntityListingConfig,
        store: Arc<dyn ListingStore<T>>,
        renderer: Arc<ListingRenderer>,
    ) -> ListingResult<Self> {
        config.check_fields::<T>()?;

        Ok(Self {
            state: ListingState {
                store,
                schema: Arc::new(config.schema()?),
                spec: Arc::new(config.search_spec()),
                config: Arc::new(config.clone()),
                renderer,
            },
        })
    }

    pub fn state(&self) -> &ListingState<T> {
        &self.state
    }
}

impl<T> ListingDescriptor for EntityListing<T>
where
    T: Listable + Serialize,
{
    fn entity_type(&self) -> &str {
        T::resource_name_singular()
    }

    fn plural(&self) -> &str {
        T::resource_name()
    }

    fn build_routes(&self) -> Router {
        let plural = T::resource_name();

        let mut router = Router::new()
            .route(&format!("/{}", plural), get(list_json::<T>))
            .route(&format!("/{}/page", plural), get(list_page::<T>));

        if self.state.config.submitter_field.is_some() {
            router = router.route(&format!("/dashboard/{}", plural), get(dashboard_json::<T>));
        }

        router.with_state(self.state.clone())
    }
}
