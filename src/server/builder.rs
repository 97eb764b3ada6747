//! ServerBuilder for fluent API to build listing servers

use super::listing::EntityListing;
use super::registry::{ListingDescriptor, ListingRegistry};
use crate::config::ListingConfig;
use crate::core::error::{ListingError, ListingResult};
use crate::core::{Listable, ListingStore};
use crate::render::ListingRenderer;
use axum::{Json, Router, routing::get};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Builder for creating HTTP servers exposing listings
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_config(ListingConfig::default_config())
///     .register_listing::<Tool>(InMemoryListingStore::new())?
///     .register_listing::<Category>(InMemoryListingStore::new())?
///     .build()?;
/// ```
pub struct ServerBuilder {
    registry: ListingRegistry,
    configs: Vec<ListingConfig>,
    custom_routes: Vec<Router>,
    renderer: Option<Arc<ListingRenderer>>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            registry: ListingRegistry::new(),
            configs: Vec::new(),
            custom_routes: Vec::new(),
            renderer: None,
        }
    }

    /// Add a listing configuration
    ///
    /// Several configurations are merged; a later one overrides the entities
    /// it names.
    pub fn with_config(mut self, config: ListingConfig) -> Self {
        self.configs.push(config);
        self
    }

    /// Load and add a listing configuration from a YAML file
    pub fn with_config_file(self, path: &str) -> ListingResult<Self> {
        let config = ListingConfig::from_yaml_file(path)?;
        tracing::info!(path, entities = config.entities.len(), "Loaded listing configuration");
        Ok(self.with_config(config))
    }

    /// Add custom routes to the server
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Merged configuration of everything added so far
    pub fn config(&self) -> ListingConfig {
        if self.configs.is_empty() {
            return ListingConfig::default_config();
        }
        ListingConfig::merge(self.configs.clone())
    }

    fn renderer(&mut self) -> ListingResult<Arc<ListingRenderer>> {
        if let Some(renderer) = &self.renderer {
            return Ok(renderer.clone());
        }
        let renderer = Arc::new(ListingRenderer::new()?);
        self.renderer = Some(renderer.clone());
        Ok(renderer)
    }

    /// Register a listing for `T` backed by `store`
    ///
    /// The entity's configuration is looked up by its plural name.
    pub fn register_listing<T>(mut self, store: impl ListingStore<T> + 'static) -> ListingResult<Self>
    where
        T: Listable + Serialize,
    {
        let config = self.config();
        let entity_config = config.entity(T::resource_name())?;
        let listing = EntityListing::<T>::new(entity_config, store, self.renderer()?)?;

        self.registry.register(Box::new(listing));
        Ok(self)
    }

    /// Register a custom listing descriptor
    pub fn register(mut self, descriptor: impl ListingDescriptor + 'static) -> Self {
        self.registry.register(Box::new(descriptor));
        self
    }

    /// Build the final router
    ///
    /// This generates:
    /// - Health check routes
    /// - Listing routes for all registered entities
    /// - Custom routes
    pub fn build(self) -> ListingResult<Router> {
        if self.registry.is_empty() {
            return Err(ListingError::Internal(
                "no listing registered. Call .register_listing()".to_string(),
            ));
        }

        let mut app = Self::health_routes().merge(self.registry.build_routes());
        for custom_router in self.custom_routes {
            app = app.merge(custom_router);
        }

        Ok(app.layer(TraceLayer::new_for_http()))
    }

    fn health_routes() -> Router {
        Router::new()
            .route("/health", get(health_check))
            .route("/healthz", get(health_check))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    ///
    /// # Example
    ///
    /// ```ignore
    /// ServerBuilder::new()
    ///     .register_listing::<Tool>(store)?
    ///     .serve("127.0.0.1:3000").await?;
    /// ```
    pub async fn serve(self, addr: &str) -> ListingResult<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "listing-rs"
    }))
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EntityListingConfig;
    use crate::entities::{Shop, Tool};
    use crate::storage::InMemoryListingStore;

    #[test]
    fn test_build_without_listing_fails() {
        assert!(ServerBuilder::new().build().is_err());
    }

    #[test]
    fn test_register_listing_uses_default_config() {
        let builder = ServerBuilder::new()
            .register_listing::<Tool>(InMemoryListingStore::new())
            .unwrap();
        assert_eq!(builder.registry.entity_types(), vec!["tool"]);
        assert!(builder.build().is_ok());
    }

    #[test]
    fn test_register_listing_without_config_fails() {
        let config = ListingConfig {
            debounce_ms: 250,
            entities: vec![EntityListingConfig::new("tools")],
        };
        let result = ServerBuilder::new()
            .with_config(config)
            .register_listing::<Shop>(InMemoryListingStore::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_config_with_unknown_field_is_rejected() {
        let config = ListingConfig {
            debounce_ms: 250,
            entities: vec![EntityListingConfig {
                search_fields: vec!["password".to_string()],
                ..EntityListingConfig::new("shops")
            }],
        };
        let result = ServerBuilder::new()
            .with_config(config)
            .register_listing::<Shop>(InMemoryListingStore::new());
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_built_router_serves_health() {
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use tower::ServiceExt;

        let app = ServerBuilder::new()
            .register_listing::<Tool>(InMemoryListingStore::new())
            .unwrap()
            .build()
            .unwrap();

        let response = app
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_later_config_overrides() {
        let overlay = ListingConfig {
            debounce_ms: 100,
            entities: vec![EntityListingConfig {
                per_page: 5,
                ..EntityListingConfig::new("tools")
            }],
        };
        let builder = ServerBuilder::new()
            .with_config(ListingConfig::default_config())
            .with_config(overlay);
        let config = builder.config();
        assert_eq!(config.entity("tools").unwrap().per_page, 5);
        assert_eq!(config.entities.len(), 5);
    }
}
