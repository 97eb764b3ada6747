//! Listing registry: collects listing descriptors and merges their routes

use axum::Router;
use indexmap::IndexMap;

/// Trait that describes how to build routes for a listing
///
/// Each listable entity (tools, categories, ...) provides one descriptor.
pub trait ListingDescriptor: Send + Sync {
    /// The entity type name (singular, e.g., "tool")
    fn entity_type(&self) -> &str;

    /// The plural form (e.g., "tools")
    fn plural(&self) -> &str;

    /// Build the listing routes for this entity
    ///
    /// Should return a Router with routes like:
    /// - GET /{plural}
    /// - GET /{plural}/page
    fn build_routes(&self) -> Router;
}

/// Registry for all listings of the application
#[derive(Default)]
pub struct ListingRegistry {
    descriptors: IndexMap<String, Box<dyn ListingDescriptor>>,
}

impl ListingRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            descriptors: IndexMap::new(),
        }
    }

    /// Register a listing descriptor
    ///
    /// The entity type name is used as the key; registering the same entity
    /// again replaces the previous descriptor.
    pub fn register(&mut self, descriptor: Box<dyn ListingDescriptor>) {
        let entity_type = descriptor.entity_type().to_string();
        tracing::debug!(entity = %entity_type, plural = descriptor.plural(), "Registered listing");
        self.descriptors.insert(entity_type, descriptor);
    }

    /// Build a router with all registered listing routes
    pub fn build_routes(&self) -> Router {
        let mut router = Router::new();

        for descriptor in self.descriptors.values() {
            router = router.merge(descriptor.build_routes());
        }

        router
    }

    /// Registered entity types, in registration order
    pub fn entity_types(&self) -> Vec<&str> {
        self.descriptors.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
