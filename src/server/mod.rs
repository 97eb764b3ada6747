//! Server module for building HTTP servers exposing listings
//!
//! This module provides a `ServerBuilder` that registers, per entity:
//! - a JSON listing (`GET /{plural}`)
//! - an HTML listing page (`GET /{plural}/page`)
//! - a user-scoped dashboard listing (`GET /dashboard/{plural}`)

pub mod builder;
pub mod handlers;
pub mod listing;
pub mod registry;

pub use builder::ServerBuilder;
pub use handlers::{UNAVAILABLE_MESSAGE, USER_ID_HEADER, extract_user_id};
pub use listing::{EntityListing, ListingState};
pub use registry::{ListingDescriptor, ListingRegistry};
