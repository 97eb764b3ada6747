//! Storage implementations for different backends

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryListingStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresListingStore;
