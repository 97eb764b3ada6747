//! Core module containing the fundamental types of the listing pipeline

pub mod entity;
pub mod error;
pub mod field;
pub mod param;
pub mod predicate;
pub mod query;
pub mod search;
pub mod sorting;
pub mod store;

pub use entity::Listable;
pub use error::{ListingError, ListingResult};
pub use field::FieldValue;
pub use param::{FilterSchema, ParamKind, ParamValue};
pub use predicate::{Combinator, Predicate};
pub use query::{FilterPatch, FilterState, PaginationMeta, QueryResult};
pub use search::{SearchSpec, search};
pub use sorting::{SortColumn, SortFormat, SortingState, SortingStateParser};
pub use store::{ListingQuery, ListingStore, Page};
