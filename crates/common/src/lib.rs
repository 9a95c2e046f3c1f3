//! Identifiers and pagination types shared by every crate of the order
//! lifecycle service.

pub mod ids;
pub mod pagination;

pub use ids::{DocumentId, IdError, UserId};
pub use pagination::{PageMeta, PageRequest, PaginationError};
