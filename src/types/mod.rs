//! Shared HTTP response types.

mod pagination;
mod response;

pub use pagination::{page_offset, ExpensePage, Paginated, PaginationMeta, PaginationParams};
pub use response::{Created, NoContent};
