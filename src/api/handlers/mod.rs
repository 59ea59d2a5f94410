//! HTTP request handlers.

pub mod audit_handler;
pub mod auth_handler;
pub mod expense_handler;
pub mod receipt_handler;
pub mod report_handler;
pub mod user_handler;

pub use audit_handler::audit_routes;
pub use auth_handler::auth_routes;
pub use expense_handler::expense_routes;
pub use receipt_handler::receipt_routes;
pub use report_handler::report_routes;
pub use user_handler::user_routes;
