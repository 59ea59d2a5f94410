//! Expense Tracker - Personal expense tracking API
//!
//! Users record expenses with optional receipt files, search and page
//! through them, and pull spending reports. Admins may act on behalf of
//! any user, and every mutation lands in an audit trail.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Entities, validation, access policy and report arithmetic
//! - **services**: Application use cases and business logic
//! - **infra**: Database, migrations and repositories
//! - **api**: HTTP handlers, middleware, and routes
//! - **types**: Shared response types (pagination, status helpers)
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server
//! cargo run -- serve
//!
//! # Run migrations
//! cargo run -- migrate up
//!
//! # Create the first administrator
//! cargo run -- admin create root@example.com --password 'change-me-now'
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;
pub mod types;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{Actor, Expense, Password, User, UserRole};
pub use errors::{AppError, AppResult};
