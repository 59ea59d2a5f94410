//! Repository layer - Data access abstraction
//!
//! Repositories provide an abstraction over data persistence,
//! following the Repository pattern for clean separation of concerns.

mod audit_repository;
pub(crate) mod entities;
mod expense_repository;
mod receipt_repository;
mod transaction;
mod user_repository;

pub use audit_repository::{AuditRepository, AuditStore};
pub use expense_repository::{ExpenseRepository, ExpenseStore};
pub use receipt_repository::{ReceiptRepository, ReceiptStore};
pub use user_repository::{UserRepository, UserStore};

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use audit_repository::MockAuditRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use expense_repository::MockExpenseRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use receipt_repository::MockReceiptRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
