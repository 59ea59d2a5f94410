//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on abstractions (traits) for
//! dependency inversion, and reach storage through the Unit of Work.

mod audit_service;
mod auth_service;
pub mod container;
mod expense_service;
mod receipt_service;
mod report_service;
mod scope;
mod user_service;

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use audit_service::{AuditManager, AuditRecorder, AuditService, AuditTrail};
pub use auth_service::{AuthService, Authenticator, Claims, TokenResponse};
pub use expense_service::{ExpenseManager, ExpenseService};
pub use receipt_service::{ReceiptManager, ReceiptService};
pub use report_service::{ReportManager, ReportService};
pub use user_service::{UserManager, UserService};

#[cfg(any(test, feature = "test-utils"))]
pub use audit_service::MockAuditRecorder;
#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
