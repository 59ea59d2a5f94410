//! Domain layer - Core business entities and logic
//!
//! Entities, value objects, validation, the access-control policy and the
//! report arithmetic. Nothing here touches the database or HTTP.

pub mod access;
pub mod audit;
pub mod expense;
pub mod password;
pub mod receipt;
pub mod report;
pub mod search;
pub mod user;

pub use access::{Actor, ProfileChange, Scope};
pub use audit::{AuditLog, NewAuditLog};
pub use expense::{CreateExpense, Expense, ExpensePatch, ExpenseResponse, NewExpense};
pub use password::Password;
pub use receipt::{NewReceipt, Receipt, ReceiptContent, ReceiptFile, ReceiptResponse};
pub use report::{
    CategoryBreakdown, DetailedReport, DetailedReportRequest, Granularity, ReportPeriod,
    ReportSummary, TimeBucket, TopExpense,
};
pub use search::{ExpenseSearch, Range};
pub use user::{NewUser, UpdateUser, User, UserResponse, UserRole};
