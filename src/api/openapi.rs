//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{
    audit_handler, auth_handler, expense_handler, receipt_handler, report_handler, user_handler,
};
use crate::domain::{
    AuditLog, CategoryBreakdown, DetailedReport, ExpenseResponse, ReceiptResponse, ReportSummary,
    TimeBucket, TopExpense, UpdateUser, UserResponse,
};
use crate::services::TokenResponse;
use crate::types::{ExpensePage, PaginationMeta};

/// OpenAPI documentation for the Expense Tracker API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Expense Tracker API",
        version = "0.1.0",
        description = "Personal expense tracking with receipts, reports and an audit trail",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        // Authentication endpoints
        auth_handler::register,
        auth_handler::login,
        auth_handler::refresh,
        // Expense endpoints
        expense_handler::create_expense,
        expense_handler::update_expense,
        expense_handler::list_expenses,
        expense_handler::search_expenses,
        expense_handler::search_all_expenses,
        expense_handler::get_expense,
        expense_handler::delete_expense,
        expense_handler::download_receipt,
        // Receipt endpoints
        receipt_handler::list_receipts,
        receipt_handler::attach_receipt,
        receipt_handler::delete_receipt,
        // Report endpoints
        report_handler::summary,
        report_handler::category_breakdown,
        report_handler::time_based,
        report_handler::top_expenses,
        report_handler::detailed,
        // User endpoints
        user_handler::get_current_user,
        user_handler::list_users,
        user_handler::get_user,
        user_handler::update_user,
        user_handler::delete_user,
        // Audit endpoints
        audit_handler::list_audit_logs,
    ),
    components(
        schemas(
            // Domain types
            ExpenseResponse,
            ReceiptResponse,
            UserResponse,
            UpdateUser,
            AuditLog,
            ReportSummary,
            CategoryBreakdown,
            TimeBucket,
            TopExpense,
            DetailedReport,
            ExpensePage,
            PaginationMeta,
            // Auth types
            auth_handler::RegisterRequest,
            auth_handler::LoginRequest,
            auth_handler::RefreshRequest,
            TokenResponse,
            // User handler types
            user_handler::UpdateUserRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and token refresh"),
        (name = "Expenses", description = "Expense records and receipt downloads"),
        (name = "Receipts", description = "Receipt attachment management"),
        (name = "Reports", description = "Spending summaries and breakdowns"),
        (name = "Users", description = "User profile management"),
        (name = "Audit", description = "Audit history")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT token obtained from /auth/login"))
                        .build(),
                ),
            );
        }
    }
}
