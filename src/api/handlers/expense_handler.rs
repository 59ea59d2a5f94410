//! Expense handlers.

use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Json, Response},
    routing::get,
    Extension, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::api::extractors::{parse_bounds, ExpenseForm, TargetQuery};
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{ExpenseResponse, ExpenseSearch, Range};
use crate::errors::{AppResult, FieldErrors};
use crate::types::{Created, ExpensePage, PaginationParams};

/// Search filters; every field is optional and filters combine with AND
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Case-insensitive title substring
    pub title: Option<String>,
    /// Case-insensitive category substring
    pub category: Option<String>,
    /// Inclusive lower amount bound
    pub min_amount: Option<String>,
    /// Inclusive upper amount bound
    pub max_amount: Option<String>,
    /// Earliest expense date (RFC 3339 or YYYY-MM-DD)
    pub start: Option<String>,
    /// Latest expense date (RFC 3339 or YYYY-MM-DD)
    pub end: Option<String>,
    /// Target user (admin only)
    pub username: Option<String>,
}

impl SearchQuery {
    fn into_search(self) -> AppResult<(Option<String>, ExpenseSearch)> {
        let mut errors = FieldErrors::new();
        let mut amount = |field: &str, raw: Option<&str>| {
            let raw = raw.map(str::trim).filter(|r| !r.is_empty())?;
            Decimal::from_str(raw)
                .map_err(|_| errors.add(field, "Amount must be a decimal number"))
                .ok()
        };
        let min_amount = amount("minAmount", self.min_amount.as_deref());
        let max_amount = amount("maxAmount", self.max_amount.as_deref());
        errors.into_result()?;

        let (start, end) = parse_bounds(self.start.as_deref(), self.end.as_deref())?;

        let amount = Range::from_bounds(min_amount, max_amount);
        let date = Range::from_bounds(start, end);

        let mut errors = FieldErrors::new();
        if amount.is_some_and(|r| r.is_inverted()) {
            errors.add("minAmount", "minAmount must not exceed maxAmount");
        }
        if date.is_some_and(|r| r.is_inverted()) {
            errors.add("start", "start must not be after end");
        }
        errors.into_result()?;

        let search = ExpenseSearch {
            title: self.title.filter(|t| !t.trim().is_empty()),
            category: self.category.filter(|c| !c.trim().is_empty()),
            amount,
            date,
        };
        Ok((self.username, search))
    }
}

/// Page request with an optional target user
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ExpenseListQuery {
    /// Target user (admin only)
    pub username: Option<String>,
    /// 1-indexed page number
    pub page: Option<u64>,
    /// Items per page (capped at 100)
    pub per_page: Option<u64>,
}

impl ExpenseListQuery {
    fn pagination(&self) -> PaginationParams {
        let defaults = PaginationParams::default();
        PaginationParams {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

/// Create expense routes
pub fn expense_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_expenses).post(create_expense).put(update_expense),
        )
        .route("/search", get(search_expenses))
        .route("/search/all", get(search_all_expenses))
        .route("/receipt/:receipt_id", get(download_receipt))
        .route("/:id", get(get_expense).delete(delete_expense))
}

/// Record a new expense (multipart, optional `receipt` file)
#[utoipa::path(
    post,
    path = "/api/expense",
    tag = "Expenses",
    params(("username" = Option<String>, Query, description = "Target user (admin only)")),
    responses(
        (status = 201, description = "Expense created", body = ExpenseResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Target user not allowed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_expense(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<TargetQuery>,
    form: ExpenseForm,
) -> AppResult<Created<ExpenseResponse>> {
    let input = form.into_create()?;
    let expense = state
        .expense_service
        .add_expense(&current_user.actor(), query.target(), input)
        .await?;

    Ok(Created(ExpenseResponse::from(expense)))
}

/// Partially update an expense (multipart; `id` required, `version` optional)
#[utoipa::path(
    put,
    path = "/api/expense",
    tag = "Expenses",
    params(("username" = Option<String>, Query, description = "Target user (admin only)")),
    responses(
        (status = 200, description = "Expense updated", body = ExpenseResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Expense not found"),
        (status = 409, description = "Expense changed concurrently")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_expense(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<TargetQuery>,
    form: ExpenseForm,
) -> AppResult<Json<ExpenseResponse>> {
    let patch = form.into_patch()?;
    let expense = state
        .expense_service
        .update_expense(&current_user.actor(), query.target(), patch)
        .await?;

    Ok(Json(ExpenseResponse::from(expense)))
}

/// Page through the target's expenses, newest first
#[utoipa::path(
    get,
    path = "/api/expense",
    tag = "Expenses",
    params(ExpenseListQuery),
    responses(
        (status = 200, description = "Page of expenses", body = ExpensePage),
        (status = 400, description = "Invalid page request")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_expenses(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<ExpenseListQuery>,
) -> AppResult<Json<ExpensePage>> {
    let pagination = query.pagination();
    let page = state
        .expense_service
        .get_expenses_by_username(
            &current_user.actor(),
            query.username.as_deref(),
            pagination.page,
            pagination.per_page,
        )
        .await?;

    Ok(Json(page.map(ExpenseResponse::from)))
}

/// Search the target's expenses
#[utoipa::path(
    get,
    path = "/api/expense/search",
    tag = "Expenses",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching expenses", body = Vec<ExpenseResponse>),
        (status = 400, description = "Invalid filter")
    ),
    security(("bearer_auth" = []))
)]
pub async fn search_expenses(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<ExpenseResponse>>> {
    let (target, search) = query.into_search()?;
    let expenses = state
        .expense_service
        .search_user_expenses(&current_user.actor(), target.as_deref(), search)
        .await?;

    Ok(Json(expenses.into_iter().map(ExpenseResponse::from).collect()))
}

/// Search every user's expenses (admin only)
#[utoipa::path(
    get,
    path = "/api/expense/search/all",
    tag = "Expenses",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching expenses", body = Vec<ExpenseResponse>),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn search_all_expenses(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<ExpenseResponse>>> {
    let (_, search) = query.into_search()?;
    let expenses = state
        .expense_service
        .search_expenses(&current_user.actor(), search)
        .await?;

    Ok(Json(expenses.into_iter().map(ExpenseResponse::from).collect()))
}

/// Get one expense
#[utoipa::path(
    get,
    path = "/api/expense/{id}",
    tag = "Expenses",
    params(
        ("id" = Uuid, Path, description = "Expense ID"),
        ("username" = Option<String>, Query, description = "Target user (admin only)")
    ),
    responses(
        (status = 200, description = "Expense found", body = ExpenseResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Expense not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_expense(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Query(query): Query<TargetQuery>,
) -> AppResult<Json<ExpenseResponse>> {
    let expense = state
        .expense_service
        .get_expense(&current_user.actor(), query.target(), id)
        .await?;

    Ok(Json(ExpenseResponse::from(expense)))
}

/// Delete an expense and its receipt
#[utoipa::path(
    delete,
    path = "/api/expense/{id}",
    tag = "Expenses",
    params(
        ("id" = Uuid, Path, description = "Expense ID"),
        ("username" = Option<String>, Query, description = "Target user (admin only)")
    ),
    responses(
        (status = 200, description = "Deleted expense", body = ExpenseResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Expense not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_expense(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Query(query): Query<TargetQuery>,
) -> AppResult<Json<ExpenseResponse>> {
    let expense = state
        .expense_service
        .delete_expense(&current_user.actor(), query.target(), id)
        .await?;

    Ok(Json(ExpenseResponse::from(expense)))
}

/// Download a stored receipt file
#[utoipa::path(
    get,
    path = "/api/expense/receipt/{receipt_id}",
    tag = "Expenses",
    params(
        ("receipt_id" = Uuid, Path, description = "Receipt ID"),
        ("username" = Option<String>, Query, description = "Target user (admin only)")
    ),
    responses(
        (status = 200, description = "Receipt file bytes", content_type = "application/octet-stream"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Receipt not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn download_receipt(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(receipt_id): Path<Uuid>,
    Query(query): Query<TargetQuery>,
) -> AppResult<Response> {
    let content = state
        .expense_service
        .get_expense_receipt(&current_user.actor(), query.target(), receipt_id)
        .await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        content.receipt.file_name.replace('"', "")
    );
    Ok((
        [
            (header::CONTENT_TYPE, content.receipt.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content.data,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;

    #[test]
    fn test_search_query_parses_bounds() {
        let query = SearchQuery {
            min_amount: Some("1.50".into()),
            start: Some("2024-01-01".into()),
            ..Default::default()
        };
        let (_, search) = query.into_search().unwrap();

        assert_eq!(search.amount.unwrap().min, Some(Decimal::new(150, 2)));
        assert!(search.amount.unwrap().max.is_none());
        assert!(search.date.is_some());
        assert!(search.title.is_none());
    }

    #[test]
    fn test_search_query_rejects_inverted_amounts() {
        let query = SearchQuery {
            min_amount: Some("10".into()),
            max_amount: Some("5".into()),
            ..Default::default()
        };

        match query.into_search() {
            Err(AppError::InvalidFields(fields)) => assert!(fields.contains("minAmount")),
            other => panic!("unexpected result {:?}", other.map(|(t, _)| t)),
        }
    }
}
