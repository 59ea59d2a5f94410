//! Receipt handlers.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, put},
    Extension, Router,
};
use uuid::Uuid;

use crate::api::extractors::{ExpenseForm, TargetQuery, RECEIPT_FIELD};
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::ReceiptResponse;
use crate::errors::{AppError, AppResult};
use crate::types::NoContent;

/// Create receipt routes
pub fn receipt_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_receipts))
        .route("/:id", put(attach_receipt).delete(delete_receipt))
}

/// List receipt metadata for the target user
#[utoipa::path(
    get,
    path = "/api/receipt",
    tag = "Receipts",
    params(("username" = Option<String>, Query, description = "Target user (admin only)")),
    responses(
        (status = 200, description = "Receipts", body = Vec<ReceiptResponse>),
        (status = 403, description = "Target user not allowed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_receipts(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<TargetQuery>,
) -> AppResult<Json<Vec<ReceiptResponse>>> {
    let receipts = state
        .receipt_service
        .list_receipts(&current_user.actor(), query.target())
        .await?;

    Ok(Json(receipts.into_iter().map(ReceiptResponse::from).collect()))
}

/// Attach or replace the receipt of an expense (multipart `receipt` file)
#[utoipa::path(
    put,
    path = "/api/receipt/{id}",
    tag = "Receipts",
    params(
        ("id" = Uuid, Path, description = "Expense ID"),
        ("username" = Option<String>, Query, description = "Target user (admin only)")
    ),
    responses(
        (status = 200, description = "Receipt stored", body = ReceiptResponse),
        (status = 400, description = "Missing or invalid file"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Expense not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn attach_receipt(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(expense_id): Path<Uuid>,
    Query(query): Query<TargetQuery>,
    form: ExpenseForm,
) -> AppResult<Json<ReceiptResponse>> {
    let file = form
        .receipt
        .ok_or_else(|| AppError::field(RECEIPT_FIELD, "A receipt file is required"))?;

    let receipt = state
        .receipt_service
        .attach_receipt(&current_user.actor(), query.target(), expense_id, file)
        .await?;

    Ok(Json(ReceiptResponse::from(receipt)))
}

/// Delete a receipt, keeping its expense
#[utoipa::path(
    delete,
    path = "/api/receipt/{id}",
    tag = "Receipts",
    params(
        ("id" = Uuid, Path, description = "Receipt ID"),
        ("username" = Option<String>, Query, description = "Target user (admin only)")
    ),
    responses(
        (status = 204, description = "Receipt deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Receipt not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_receipt(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(receipt_id): Path<Uuid>,
    Query(query): Query<TargetQuery>,
) -> AppResult<NoContent> {
    state
        .receipt_service
        .delete_receipt(&current_user.actor(), query.target(), receipt_id)
        .await?;

    Ok(NoContent)
}
