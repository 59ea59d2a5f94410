//! User profile handlers.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Extension, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{UpdateUser, UserResponse};
use crate::errors::AppResult;
use crate::types::NoContent;

/// Profile update request. Absent fields stay untouched.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    /// New phone number (empty clears it)
    #[validate(length(max = 32, message = "Phone must be at most 32 characters"))]
    #[schema(example = "+1 555 0100")]
    pub phone: Option<String>,
    /// New role (admin only)
    #[schema(example = "admin")]
    pub role: Option<String>,
    /// New password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

impl From<UpdateUserRequest> for UpdateUser {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            phone: req.phone,
            role: req.role,
            password: req.password,
        }
    }
}

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/me", get(get_current_user))
        .route(
            "/:username",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// Get the authenticated user's profile
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .user_service
        .get_user(&current_user.actor(), &current_user.username)
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// List all active users (admin only)
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "Active users", body = Vec<UserResponse>),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<UserResponse>>> {
    let users = state.user_service.list_users(&current_user.actor()).await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Get a user profile (self or admin)
#[utoipa::path(
    get,
    path = "/api/users/{username}",
    tag = "Users",
    params(("username" = String, Path, description = "Username (email)")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 403, description = "Access denied"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(username): Path<String>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .user_service
        .get_user(&current_user.actor(), &username)
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// Update phone, password or role
#[utoipa::path(
    put,
    path = "/api/users/{username}",
    tag = "Users",
    params(("username" = String, Path, description = "Username (email)")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(username): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .user_service
        .update_user(&current_user.actor(), &username, payload.into())
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// Soft delete a user (self or admin)
#[utoipa::path(
    delete,
    path = "/api/users/{username}",
    tag = "Users",
    params(("username" = String, Path, description = "Username (email)")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Admins cannot delete themselves"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(username): Path<String>,
) -> AppResult<NoContent> {
    state
        .user_service
        .delete_user(&current_user.actor(), &username)
        .await?;

    Ok(NoContent)
}
