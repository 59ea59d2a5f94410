//! Application route configuration.

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    audit_routes, auth_routes, expense_routes, receipt_routes, report_routes, user_routes,
};
use super::middleware::auth_middleware;
use super::openapi::ApiDoc;
use super::AppState;

/// Room for form fields alongside the receipt file
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Create the application router with all routes configured
pub fn create_router(state: AppState) -> Router {
    let upload_limit =
        DefaultBodyLimit::max(state.config.max_receipt_bytes + MULTIPART_OVERHEAD_BYTES);

    // Everything under /api requires a valid access token
    let api = Router::new()
        .nest("/expense", expense_routes().layer(upload_limit))
        .nest("/receipt", receipt_routes().layer(upload_limit))
        .nest("/report", report_routes())
        .nest("/users", user_routes())
        .nest("/audit", audit_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        // OpenAPI Swagger UI documentation
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/auth", auth_routes())
        .nest("/api", api);

    if let Some(cors) = cors_layer(state.config.cors_allowed_origin.as_deref()) {
        router = router.layer(cors);
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// CORS for the configured origin, if any
fn cors_layer(origin: Option<&str>) -> Option<CorsLayer> {
    let origin = origin?;
    match origin.parse::<HeaderValue>() {
        Ok(value) => Some(
            CorsLayer::new()
                .allow_origin(value)
                .allow_methods(Any)
                .allow_headers(Any),
        ),
        Err(e) => {
            tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
            None
        }
    }
}

/// Root endpoint
async fn root() -> &'static str {
    "Expense Tracker API"
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: ServiceStatus,
}

/// Service status
#[derive(Serialize)]
struct ServiceStatus {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Health check endpoint with database connectivity check
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status_code, database) = match state.database.ping().await {
        Ok(_) => (
            StatusCode::OK,
            ServiceStatus {
                status: "healthy",
                error: None,
            },
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                ServiceStatus {
                    status: "unhealthy",
                    error: Some("database unreachable".to_string()),
                },
            )
        }
    };

    let response = HealthResponse {
        status: if status_code == StatusCode::OK {
            "healthy"
        } else {
            "degraded"
        },
        database,
    };

    (status_code, Json(response))
}
