//! Report handlers.

use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Extension, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::api::extractors::parse_bounds;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::config::{DEFAULT_SUMMARY_DAYS, DEFAULT_TOP_EXPENSES_LIMIT};
use crate::domain::{
    CategoryBreakdown, DetailedReport, DetailedReportRequest, Granularity, ReportSummary,
    TimeBucket, TopExpense,
};
use crate::errors::{AppError, AppResult};

/// Report parameters. Each endpoint reads the subset it needs.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// Target user (admin only)
    pub username: Option<String>,
    /// Rolling window for the summary, 1..=3650 (default 30)
    pub last_n_days: Option<String>,
    /// Range start (RFC 3339 or YYYY-MM-DD; default 30 days before end)
    pub start: Option<String>,
    /// Range end (RFC 3339 or YYYY-MM-DD; default now)
    pub end: Option<String>,
    /// day, week, month or year (default month)
    pub group_by: Option<String>,
    /// Top-N size, 1..=100 (default 10)
    pub limit: Option<String>,
}

impl ReportQuery {
    fn target(&self) -> Option<&str> {
        self.username.as_deref()
    }

    fn bounds(&self) -> AppResult<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
        parse_bounds(self.start.as_deref(), self.end.as_deref())
    }

    fn last_n_days(&self) -> AppResult<i64> {
        match present(&self.last_n_days) {
            None => Ok(DEFAULT_SUMMARY_DAYS),
            Some(raw) => raw
                .parse()
                .map_err(|_| AppError::field("lastNDays", "lastNDays must be an integer")),
        }
    }

    fn group_by(&self) -> AppResult<Granularity> {
        present(&self.group_by).map_or(Ok(Granularity::default()), str::parse)
    }

    fn limit(&self) -> AppResult<usize> {
        match present(&self.limit) {
            None => Ok(DEFAULT_TOP_EXPENSES_LIMIT),
            Some(raw) => raw
                .parse()
                .map_err(|_| AppError::field("limit", "limit must be a positive integer")),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Create report routes
pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/summary", get(summary))
        .route("/category-breakdown", get(category_breakdown))
        .route("/time-based", get(time_based))
        .route("/top-expenses", get(top_expenses))
        .route("/detailed", get(detailed))
}

/// Totals over the last N days
#[utoipa::path(
    get,
    path = "/api/report/summary",
    tag = "Reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Summary", body = ReportSummary),
        (status = 400, description = "Invalid window")
    ),
    security(("bearer_auth" = []))
)]
pub async fn summary(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<ReportSummary>> {
    let days = query.last_n_days()?;
    let summary = state
        .report_service
        .quick_summary(&current_user.actor(), query.target(), days)
        .await?;

    Ok(Json(summary))
}

/// Totals per category
#[utoipa::path(
    get,
    path = "/api/report/category-breakdown",
    tag = "Reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Category breakdown", body = Vec<CategoryBreakdown>),
        (status = 400, description = "Invalid range")
    ),
    security(("bearer_auth" = []))
)]
pub async fn category_breakdown(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<Vec<CategoryBreakdown>>> {
    let (start, end) = query.bounds()?;
    let breakdown = state
        .report_service
        .category_breakdown(&current_user.actor(), query.target(), start, end)
        .await?;

    Ok(Json(breakdown))
}

/// Totals per calendar bucket
#[utoipa::path(
    get,
    path = "/api/report/time-based",
    tag = "Reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Time buckets", body = Vec<TimeBucket>),
        (status = 400, description = "Invalid range or groupBy")
    ),
    security(("bearer_auth" = []))
)]
pub async fn time_based(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<Vec<TimeBucket>>> {
    let (start, end) = query.bounds()?;
    let group_by = query.group_by()?;
    let buckets = state
        .report_service
        .time_based_report(&current_user.actor(), query.target(), start, end, group_by)
        .await?;

    Ok(Json(buckets))
}

/// Largest expenses in the range
#[utoipa::path(
    get,
    path = "/api/report/top-expenses",
    tag = "Reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Top expenses", body = Vec<TopExpense>),
        (status = 400, description = "Invalid range or limit")
    ),
    security(("bearer_auth" = []))
)]
pub async fn top_expenses(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<Vec<TopExpense>>> {
    let (start, end) = query.bounds()?;
    let limit = query.limit()?;
    let top = state
        .report_service
        .top_expenses(&current_user.actor(), query.target(), start, end, limit)
        .await?;

    Ok(Json(top))
}

/// Summary, breakdown, buckets and top expenses for one range
#[utoipa::path(
    get,
    path = "/api/report/detailed",
    tag = "Reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Detailed report", body = DetailedReport),
        (status = 400, description = "Invalid parameters")
    ),
    security(("bearer_auth" = []))
)]
pub async fn detailed(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<DetailedReport>> {
    let (start, end) = query.bounds()?;
    let request = DetailedReportRequest {
        start,
        end,
        group_by: query.group_by()?,
        limit: Some(query.limit()?),
    };
    let report = state
        .report_service
        .detailed_report(&current_user.actor(), query.target(), request)
        .await?;

    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_when_absent() {
        let query = ReportQuery::default();

        assert_eq!(query.last_n_days().unwrap(), DEFAULT_SUMMARY_DAYS);
        assert_eq!(query.limit().unwrap(), DEFAULT_TOP_EXPENSES_LIMIT);
        assert_eq!(query.group_by().unwrap(), Granularity::Month);
    }

    #[test]
    fn test_unparseable_values_are_field_errors() {
        let query = ReportQuery {
            last_n_days: Some("week".into()),
            group_by: Some("fortnight".into()),
            limit: Some("-1".into()),
            ..Default::default()
        };

        assert!(matches!(query.last_n_days(), Err(AppError::InvalidFields(_))));
        assert!(matches!(query.group_by(), Err(AppError::InvalidFields(_))));
        assert!(matches!(query.limit(), Err(AppError::InvalidFields(_))));
    }
}
