//! Report service - Aggregates over the effective target's expenses.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::scope;
use crate::config::DEFAULT_TOP_EXPENSES_LIMIT;
use crate::domain::report::{self, check_limit};
use crate::domain::{
    Actor, CategoryBreakdown, DetailedReport, DetailedReportRequest, Expense, Granularity,
    ReportPeriod, ReportSummary, TimeBucket, TopExpense,
};
use crate::errors::AppResult;
use crate::infra::UnitOfWork;

type Bound = Option<DateTime<Utc>>;

#[async_trait]
pub trait ReportService: Send + Sync {
    /// Totals over the last `last_n_days` days
    async fn quick_summary(
        &self,
        actor: &Actor,
        target: Option<&str>,
        last_n_days: i64,
    ) -> AppResult<ReportSummary>;

    async fn category_breakdown(
        &self,
        actor: &Actor,
        target: Option<&str>,
        start: Bound,
        end: Bound,
    ) -> AppResult<Vec<CategoryBreakdown>>;

    async fn time_based_report(
        &self,
        actor: &Actor,
        target: Option<&str>,
        start: Bound,
        end: Bound,
        group_by: Granularity,
    ) -> AppResult<Vec<TimeBucket>>;

    async fn top_expenses(
        &self,
        actor: &Actor,
        target: Option<&str>,
        start: Bound,
        end: Bound,
        limit: usize,
    ) -> AppResult<Vec<TopExpense>>;

    async fn detailed_report(
        &self,
        actor: &Actor,
        target: Option<&str>,
        request: DetailedReportRequest,
    ) -> AppResult<DetailedReport>;
}

pub struct ReportManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> ReportManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    /// The target's expenses dated within `period`.
    async fn scoped(
        &self,
        actor: &Actor,
        target: Option<&str>,
        period: ReportPeriod,
    ) -> AppResult<Vec<Expense>> {
        let scope = scope::resolve(self.uow.users().as_ref(), actor, target).await?;
        let expenses = self
            .uow
            .expenses()
            .find_by_owner(&scope.target, Some(period.as_range()))
            .await?;

        tracing::debug!(
            target_user = %scope.target,
            count = expenses.len(),
            "Loaded expenses for report"
        );
        Ok(expenses)
    }
}

#[async_trait]
impl<U: UnitOfWork> ReportService for ReportManager<U> {
    async fn quick_summary(
        &self,
        actor: &Actor,
        target: Option<&str>,
        last_n_days: i64,
    ) -> AppResult<ReportSummary> {
        let period = ReportPeriod::last_n_days(last_n_days, Utc::now())?;
        let expenses = self.scoped(actor, target, period).await?;
        Ok(report::summarize(&expenses, period))
    }

    async fn category_breakdown(
        &self,
        actor: &Actor,
        target: Option<&str>,
        start: Bound,
        end: Bound,
    ) -> AppResult<Vec<CategoryBreakdown>> {
        let period = ReportPeriod::resolve(start, end, Utc::now())?;
        let expenses = self.scoped(actor, target, period).await?;
        Ok(report::category_breakdown(&expenses))
    }

    async fn time_based_report(
        &self,
        actor: &Actor,
        target: Option<&str>,
        start: Bound,
        end: Bound,
        group_by: Granularity,
    ) -> AppResult<Vec<TimeBucket>> {
        let period = ReportPeriod::resolve(start, end, Utc::now())?;
        let expenses = self.scoped(actor, target, period).await?;
        Ok(report::time_buckets(&expenses, group_by))
    }

    async fn top_expenses(
        &self,
        actor: &Actor,
        target: Option<&str>,
        start: Bound,
        end: Bound,
        limit: usize,
    ) -> AppResult<Vec<TopExpense>> {
        let limit = check_limit(limit)?;
        let period = ReportPeriod::resolve(start, end, Utc::now())?;
        let expenses = self.scoped(actor, target, period).await?;
        Ok(report::top_expenses(&expenses, limit))
    }

    async fn detailed_report(
        &self,
        actor: &Actor,
        target: Option<&str>,
        request: DetailedReportRequest,
    ) -> AppResult<DetailedReport> {
        let limit = check_limit(request.limit.unwrap_or(DEFAULT_TOP_EXPENSES_LIMIT))?;
        let period = ReportPeriod::resolve(request.start, request.end, Utc::now())?;
        let expenses = self.scoped(actor, target, period).await?;

        Ok(DetailedReport {
            summary: report::summarize(&expenses, period),
            category_breakdown: report::category_breakdown(&expenses),
            time_based: report::time_buckets(&expenses, request.group_by),
            top_expenses: report::top_expenses(&expenses, limit),
        })
    }
}
