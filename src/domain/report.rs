//! Report aggregation.
//!
//! Pure functions over an already-scoped set of expenses. Sums are kept at
//! full precision; averages and percentages are rounded for display only,
//! and breakdown percentages are apportioned so they still total 100.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{
    DEFAULT_SUMMARY_DAYS, DISPLAY_SCALE, MAX_SUMMARY_DAYS, MAX_TOP_EXPENSES_LIMIT,
    TOP_CATEGORIES_PER_PERIOD,
};
use crate::errors::{AppError, AppResult};

use super::expense::Expense;
use super::search::Range;

/// Inclusive time window a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportPeriod {
    /// Fill in missing bounds: `end` defaults to now and `start` to
    /// `DEFAULT_SUMMARY_DAYS` before `end`.
    pub fn resolve(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        let end = end.unwrap_or(now);
        let start = match start {
            Some(start) => start,
            None => end
                .checked_sub_signed(Duration::days(DEFAULT_SUMMARY_DAYS))
                .ok_or_else(|| AppError::field("end", "End date is out of range"))?,
        };
        if start > end {
            return Err(AppError::field("start", "Start date must not be after end date"));
        }
        Ok(Self { start, end })
    }

    /// Rolling window of `days` ending at `now`.
    pub fn last_n_days(days: i64, now: DateTime<Utc>) -> AppResult<Self> {
        if !(1..=MAX_SUMMARY_DAYS).contains(&days) {
            return Err(AppError::field(
                "lastNDays",
                format!("lastNDays must be between 1 and {}", MAX_SUMMARY_DAYS),
            ));
        }
        Ok(Self {
            start: now - Duration::days(days),
            end: now,
        })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }

    /// Same window as a search range over expense dates.
    pub fn as_range(&self) -> Range<DateTime<Utc>> {
        Range::new(Some(self.start), Some(self.end))
    }
}

/// Calendar bucket size for time-based reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Granularity {
    Day,
    /// ISO week starting on Monday
    Week,
    #[default]
    Month,
    Year,
}

impl FromStr for Granularity {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Granularity::Day),
            "week" => Ok(Granularity::Week),
            "month" => Ok(Granularity::Month),
            "year" => Ok(Granularity::Year),
            other => Err(AppError::field(
                "groupBy",
                format!("Unsupported groupBy '{}', expected day, week, month or year", other),
            )),
        }
    }
}

impl Granularity {
    /// First instant of the bucket containing `at`.
    pub fn bucket_start(self, at: DateTime<Utc>) -> DateTime<Utc> {
        let date = at.date_naive();
        let first: NaiveDate = match self {
            Granularity::Day => date,
            Granularity::Week => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            Granularity::Month => date - Duration::days(i64::from(date.day0())),
            Granularity::Year => date - Duration::days(i64::from(date.ordinal0())),
        };
        Utc.from_utc_datetime(&first.and_time(chrono::NaiveTime::MIN))
    }

    /// Human-readable bucket label.
    pub fn label(self, bucket_start: DateTime<Utc>) -> String {
        let format = match self {
            Granularity::Day => "%Y-%m-%d",
            Granularity::Week => "%G-W%V",
            Granularity::Month => "%Y-%m",
            Granularity::Year => "%Y",
        };
        bucket_start.format(format).to_string()
    }
}

/// Check a requested top-N size.
pub fn check_limit(limit: usize) -> AppResult<usize> {
    if (1..=MAX_TOP_EXPENSES_LIMIT).contains(&limit) {
        Ok(limit)
    } else {
        Err(AppError::field(
            "limit",
            format!("limit must be between 1 and {}", MAX_TOP_EXPENSES_LIMIT),
        ))
    }
}

/// Rolling-window totals.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    #[schema(value_type = String, example = "4.50")]
    pub total_expense: Decimal,
    pub total_expense_count: u64,
    #[schema(value_type = String, example = "4.50")]
    pub average_expense_amount: Decimal,
    #[schema(example = "Food")]
    pub top_category: Option<String>,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    #[schema(example = "Food")]
    pub category: String,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    pub count: u64,
    #[schema(value_type = String)]
    pub average_amount: Decimal,
    /// Share of the overall total, 0-100
    #[schema(value_type = String, example = "42.50")]
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeBucket {
    #[schema(example = "2024-03")]
    pub period: String,
    pub period_start: DateTime<Utc>,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    pub count: u64,
    #[schema(value_type = String)]
    pub average_amount: Decimal,
    pub top_categories: Vec<CategoryBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopExpense {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub expense_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<&Expense> for TopExpense {
    fn from(expense: &Expense) -> Self {
        Self {
            id: expense.id,
            title: expense.title.clone(),
            category: expense.category.clone(),
            amount: expense.amount,
            expense_date: expense.expense_date,
            created_at: expense.created_at,
        }
    }
}

/// Every report over one range and scope.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetailedReport {
    pub summary: ReportSummary,
    pub category_breakdown: Vec<CategoryBreakdown>,
    pub time_based: Vec<TimeBucket>,
    pub top_expenses: Vec<TopExpense>,
}

/// Parameters of a detailed report.
#[derive(Debug, Clone, Default)]
pub struct DetailedReportRequest {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub group_by: Granularity,
    pub limit: Option<usize>,
}

fn average(total: Decimal, count: u64) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        (total / Decimal::from(count)).round_dp(DISPLAY_SCALE)
    }
}

fn total_of(expenses: &[Expense]) -> Decimal {
    expenses.iter().map(|e| e.amount).sum()
}

/// Totals, average and top category of `expenses` over `period`.
pub fn summarize(expenses: &[Expense], period: ReportPeriod) -> ReportSummary {
    let total = total_of(expenses);
    let count = expenses.len() as u64;
    let top_category = category_breakdown(expenses)
        .into_iter()
        .next()
        .map(|row| row.category);

    ReportSummary {
        total_expense: total,
        total_expense_count: count,
        average_expense_amount: average(total, count),
        top_category,
        period_start: period.start,
        period_end: period.end,
    }
}

/// Group by category, largest total first; equal totals sort by name.
pub fn category_breakdown(expenses: &[Expense]) -> Vec<CategoryBreakdown> {
    let overall = total_of(expenses);

    let mut groups: HashMap<&str, (Decimal, u64)> = HashMap::new();
    for expense in expenses {
        let entry = groups.entry(expense.category.as_str()).or_default();
        entry.0 += expense.amount;
        entry.1 += 1;
    }

    let mut rows: Vec<CategoryBreakdown> = groups
        .into_iter()
        .map(|(category, (total, count))| CategoryBreakdown {
            category: category.to_string(),
            total_amount: total,
            count,
            average_amount: average(total, count),
            percentage: Decimal::ZERO,
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total_amount
            .cmp(&a.total_amount)
            .then_with(|| a.category.cmp(&b.category))
    });
    if !overall.is_zero() {
        apportion_percentages(&mut rows, overall);
    }
    rows
}

/// Give every row its share of `overall` at display scale so the shares add
/// up to exactly 100. Shares are truncated first and the leftover hundredths
/// go to the largest remainders, earlier rows winning ties.
fn apportion_percentages(rows: &mut [CategoryBreakdown], overall: Decimal) {
    let unit = Decimal::new(1, DISPLAY_SCALE);

    let mut remainders = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter_mut().enumerate() {
        let exact = row.total_amount * Decimal::ONE_HUNDRED / overall;
        row.percentage = exact.round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::ToZero);
        remainders.push((index, exact - row.percentage));
    }

    let assigned: Decimal = rows.iter().map(|row| row.percentage).sum();
    let leftover = ((Decimal::ONE_HUNDRED - assigned) / unit)
        .round()
        .to_usize()
        .unwrap_or(0);

    remainders.sort_by(|a, b| b.1.cmp(&a.1));
    for (index, _) in remainders.into_iter().take(leftover) {
        rows[index].percentage += unit;
    }
}

/// Bucket by calendar period, oldest first. Empty buckets are omitted.
pub fn time_buckets(expenses: &[Expense], granularity: Granularity) -> Vec<TimeBucket> {
    let mut buckets: BTreeMap<DateTime<Utc>, Vec<Expense>> = BTreeMap::new();
    for expense in expenses {
        buckets
            .entry(granularity.bucket_start(expense.expense_date))
            .or_default()
            .push(expense.clone());
    }

    buckets
        .into_iter()
        .map(|(start, members)| {
            let total = total_of(&members);
            let count = members.len() as u64;
            let mut top_categories = category_breakdown(&members);
            top_categories.truncate(TOP_CATEGORIES_PER_PERIOD);

            TimeBucket {
                period: granularity.label(start),
                period_start: start,
                total_amount: total,
                count,
                average_amount: average(total, count),
                top_categories,
            }
        })
        .collect()
}

/// Largest `limit` expenses. Equal amounts list the most recently created
/// first, then by id.
pub fn top_expenses(expenses: &[Expense], limit: usize) -> Vec<TopExpense> {
    let mut sorted: Vec<&Expense> = expenses.iter().collect();
    sorted.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    sorted.into_iter().take(limit).map(TopExpense::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn expense(category: &str, cents: i64, date: DateTime<Utc>) -> Expense {
        let mut e = Expense::sample("a@x.com", "Item", category, Decimal::new(cents, 2));
        e.expense_date = date;
        e
    }

    #[test]
    fn test_summary_single_expense() {
        let now = Utc::now();
        let period = ReportPeriod::last_n_days(30, now).unwrap();
        let summary = summarize(&[expense("Food", 450, now)], period);

        assert_eq!(summary.total_expense, Decimal::new(450, 2));
        assert_eq!(summary.total_expense_count, 1);
        assert_eq!(summary.average_expense_amount, Decimal::new(450, 2));
        assert_eq!(summary.top_category.as_deref(), Some("Food"));
    }

    #[test]
    fn test_summary_empty() {
        let now = Utc::now();
        let summary = summarize(&[], ReportPeriod::last_n_days(7, now).unwrap());
        assert_eq!(summary.total_expense, Decimal::ZERO);
        assert_eq!(summary.average_expense_amount, Decimal::ZERO);
        assert_eq!(summary.top_category, None);
    }

    #[test]
    fn test_last_n_days_bounds() {
        let now = Utc::now();
        assert!(ReportPeriod::last_n_days(0, now).is_err());
        assert!(ReportPeriod::last_n_days(1, now).is_ok());
        assert!(ReportPeriod::last_n_days(MAX_SUMMARY_DAYS, now).is_ok());
        assert!(ReportPeriod::last_n_days(MAX_SUMMARY_DAYS + 1, now).is_err());
    }

    #[test]
    fn test_resolve_defaults_and_inverted_range() {
        let now = Utc::now();
        let period = ReportPeriod::resolve(None, None, now).unwrap();
        assert_eq!(period.end, now);
        assert_eq!(period.start, now - Duration::days(DEFAULT_SUMMARY_DAYS));

        assert!(ReportPeriod::resolve(Some(now), Some(now - Duration::days(1)), now).is_err());
    }

    #[test]
    fn test_resolve_rejects_end_too_early_for_default_start() {
        let now = Utc::now();
        let result = ReportPeriod::resolve(None, Some(DateTime::<Utc>::MIN_UTC), now);
        assert!(matches!(result, Err(AppError::InvalidFields(_))));

        let explicit = ReportPeriod::resolve(
            Some(DateTime::<Utc>::MIN_UTC),
            Some(DateTime::<Utc>::MIN_UTC),
            now,
        );
        assert!(explicit.is_ok());
    }

    #[test]
    fn test_breakdown_totals_and_percentages() {
        let now = Utc::now();
        let expenses = vec![
            expense("Food", 1000, now),
            expense("Travel", 2000, now),
            expense("Food", 1000, now),
            expense("Books", 333, now),
        ];
        let rows = category_breakdown(&expenses);

        let sum: Decimal = rows.iter().map(|r| r.total_amount).sum();
        assert_eq!(sum, total_of(&expenses));

        let pct: Decimal = rows.iter().map(|r| r.percentage).sum();
        assert!((pct - Decimal::ONE_HUNDRED).abs() <= Decimal::new(1, 1));

        let food = rows.iter().find(|r| r.category == "Food").unwrap();
        assert_eq!(food.count, 2);
        assert_eq!(food.average_amount, Decimal::new(1000, 2));
    }

    #[test]
    fn test_breakdown_percentages_total_100_across_many_categories() {
        let now = Utc::now();
        let expenses: Vec<Expense> = (0..300)
            .map(|i| expense(&format!("Cat{:03}", i), 100, now))
            .collect();
        let rows = category_breakdown(&expenses);

        let pct: Decimal = rows.iter().map(|r| r.percentage).sum();
        assert_eq!(pct, Decimal::ONE_HUNDRED);
        assert_eq!(rows[0].percentage, Decimal::new(34, 2));
        assert_eq!(rows[299].percentage, Decimal::new(33, 2));
    }

    #[test]
    fn test_breakdown_thirds_keep_display_scale() {
        let now = Utc::now();
        let rows = category_breakdown(&[
            expense("A", 100, now),
            expense("B", 100, now),
            expense("C", 100, now),
        ]);

        let shares: Vec<Decimal> = rows.iter().map(|r| r.percentage).collect();
        assert_eq!(
            shares,
            vec![Decimal::new(3334, 2), Decimal::new(3333, 2), Decimal::new(3333, 2)]
        );
    }

    #[test]
    fn test_breakdown_ties_sort_alphabetically() {
        let now = Utc::now();
        let rows = category_breakdown(&[expense("Zoo", 500, now), expense("Art", 500, now)]);
        assert_eq!(rows[0].category, "Art");

        let summary = summarize(
            &[expense("Zoo", 500, now), expense("Art", 500, now)],
            ReportPeriod::last_n_days(1, now).unwrap(),
        );
        assert_eq!(summary.top_category.as_deref(), Some("Art"));
    }

    #[test]
    fn test_breakdown_zero_total_gives_zero_percent() {
        let now = Utc::now();
        let mut free = expense("Gift", 1, now);
        free.amount = Decimal::ZERO;
        let rows = category_breakdown(&[free]);
        assert_eq!(rows[0].percentage, Decimal::ZERO);
    }

    #[test]
    fn test_bucket_starts() {
        // 2024-03-14 is a Thursday
        let day = at(2024, 3, 14);
        assert_eq!(Granularity::Day.bucket_start(day), Utc.with_ymd_and_hms(2024, 3, 14, 0, 0, 0).unwrap());
        assert_eq!(Granularity::Week.bucket_start(day), Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap());
        assert_eq!(Granularity::Month.bucket_start(day), Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(Granularity::Year.bucket_start(day), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_labels() {
        let start = Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap();
        assert_eq!(Granularity::Month.label(start), "2024-03");
        assert_eq!(Granularity::Week.label(start), "2024-W11");
        assert_eq!(Granularity::Year.label(start), "2024");
    }

    #[test]
    fn test_granularity_parsing() {
        assert_eq!("WEEK".parse::<Granularity>().unwrap(), Granularity::Week);
        assert_eq!(Granularity::default(), Granularity::Month);
        assert!("fortnight".parse::<Granularity>().is_err());
    }

    #[test]
    fn test_time_buckets_ascend_and_skip_empty() {
        let expenses = vec![
            expense("Food", 100, at(2024, 3, 2)),
            expense("Food", 300, at(2024, 1, 20)),
            expense("Rent", 900, at(2024, 1, 5)),
        ];
        let buckets = time_buckets(&expenses, Granularity::Month);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].period, "2024-01");
        assert_eq!(buckets[0].total_amount, Decimal::new(1200, 2));
        assert_eq!(buckets[0].top_categories[0].category, "Rent");
        assert_eq!(buckets[1].period, "2024-03");
    }

    #[test]
    fn test_top_categories_truncated() {
        let now = at(2024, 5, 1);
        let expenses: Vec<Expense> = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|c| expense(c, 100, now))
            .collect();
        let buckets = time_buckets(&expenses, Granularity::Day);
        assert_eq!(buckets[0].top_categories.len(), TOP_CATEGORIES_PER_PERIOD);
    }

    #[test]
    fn test_top_expenses_order_and_limit() {
        let now = Utc::now();
        let mut older = expense("Food", 500, now);
        older.created_at = now - Duration::hours(1);
        let newer = expense("Food", 500, now);
        let small = expense("Food", 100, now);
        let big = expense("Rent", 9000, now);

        let top = top_expenses(&[small, older.clone(), big.clone(), newer.clone()], 3);

        assert_eq!(top.len(), 3);
        assert_eq!(top[0].id, big.id);
        assert_eq!(top[1].id, newer.id);
        assert_eq!(top[2].id, older.id);
    }

    #[test]
    fn test_limit_bounds() {
        assert!(check_limit(0).is_err());
        assert!(check_limit(1).is_ok());
        assert!(check_limit(MAX_TOP_EXPENSES_LIMIT + 1).is_err());
    }
}
