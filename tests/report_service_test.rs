//! Report aggregation tests over in-memory persistence.

mod support;

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use expense_tracker::domain::{
    CreateExpense, DetailedReportRequest, ExpenseSearch, Granularity, Range, UserRole,
};
use expense_tracker::errors::AppError;
use expense_tracker::services::{ServiceContainer, Services};

use support::{actor, config, FakeUnitOfWork};

const ALICE: &str = "a@x.com";
const BOB: &str = "b@x.com";
const ADMIN: &str = "admin@x.com";

fn setup() -> (FakeUnitOfWork, Services) {
    let uow = FakeUnitOfWork::new();
    uow.store.insert_user(ALICE, UserRole::User);
    uow.store.insert_user(BOB, UserRole::User);
    uow.store.insert_user(ADMIN, UserRole::Admin);
    let services = Services::from_unit_of_work(Arc::new(uow.clone()), config());
    (uow, services)
}

fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

fn cents(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

/// Three categories spread over two months of 2024
fn seed(uow: &FakeUnitOfWork) {
    let store = &uow.store;
    store.insert_expense(ALICE, "Groceries", "Food", cents(3000), day(2024, 1, 3));
    store.insert_expense(ALICE, "Lunch", "Food", cents(1250), day(2024, 1, 15));
    store.insert_expense(ALICE, "Train", "Travel", cents(4500), day(2024, 1, 20));
    store.insert_expense(ALICE, "Cinema", "Leisure", cents(1000), day(2024, 2, 2));
    store.insert_expense(ALICE, "Flight", "Travel", cents(12000), day(2024, 2, 10));
    store.insert_expense(BOB, "Hotel", "Travel", cents(50000), day(2024, 1, 10));
}

fn range() -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    (Some(day(2024, 1, 1)), Some(day(2024, 2, 28)))
}

#[tokio::test]
async fn test_quick_summary_of_single_expense() {
    let (_, services) = setup();
    let alice = actor(ALICE, UserRole::User);
    services
        .expenses()
        .add_expense(
            &alice,
            None,
            CreateExpense {
                title: "Coffee".into(),
                category: "Food".into(),
                notes: None,
                amount: cents(450),
                expense_date: None,
                receipt: None,
            },
        )
        .await
        .unwrap();

    let summary = services
        .reports()
        .quick_summary(&alice, None, 30)
        .await
        .unwrap();

    assert_eq!(summary.total_expense, cents(450));
    assert_eq!(summary.total_expense_count, 1);
    assert_eq!(summary.average_expense_amount, cents(450));
    assert_eq!(summary.top_category.as_deref(), Some("Food"));
    assert_eq!(summary.period_end - summary.period_start, Duration::days(30));
}

#[tokio::test]
async fn test_quick_summary_window_bounds() {
    let (_, services) = setup();
    let alice = actor(ALICE, UserRole::User);

    for days in [0, -5, 3651] {
        let result = services.reports().quick_summary(&alice, None, days).await;
        assert!(matches!(result, Err(AppError::InvalidFields(_))), "{}", days);
    }

    let empty = services.reports().quick_summary(&alice, None, 1).await.unwrap();
    assert_eq!(empty.total_expense, Decimal::ZERO);
    assert_eq!(empty.average_expense_amount, Decimal::ZERO);
    assert!(empty.top_category.is_none());
}

#[tokio::test]
async fn test_breakdown_totals_and_percentages() {
    let (uow, services) = setup();
    seed(&uow);
    let (start, end) = range();

    let breakdown = services
        .reports()
        .category_breakdown(&actor(ALICE, UserRole::User), None, start, end)
        .await
        .unwrap();

    let categories: Vec<&str> = breakdown.iter().map(|c| c.category.as_str()).collect();
    assert_eq!(categories, vec!["Travel", "Food", "Leisure"]);

    let total: Decimal = breakdown.iter().map(|c| c.total_amount).sum();
    assert_eq!(total, cents(21750));

    let percentages: Decimal = breakdown.iter().map(|c| c.percentage).sum();
    assert!((percentages - Decimal::ONE_HUNDRED).abs() <= Decimal::new(1, 1));

    let food = &breakdown[1];
    assert_eq!(food.count, 2);
    assert_eq!(food.average_amount, cents(2125));
}

#[tokio::test]
async fn test_breakdown_of_empty_range() {
    let (uow, services) = setup();
    seed(&uow);

    let breakdown = services
        .reports()
        .category_breakdown(
            &actor(ALICE, UserRole::User),
            None,
            Some(day(2020, 1, 1)),
            Some(day(2020, 2, 1)),
        )
        .await
        .unwrap();
    assert!(breakdown.is_empty());

    let inverted = services
        .reports()
        .category_breakdown(
            &actor(ALICE, UserRole::User),
            None,
            Some(day(2024, 2, 1)),
            Some(day(2024, 1, 1)),
        )
        .await;
    assert!(matches!(inverted, Err(AppError::InvalidFields(_))));
}

#[tokio::test]
async fn test_top_expenses_is_subset_of_search() {
    let (uow, services) = setup();
    seed(&uow);
    let alice = actor(ALICE, UserRole::User);
    let (start, end) = range();

    let top = services
        .reports()
        .top_expenses(&alice, None, start, end, 3)
        .await
        .unwrap();
    let amounts: Vec<Decimal> = top.iter().map(|t| t.amount).collect();
    assert_eq!(amounts, vec![cents(12000), cents(4500), cents(3000)]);

    let searched = services
        .expenses()
        .search_user_expenses(
            &alice,
            None,
            ExpenseSearch {
                date: Range::from_bounds(start, end),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(top.iter().all(|t| searched.iter().any(|e| e.id == t.id)));

    for limit in [0, 101] {
        let result = services
            .reports()
            .top_expenses(&alice, None, start, end, limit)
            .await;
        assert!(matches!(result, Err(AppError::InvalidFields(_))));
    }
}

#[tokio::test]
async fn test_time_based_report_by_month() {
    let (uow, services) = setup();
    seed(&uow);
    let (start, end) = range();

    let buckets = services
        .reports()
        .time_based_report(
            &actor(ALICE, UserRole::User),
            None,
            start,
            end,
            Granularity::Month,
        )
        .await
        .unwrap();

    let labels: Vec<&str> = buckets.iter().map(|b| b.period.as_str()).collect();
    assert_eq!(labels, vec!["2024-01", "2024-02"]);
    assert_eq!(buckets[0].total_amount, cents(8750));
    assert_eq!(buckets[0].count, 3);
    assert_eq!(buckets[0].top_categories[0].category, "Travel");
    assert_eq!(buckets[1].total_amount, cents(13000));
}

#[tokio::test]
async fn test_admin_reports_for_target() {
    let (uow, services) = setup();
    seed(&uow);
    let (start, end) = range();

    let bobs = services
        .reports()
        .category_breakdown(&actor(ADMIN, UserRole::Admin), Some(BOB), start, end)
        .await
        .unwrap();
    assert_eq!(bobs.len(), 1);
    assert_eq!(bobs[0].total_amount, cents(50000));

    let denied = services
        .reports()
        .category_breakdown(&actor(ALICE, UserRole::User), Some(BOB), start, end)
        .await;
    assert!(matches!(denied, Err(AppError::Forbidden)));

    let unknown = services
        .reports()
        .category_breakdown(&actor(ADMIN, UserRole::Admin), Some("ghost@x.com"), start, end)
        .await;
    assert!(matches!(unknown, Err(AppError::EntityNotFound(_))));
}

#[tokio::test]
async fn test_detailed_report_composes_parts() {
    let (uow, services) = setup();
    seed(&uow);
    let alice = actor(ALICE, UserRole::User);
    let (start, end) = range();

    let report = services
        .reports()
        .detailed_report(
            &alice,
            None,
            DetailedReportRequest {
                start,
                end,
                group_by: Granularity::Month,
                limit: Some(2),
            },
        )
        .await
        .unwrap();

    assert_eq!(report.summary.total_expense, cents(21750));
    assert_eq!(report.summary.total_expense_count, 5);
    assert_eq!(report.summary.top_category.as_deref(), Some("Travel"));
    assert_eq!(report.category_breakdown.len(), 3);
    assert_eq!(report.time_based.len(), 2);
    assert_eq!(report.top_expenses.len(), 2);

    let breakdown = services
        .reports()
        .category_breakdown(&alice, None, start, end)
        .await
        .unwrap();
    assert_eq!(report.category_breakdown, breakdown);
}
