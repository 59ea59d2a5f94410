//! Expense search criteria.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::expense::Expense;

/// Inclusive bound pair. An absent bound leaves that side open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T: PartialOrd> Range<T> {
    pub fn new(min: Option<T>, max: Option<T>) -> Self {
        Self { min, max }
    }

    /// `None` when both bounds are absent.
    pub fn from_bounds(min: Option<T>, max: Option<T>) -> Option<Self> {
        if min.is_none() && max.is_none() {
            None
        } else {
            Some(Self { min, max })
        }
    }

    pub fn contains(&self, value: &T) -> bool {
        let above_min = self.min.as_ref().map_or(true, |min| value >= min);
        let below_max = self.max.as_ref().map_or(true, |max| value <= max);
        above_min && below_max
    }

    /// Both bounds present and crossed.
    pub fn is_inverted(&self) -> bool {
        matches!((&self.min, &self.max), (Some(min), Some(max)) if min > max)
    }
}

/// Filters applied sequentially over a set of expenses. Absent fields are
/// no-ops; present ones combine with AND.
#[derive(Debug, Clone, Default)]
pub struct ExpenseSearch {
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    /// Case-insensitive substring of the category
    pub category: Option<String>,
    pub amount: Option<Range<Decimal>>,
    /// Bounds on the expense date
    pub date: Option<Range<DateTime<Utc>>>,
}

impl ExpenseSearch {
    pub fn matches(&self, expense: &Expense) -> bool {
        contains_ignore_case(&expense.title, self.title.as_deref())
            && contains_ignore_case(&expense.category, self.category.as_deref())
            && self.amount.as_ref().map_or(true, |r| r.contains(&expense.amount))
            && self.date.as_ref().map_or(true, |r| r.contains(&expense.expense_date))
    }

    /// Keep matching expenses, newest expense date first.
    pub fn apply(&self, expenses: Vec<Expense>) -> Vec<Expense> {
        let mut matched: Vec<Expense> = expenses.into_iter().filter(|e| self.matches(e)).collect();
        matched.sort_by(|a, b| b.expense_date.cmp(&a.expense_date));
        matched
    }
}

fn contains_ignore_case(haystack: &str, needle: Option<&str>) -> bool {
    match needle.map(str::trim).filter(|n| !n.is_empty()) {
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn expense(title: &str, category: &str, cents: i64, days_ago: i64) -> Expense {
        let mut e = Expense::sample("a@x.com", title, category, Decimal::new(cents, 2));
        e.expense_date = Utc::now() - Duration::days(days_ago);
        e
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let range = Range::new(Some(1), Some(3));
        assert!(range.contains(&1));
        assert!(range.contains(&3));
        assert!(!range.contains(&4));
        assert!(Range::new(None, Some(3)).contains(&-100));
        assert!(Range::<i32>::from_bounds(None, None).is_none());
        assert!(Range::new(Some(5), Some(1)).is_inverted());
    }

    #[test]
    fn test_empty_search_matches_everything() {
        let search = ExpenseSearch::default();
        assert!(search.matches(&expense("Coffee", "Food", 450, 1)));
    }

    #[test]
    fn test_filters_compose_with_and() {
        let search = ExpenseSearch {
            title: Some("coff".into()),
            amount: Some(Range::new(Some(Decimal::new(400, 2)), None)),
            ..Default::default()
        };

        assert!(search.matches(&expense("Morning COFFEE", "Food", 450, 1)));
        assert!(!search.matches(&expense("Coffee", "Food", 300, 1)));
        assert!(!search.matches(&expense("Tea", "Food", 450, 1)));
    }

    #[test]
    fn test_category_and_date_filters() {
        let search = ExpenseSearch {
            category: Some("trav".into()),
            date: Some(Range::new(Some(Utc::now() - Duration::days(7)), None)),
            ..Default::default()
        };

        assert!(search.matches(&expense("Train", "Travel", 1000, 2)));
        assert!(!search.matches(&expense("Train", "Travel", 1000, 30)));
        assert!(!search.matches(&expense("Bread", "Food", 300, 2)));
    }

    #[test]
    fn test_apply_orders_newest_first() {
        let results = ExpenseSearch::default().apply(vec![
            expense("Old", "Misc", 100, 10),
            expense("New", "Misc", 100, 1),
        ]);
        assert_eq!(results[0].title, "New");
    }
}
