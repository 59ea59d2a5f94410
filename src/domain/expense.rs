//! Expense domain entity, input types and validation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{MAX_CATEGORY_LENGTH, MAX_NOTES_LENGTH, MAX_TITLE_LENGTH, MONEY_SCALE};
use crate::errors::{AppResult, FieldErrors};

use super::receipt::{Receipt, ReceiptFile, ReceiptResponse};

/// Largest amount that fits a DECIMAL(18, 2) column.
const MAX_AMOUNT_UNITS: i64 = 10_000_000_000_000_000;

/// Expense domain entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expense {
    pub id: Uuid,
    /// Owning user
    pub username: String,
    pub title: String,
    pub category: String,
    pub notes: Option<String>,
    pub amount: Decimal,
    /// When the money was spent
    pub expense_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_by: Option<String>,
    /// Optimistic concurrency token, bumped on every write
    pub version: i32,
    pub receipt: Option<Receipt>,
}

impl Expense {
    /// Apply the present fields of a validated patch.
    pub fn apply(&mut self, patch: &ExpensePatch, updated_by: &str, now: DateTime<Utc>) {
        if let Some(title) = &patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(category) = &patch.category {
            self.category = category.trim().to_string();
        }
        if let Some(notes) = &patch.notes {
            self.notes = normalize_notes(Some(notes));
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(date) = patch.expense_date {
            self.expense_date = date;
        }
        self.updated_by = Some(updated_by.to_string());
        self.updated_at = now;
    }

    #[cfg(test)]
    pub(crate) fn sample(username: &str, title: &str, category: &str, amount: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            title: title.to_string(),
            category: category.to_string(),
            notes: None,
            amount,
            expense_date: now,
            created_at: now,
            updated_at: now,
            created_by: username.to_string(),
            updated_by: None,
            version: 1,
            receipt: None,
        }
    }
}

/// Request to record a new expense.
#[derive(Debug, Clone)]
pub struct CreateExpense {
    pub title: String,
    pub category: String,
    pub notes: Option<String>,
    pub amount: Decimal,
    /// Defaults to the creation time when absent
    pub expense_date: Option<DateTime<Utc>>,
    pub receipt: Option<ReceiptFile>,
}

impl CreateExpense {
    /// Check every field and report all violations together.
    pub fn validate(&self, now: DateTime<Utc>, max_receipt_bytes: usize) -> AppResult<()> {
        let mut errors = FieldErrors::new();
        check_label(&mut errors, "title", "Title", &self.title, MAX_TITLE_LENGTH);
        check_label(&mut errors, "category", "Category", &self.category, MAX_CATEGORY_LENGTH);
        check_notes(&mut errors, self.notes.as_deref());
        check_amount(&mut errors, self.amount);
        check_date(&mut errors, self.expense_date, now);
        if let Some(file) = &self.receipt {
            errors.extend(file.validate("receipt", max_receipt_bytes));
        }
        errors.into_result()
    }
}

/// Partial update of an expense. Every field is optional and only present
/// fields are applied, so an explicit zero amount is never mistaken for
/// "not supplied".
#[derive(Debug, Clone, Default)]
pub struct ExpensePatch {
    pub id: Uuid,
    pub title: Option<String>,
    pub category: Option<String>,
    /// An empty string clears the notes
    pub notes: Option<String>,
    pub amount: Option<Decimal>,
    pub expense_date: Option<DateTime<Utc>>,
    /// Version the caller last saw; checked when present
    pub version: Option<i32>,
    /// Replacement receipt
    pub receipt: Option<ReceiptFile>,
}

impl ExpensePatch {
    pub fn validate(&self, now: DateTime<Utc>, max_receipt_bytes: usize) -> AppResult<()> {
        let mut errors = FieldErrors::new();
        if let Some(title) = &self.title {
            check_label(&mut errors, "title", "Title", title, MAX_TITLE_LENGTH);
        }
        if let Some(category) = &self.category {
            check_label(&mut errors, "category", "Category", category, MAX_CATEGORY_LENGTH);
        }
        check_notes(&mut errors, self.notes.as_deref());
        if let Some(amount) = self.amount {
            check_amount(&mut errors, amount);
        }
        check_date(&mut errors, self.expense_date, now);
        if let Some(file) = &self.receipt {
            errors.extend(file.validate("receipt", max_receipt_bytes));
        }
        errors.into_result()
    }
}

/// Data needed to insert an expense row.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub id: Uuid,
    pub username: String,
    pub title: String,
    pub category: String,
    pub notes: Option<String>,
    pub amount: Decimal,
    pub expense_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl NewExpense {
    /// Build the row for a validated request owned by `owner`.
    pub fn new(input: &CreateExpense, owner: &str, created_by: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: owner.to_string(),
            title: input.title.trim().to_string(),
            category: input.category.trim().to_string(),
            notes: normalize_notes(input.notes.as_deref()),
            amount: input.amount,
            expense_date: input.expense_date.unwrap_or(now),
            created_at: now,
            created_by: created_by.to_string(),
        }
    }
}

fn normalize_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

fn check_label(errors: &mut FieldErrors, field: &str, label: &str, value: &str, max_len: usize) {
    let trimmed = value.trim();
    if !trimmed.chars().any(char::is_alphanumeric) {
        errors.add(
            field,
            format!("{} must contain at least one alphanumeric character", label),
        );
    } else if trimmed.chars().count() > max_len {
        errors.add(field, format!("{} must be at most {} characters", label, max_len));
    }
}

fn check_notes(errors: &mut FieldErrors, notes: Option<&str>) {
    if let Some(notes) = notes {
        if notes.trim().chars().count() > MAX_NOTES_LENGTH {
            errors.add(
                "notes",
                format!("Notes must be at most {} characters", MAX_NOTES_LENGTH),
            );
        }
    }
}

fn check_amount(errors: &mut FieldErrors, amount: Decimal) {
    if amount <= Decimal::ZERO {
        errors.add("amount", "Amount must be greater than zero");
    } else if amount.normalize().scale() > MONEY_SCALE {
        errors.add(
            "amount",
            format!("Amount cannot have more than {} decimal places", MONEY_SCALE),
        );
    } else if amount >= Decimal::from(MAX_AMOUNT_UNITS) {
        errors.add("amount", "Amount is too large");
    }
}

fn check_date(errors: &mut FieldErrors, date: Option<DateTime<Utc>>, now: DateTime<Utc>) {
    if let Some(date) = date {
        if date > now {
            errors.add("expenseDate", "Expense date cannot be in the future");
        }
    }
}

/// Expense returned to clients
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseResponse {
    pub id: Uuid,
    #[schema(example = "user@example.com")]
    pub username: String,
    #[schema(example = "Coffee")]
    pub title: String,
    #[schema(example = "Food")]
    pub category: String,
    pub notes: Option<String>,
    #[schema(value_type = String, example = "4.50")]
    pub amount: Decimal,
    pub expense_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub version: i32,
    pub receipt: Option<ReceiptResponse>,
}

impl From<Expense> for ExpenseResponse {
    fn from(expense: Expense) -> Self {
        Self {
            id: expense.id,
            username: expense.username,
            title: expense.title,
            category: expense.category,
            notes: expense.notes,
            amount: expense.amount,
            expense_date: expense.expense_date,
            created_at: expense.created_at,
            updated_at: expense.updated_at,
            created_by: expense.created_by,
            updated_by: expense.updated_by,
            version: expense.version,
            receipt: expense.receipt.map(ReceiptResponse::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use chrono::Duration;

    const MAX_BYTES: usize = 1024;

    fn request(title: &str, category: &str, amount: Decimal) -> CreateExpense {
        CreateExpense {
            title: title.to_string(),
            category: category.to_string(),
            notes: None,
            amount,
            expense_date: None,
            receipt: None,
        }
    }

    fn field_errors(result: AppResult<()>) -> FieldErrors {
        match result {
            Err(AppError::InvalidFields(errors)) => errors,
            other => panic!("expected field errors, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_request_passes() {
        let input = request("Coffee", "Food", Decimal::new(450, 2));
        assert!(input.validate(Utc::now(), MAX_BYTES).is_ok());
    }

    #[test]
    fn test_amount_boundary() {
        let now = Utc::now();
        assert!(request("Coffee", "Food", Decimal::new(1, 2)).validate(now, MAX_BYTES).is_ok());

        let errors = field_errors(request("Coffee", "Food", Decimal::ZERO).validate(now, MAX_BYTES));
        assert!(errors.contains("amount"));

        let errors =
            field_errors(request("Coffee", "Food", Decimal::new(-500, 2)).validate(now, MAX_BYTES));
        assert!(errors.contains("amount"));
    }

    #[test]
    fn test_amount_precision() {
        let now = Utc::now();
        assert!(request("Coffee", "Food", Decimal::new(4500, 3)).validate(now, MAX_BYTES).is_ok());
        assert!(request("Coffee", "Food", Decimal::new(4501, 3)).validate(now, MAX_BYTES).is_err());
    }

    #[test]
    fn test_blank_text_rejected() {
        let errors = field_errors(request("   ", "--", Decimal::ONE).validate(Utc::now(), MAX_BYTES));
        assert_eq!(
            errors.messages("title"),
            ["Title must contain at least one alphanumeric character"]
        );
        assert!(errors.contains("category"));
    }

    #[test]
    fn test_all_violations_reported() {
        let mut input = request("", "", Decimal::ZERO);
        input.expense_date = Some(Utc::now() + Duration::days(1));
        input.receipt = Some(ReceiptFile::new("malware.exe", vec![1]));

        let errors = field_errors(input.validate(Utc::now(), MAX_BYTES));
        for field in ["title", "category", "amount", "expenseDate", "receipt"] {
            assert!(errors.contains(field), "missing violation for {field}");
        }
    }

    #[test]
    fn test_future_date_rejected() {
        let now = Utc::now();
        let mut input = request("Taxi", "Travel", Decimal::TEN);
        input.expense_date = Some(now + Duration::minutes(5));
        assert!(input.validate(now, MAX_BYTES).is_err());

        input.expense_date = Some(now);
        assert!(input.validate(now, MAX_BYTES).is_ok());
    }

    #[test]
    fn test_patch_validates_only_present_fields() {
        let now = Utc::now();
        let patch = ExpensePatch {
            notes: Some("updated".into()),
            ..Default::default()
        };
        assert!(patch.validate(now, MAX_BYTES).is_ok());

        let patch = ExpensePatch {
            amount: Some(Decimal::ZERO),
            ..Default::default()
        };
        assert!(field_errors(patch.validate(now, MAX_BYTES)).contains("amount"));
    }

    #[test]
    fn test_apply_patch() {
        let now = Utc::now();
        let mut expense = Expense::sample("a@x.com", "Coffee", "Food", Decimal::new(450, 2));
        expense.notes = Some("old".into());
        let patch = ExpensePatch {
            id: expense.id,
            title: Some("  Latte ".into()),
            notes: Some(String::new()),
            ..Default::default()
        };

        expense.apply(&patch, "admin@x.com", now);

        assert_eq!(expense.title, "Latte");
        assert_eq!(expense.category, "Food");
        assert_eq!(expense.notes, None);
        assert_eq!(expense.amount, Decimal::new(450, 2));
        assert_eq!(expense.updated_by.as_deref(), Some("admin@x.com"));
        assert_eq!(expense.updated_at, now);
    }

    #[test]
    fn test_new_expense_defaults_date_to_now() {
        let now = Utc::now();
        let input = request(" Coffee ", "Food", Decimal::new(450, 2));
        let row = NewExpense::new(&input, "b@x.com", "admin@x.com", now);

        assert_eq!(row.title, "Coffee");
        assert_eq!(row.expense_date, now);
        assert_eq!(row.username, "b@x.com");
        assert_eq!(row.created_by, "admin@x.com");
    }
}
