//! Multipart form extractor for expense create/update requests.
//!
//! Text fields are collected by name; a file part named `receipt` becomes the
//! uploaded receipt. Parsing failures are reported per field.

use std::collections::HashMap;
use std::str::FromStr;

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::params::parse_timestamp;
use crate::domain::{CreateExpense, ExpensePatch, ReceiptFile};
use crate::errors::{AppError, AppResult, FieldErrors};

/// Name of the multipart part carrying the receipt file
pub const RECEIPT_FIELD: &str = "receipt";

/// Raw multipart expense form
#[derive(Debug, Default)]
pub struct ExpenseForm {
    fields: HashMap<String, String>,
    pub receipt: Option<ReceiptFile>,
}

#[async_trait]
impl<S> FromRequest<S> for ExpenseForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let mut form = ExpenseForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?;
                    // Browsers send an empty part for an untouched file input
                    if name == RECEIPT_FIELD && !(file_name.is_empty() && data.is_empty()) {
                        form.receipt = Some(ReceiptFile::new(file_name, data.to_vec()));
                    }
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }
}

impl ExpenseForm {
    pub fn from_parts(fields: HashMap<String, String>, receipt: Option<ReceiptFile>) -> Self {
        Self { fields, receipt }
    }

    fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    /// Parse a field; blank values count as absent.
    fn parse<T>(
        &self,
        name: &str,
        errors: &mut FieldErrors,
        parse: impl Fn(&str) -> Result<T, String>,
    ) -> Option<T> {
        let raw = self.fields.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())?;
        match parse(raw) {
            Ok(value) => Some(value),
            Err(message) => {
                errors.add(name, message);
                None
            }
        }
    }

    fn amount(&self, errors: &mut FieldErrors) -> Option<Decimal> {
        self.parse("amount", errors, |raw| {
            Decimal::from_str(raw).map_err(|_| "Amount must be a decimal number".to_string())
        })
    }

    /// Build a create request.
    pub fn into_create(self) -> AppResult<CreateExpense> {
        let mut errors = FieldErrors::new();
        let amount = self.amount(&mut errors);
        if amount.is_none() && !errors.contains("amount") {
            errors.add("amount", "Amount is required");
        }
        let expense_date = self.parse("expenseDate", &mut errors, |raw| {
            parse_timestamp("expenseDate", raw)
        });
        errors.into_result()?;

        Ok(CreateExpense {
            title: self.text("title").unwrap_or_default(),
            category: self.text("category").unwrap_or_default(),
            notes: self.text("notes"),
            amount: amount.unwrap_or_default(),
            expense_date,
            receipt: self.receipt,
        })
    }

    /// Build a partial update; only supplied fields are set.
    pub fn into_patch(self) -> AppResult<ExpensePatch> {
        let mut errors = FieldErrors::new();
        let id = self.parse("id", &mut errors, |raw| {
            Uuid::parse_str(raw).map_err(|_| "Id must be a UUID".to_string())
        });
        if id.is_none() && !errors.contains("id") {
            errors.add("id", "Id is required");
        }
        let amount = self.amount(&mut errors);
        let expense_date = self.parse("expenseDate", &mut errors, |raw| {
            parse_timestamp("expenseDate", raw)
        });
        let version = self.parse("version", &mut errors, |raw| {
            raw.parse::<i32>()
                .map_err(|_| "Version must be an integer".to_string())
        });
        errors.into_result()?;

        Ok(ExpensePatch {
            id: id.unwrap_or_default(),
            title: self.text("title"),
            category: self.text("category"),
            notes: self.text("notes"),
            amount,
            expense_date,
            version,
            receipt: self.receipt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> ExpenseForm {
        let fields = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ExpenseForm::from_parts(fields, None)
    }

    #[test]
    fn test_create_parses_fields() {
        let input = form(&[
            ("title", "Coffee"),
            ("category", "Food"),
            ("amount", "4.50"),
            ("expenseDate", "2024-03-01"),
        ])
        .into_create()
        .unwrap();

        assert_eq!(input.amount, Decimal::new(450, 2));
        assert_eq!(input.expense_date.unwrap().to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn test_create_reports_unparseable_values() {
        let err = form(&[("amount", "lots"), ("expenseDate", "yesterday")])
            .into_create()
            .unwrap_err();

        match err {
            AppError::InvalidFields(fields) => {
                assert!(fields.contains("amount"));
                assert!(fields.contains("expenseDate"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_patch_keeps_absent_fields_unset() {
        let id = Uuid::new_v4();
        let patch = form(&[("id", &id.to_string()), ("notes", "")])
            .into_patch()
            .unwrap();

        assert_eq!(patch.id, id);
        assert_eq!(patch.notes.as_deref(), Some(""));
        assert!(patch.amount.is_none());
        assert!(patch.title.is_none());
    }

    #[test]
    fn test_patch_requires_id() {
        assert!(form(&[("title", "x")]).into_patch().is_err());
    }
}
