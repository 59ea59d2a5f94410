//! Receipt domain entity and uploaded file handling.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::ALLOWED_RECEIPT_EXTENSIONS;
use crate::errors::FieldErrors;

/// Receipt metadata. The stored bytes are loaded separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub id: Uuid,
    pub expense_id: Uuid,
    pub username: String,
    /// Display name (the uploaded file name)
    pub name: String,
    /// Category of the expense when the receipt was attached
    pub category: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Receipt metadata together with the stored file.
#[derive(Debug, Clone)]
pub struct ReceiptContent {
    pub receipt: Receipt,
    pub data: Vec<u8>,
}

/// A file uploaded as a receipt.
#[derive(Clone, PartialEq, Eq)]
pub struct ReceiptFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl std::fmt::Debug for ReceiptFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiptFile")
            .field("file_name", &self.file_name)
            .field("size", &self.data.len())
            .finish()
    }
}

impl ReceiptFile {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            data,
        }
    }

    /// Lowercased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }

    /// MIME type derived from the extension. Client-supplied types are not
    /// trusted.
    pub fn content_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("pdf") => "application/pdf",
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            _ => "application/octet-stream",
        }
    }

    pub fn size_bytes(&self) -> i64 {
        self.data.len() as i64
    }

    /// Collect every problem with this upload under `field`.
    pub fn validate(&self, field: &str, max_bytes: usize) -> FieldErrors {
        let mut errors = FieldErrors::new();

        let allowed = self
            .extension()
            .is_some_and(|ext| ALLOWED_RECEIPT_EXTENSIONS.contains(&ext.as_str()));
        if !allowed {
            errors.add(
                field,
                format!(
                    "Receipt must be one of: {}",
                    ALLOWED_RECEIPT_EXTENSIONS.join(", ")
                ),
            );
        }
        if self.data.is_empty() {
            errors.add(field, "Receipt file is empty");
        } else if self.data.len() > max_bytes {
            errors.add(field, format!("Receipt file exceeds {} bytes", max_bytes));
        }

        errors
    }
}

/// Data needed to store a receipt for an expense.
#[derive(Debug, Clone)]
pub struct NewReceipt {
    pub id: Uuid,
    pub expense_id: Uuid,
    pub username: String,
    pub category: String,
    pub file: ReceiptFile,
}

impl NewReceipt {
    pub fn new(expense_id: Uuid, username: &str, category: &str, file: ReceiptFile) -> Self {
        Self {
            id: Uuid::new_v4(),
            expense_id,
            username: username.to_string(),
            category: category.to_string(),
            file,
        }
    }
}

/// Receipt metadata returned to clients
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResponse {
    pub id: Uuid,
    pub expense_id: Uuid,
    pub username: String,
    #[schema(example = "lunch.pdf")]
    pub name: String,
    #[schema(example = "Food")]
    pub category: String,
    pub file_name: String,
    #[schema(example = "application/pdf")]
    pub content_type: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Receipt> for ReceiptResponse {
    fn from(receipt: Receipt) -> Self {
        Self {
            id: receipt.id,
            expense_id: receipt.expense_id,
            username: receipt.username,
            name: receipt.name,
            category: receipt.category,
            file_name: receipt.file_name,
            content_type: receipt.content_type,
            size_bytes: receipt.size_bytes,
            created_at: receipt.created_at,
            updated_at: receipt.updated_at,
        }
    }
}
