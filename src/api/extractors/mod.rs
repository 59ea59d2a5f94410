//! Custom request extractors.

mod expense_form;
pub mod params;
mod validated_json;

pub use expense_form::{ExpenseForm, RECEIPT_FIELD};
pub use params::{parse_bounds, parse_timestamp, TargetQuery};
pub use validated_json::ValidatedJson;
