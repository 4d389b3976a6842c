use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    categories::http::reps::CategorySummaryRep,
    expenses::domain::{Expense, ExpenseQuery},
    reports::{parse_optional_date, DateError},
};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRep {
    pub id: Uuid,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
    pub category_id: Uuid,
    pub category: CategorySummaryRep,
    pub note: Option<String>,
    pub receipt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Expense> for ExpenseRep {
    fn from(expense: Expense) -> Self {
        Self {
            id: expense.id,
            amount: expense.amount,
            description: expense.description,
            date: expense.date,
            category_id: expense.category.id,
            category: expense.category.into(),
            note: expense.note,
            receipt: expense.receipt,
            created_at: expense.created_at,
            updated_at: expense.updated_at,
        }
    }
}

/// Filters accepted when listing expenses.
///
/// Dates are kept as raw strings so a malformed value is reported with the
/// date's own error message rather than a generic query rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseFilters {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub category_id: Option<Uuid>,
}

impl ExpenseFilters {
    pub fn into_query(self, user_id: Uuid) -> Result<ExpenseQuery, DateError> {
        let start = parse_optional_date(self.start_date.as_deref())?;
        let end = parse_optional_date(self.end_date.as_deref())?;

        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(DateError::InvertedRange { start, end });
            }
        }

        Ok(ExpenseQuery {
            user_id,
            start,
            end,
            category_id: self.category_id,
            limit: None,
        })
    }
}
