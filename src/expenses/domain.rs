use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, trace};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::categories::domain::CategoryRef;

/// The number of decimal places allowed in monetary amounts.
pub const AMOUNT_SCALE: u32 = 2;

/// Amounts are stored as `NUMERIC(12, 2)`, so they must stay below this.
pub const AMOUNT_LIMIT: i64 = 10_000_000_000;

/// An expense that has been persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct Expense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: CategoryRef,
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub receipt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Expense information provided by a user.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseData {
    /// The amount spent. Accepts JSON numbers or numeric strings.
    #[validate(custom = "validate_expense_amount")]
    pub amount: Decimal,

    #[validate(length(min = 1, max = 255, message = "Description is required."))]
    pub description: String,

    /// The day the money was spent.
    pub date: NaiveDate,

    pub category_id: Uuid,

    #[validate(length(max = 1000, message = "Notes may not exceed 1000 characters."))]
    pub note: Option<String>,

    /// A reference to an uploaded receipt, such as a URL.
    #[validate(length(max = 1000))]
    pub receipt: Option<String>,
}

/// Ensure an amount is positive and has no more than two decimal places.
pub fn validate_expense_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() || amount.is_zero() {
        let mut error = ValidationError::new("positive");
        error.message = Some("Amount must be greater than zero.".into());

        return Err(error);
    }

    validate_precision(amount)
}

/// Ensure an amount fits the stored column.
pub(crate) fn validate_precision(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.abs() >= Decimal::from(AMOUNT_LIMIT) {
        let mut error = ValidationError::new("max");
        error.message = Some("Amounts must be less than 10,000,000,000.".into());

        return Err(error);
    }

    if amount.normalize().scale() > AMOUNT_SCALE {
        let mut error = ValidationError::new("scale");
        error.message = Some("Amounts may not have more than two decimal places.".into());

        return Err(error);
    }

    Ok(())
}

/// A validated expense that has not been persisted yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NewExpense {
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub receipt: Option<String>,
}

impl NewExpense {
    /// Construct a new expense from a set of input data.
    ///
    /// The expense is only constructed if the input data meets all the
    /// validation rules. Ownership of the referenced category is checked by
    /// the caller since it requires a lookup.
    ///
    /// # Arguments
    /// * `user_id` - The ID of the user who owns the expense.
    /// * `data` - The input data describing the expense.
    pub fn from_data(user_id: Uuid, data: ExpenseData) -> Result<Self, ValidationErrors> {
        if let Err(validation_error) = data.validate() {
            debug!(?validation_error, "New expense failed validation.");

            return Err(validation_error);
        }

        trace!("New expense passed validation.");

        Ok(Self {
            user_id,
            category_id: data.category_id,
            amount: data.amount.normalize(),
            description: data.description.trim().to_owned(),
            date: data.date,
            note: data.note.filter(|note| !note.trim().is_empty()),
            receipt: data.receipt.filter(|receipt| !receipt.trim().is_empty()),
        })
    }
}

/// Parameters for listing a user's expenses.
#[derive(Clone, Debug, Default)]
pub struct ExpenseQuery {
    pub user_id: Uuid,
    /// Only include expenses on or after this date.
    pub start: Option<NaiveDate>,
    /// Only include expenses on or before this date.
    pub end: Option<NaiveDate>,
    pub category_id: Option<Uuid>,
    pub limit: Option<i64>,
}

impl ExpenseQuery {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id,
            ..Default::default()
        }
    }
}
