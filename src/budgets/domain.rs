use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    categories::domain::CategoryRef, expenses::domain::validate_precision, reports::dates::DateRange,
};

/// The length of time a budget's cap applies to.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    #[default]
    Monthly,
    Yearly,
}

impl BudgetPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// The period of this kind that contains `day`.
    pub fn containing(&self, day: NaiveDate) -> DateRange {
        match self {
            Self::Monthly => DateRange::month_of(day),
            Self::Yearly => DateRange::year_of(day),
        }
    }
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown budget period: {0:?}")]
pub struct UnknownBudgetPeriod(String);

impl FromStr for BudgetPeriod {
    type Err = UnknownBudgetPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(UnknownBudgetPeriod(other.to_owned())),
        }
    }
}

/// A spending cap for one category over a date range.
#[derive(Clone, Debug, PartialEq)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: CategoryRef,
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// The inclusive range of dates the budget covers.
    pub fn window(&self) -> DateRange {
        // The database rejects inverted dates, so the fallback is unreachable
        // for persisted budgets.
        DateRange::new(self.start_date, self.end_date)
            .unwrap_or_else(|_| DateRange::month_of(self.start_date))
    }

    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        self.window().contains(day)
    }
}

/// Budget information provided by a user.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_budget_dates", skip_on_field_errors = false))]
pub struct BudgetData {
    #[validate(custom = "validate_budget_amount")]
    pub amount: Decimal,

    pub category_id: Uuid,

    #[serde(default)]
    pub period: BudgetPeriod,

    /// Defaults to the start of the current period.
    pub start_date: Option<NaiveDate>,

    /// Defaults to the end of the current period.
    pub end_date: Option<NaiveDate>,
}

fn validate_budget_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        let mut error = ValidationError::new("non_negative");
        error.message = Some("Budget amount may not be negative.".into());

        return Err(error);
    }

    validate_precision(amount)
}

fn validate_budget_dates(data: &BudgetData) -> Result<(), ValidationError> {
    match (data.start_date, data.end_date) {
        (Some(start), Some(end)) if start > end => {
            let mut error = ValidationError::new("date_order");
            error.message = Some("End date must not be before the start date.".into());

            Err(error)
        }
        (Some(_), None) | (None, Some(_)) => {
            let mut error = ValidationError::new("date_pair");
            error.message = Some("Provide both a start and end date, or neither.".into());

            Err(error)
        }
        _ => Ok(()),
    }
}

/// A validated budget that has not been persisted yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NewBudget {
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl NewBudget {
    /// Construct a budget from user provided data.
    ///
    /// # Arguments
    /// * `user_id` - The ID of the budget's owner.
    /// * `data` - The user's input.
    /// * `today` - Used to fill in the budget's dates when they are omitted.
    pub fn from_data(
        user_id: Uuid,
        data: BudgetData,
        today: NaiveDate,
    ) -> Result<Self, ValidationErrors> {
        if let Err(validation_error) = data.validate() {
            debug!(?validation_error, "New budget failed validation.");

            return Err(validation_error);
        }

        let window = match (data.start_date, data.end_date) {
            (Some(start), Some(end)) => DateRange::new(start, end).map_err(|_| {
                let mut errors = ValidationErrors::new();
                errors.add("endDate", ValidationError::new("date_order"));

                errors
            })?,
            _ => data.period.containing(today),
        };

        Ok(Self {
            user_id,
            category_id: data.category_id,
            amount: data.amount.normalize(),
            period: data.period,
            start_date: window.start(),
            end_date: window.end(),
        })
    }
}

/// The kinds of notifications the application records.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BudgetExceeded,
    BudgetWarning,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BudgetExceeded => "budget_exceeded",
            Self::BudgetWarning => "budget_warning",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown notification kind: {0:?}")]
pub struct UnknownNotificationKind(String);

impl FromStr for NotificationKind {
    type Err = UnknownNotificationKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "budget_exceeded" => Ok(Self::BudgetExceeded),
            "budget_warning" => Ok(Self::BudgetWarning),
            other => Err(UnknownNotificationKind(other.to_owned())),
        }
    }
}

/// An informational message for a user.
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub budget_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub budget_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub message: String,
}
