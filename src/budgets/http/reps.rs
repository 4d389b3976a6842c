use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    budgets::domain::{BudgetPeriod, Notification, NotificationKind},
    categories::http::reps::CategorySummaryRep,
    reports::{AlertLevel, BudgetAlert, BudgetWithStatus},
};

/// Decimal places kept when reporting percentages.
pub const PERCENTAGE_SCALE: u32 = 2;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRep {
    pub id: Uuid,
    pub category_id: Uuid,
    pub category: CategorySummaryRep,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub spent: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub percentage_used: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BudgetWithStatus> for BudgetRep {
    fn from(BudgetWithStatus { budget, status }: BudgetWithStatus) -> Self {
        Self {
            id: budget.id,
            category_id: budget.category.id,
            category: budget.category.into(),
            amount: budget.amount,
            period: budget.period,
            start_date: budget.start_date,
            end_date: budget.end_date,
            spent: status.spent,
            remaining: status.remaining,
            percentage_used: status.percentage_used.round_dp(PERCENTAGE_SCALE),
            created_at: budget.created_at,
            updated_at: budget.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRep {
    pub budget_id: Uuid,
    pub category_name: String,
    #[serde(rename = "type")]
    pub level: AlertLevel,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub spent: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub percentage_used: Decimal,
    pub message: String,
}

impl From<BudgetAlert> for AlertRep {
    fn from(alert: BudgetAlert) -> Self {
        Self {
            budget_id: alert.budget_id,
            category_name: alert.category_name,
            level: alert.level,
            amount: alert.amount,
            spent: alert.spent,
            percentage_used: alert.percentage_used.round_dp(PERCENTAGE_SCALE),
            message: alert.message,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRep {
    pub id: Uuid,
    pub budget_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationRep {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id,
            budget_id: notification.budget_id,
            kind: notification.kind,
            message: notification.message,
            is_read: notification.is_read,
            created_at: notification.created_at,
        }
    }
}
