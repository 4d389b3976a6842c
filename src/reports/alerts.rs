use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    budgets::domain::{Budget, NotificationKind},
    expenses::domain::Expense,
};

use super::budget_status::{compute_budget_status, BudgetWithStatus};

const WARNING_THRESHOLD: Decimal = Decimal::from_parts(80, 0, 0, false, 0);

/// How close a budget is to its cap.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Warning,
    Exceeded,
}

impl AlertLevel {
    /// Classify a percentage of a budget that has been used.
    pub fn classify(percentage_used: Decimal) -> Option<Self> {
        if percentage_used >= Decimal::ONE_HUNDRED {
            Some(Self::Exceeded)
        } else if percentage_used >= WARNING_THRESHOLD {
            Some(Self::Warning)
        } else {
            None
        }
    }

    pub fn notification_kind(&self) -> NotificationKind {
        match self {
            Self::Warning => NotificationKind::BudgetWarning,
            Self::Exceeded => NotificationKind::BudgetExceeded,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BudgetAlert {
    pub budget_id: Uuid,
    pub category_name: String,
    pub level: AlertLevel,
    pub amount: Decimal,
    pub spent: Decimal,
    pub percentage_used: Decimal,
    pub message: String,
}

impl BudgetAlert {
    fn new(entry: &BudgetWithStatus, level: AlertLevel) -> Self {
        let budget = &entry.budget;
        let status = &entry.status;
        let message = match level {
            AlertLevel::Exceeded => format!(
                "You have exceeded your {} budget of {} by {}.",
                budget.category.name,
                budget.amount,
                -status.remaining
            ),
            AlertLevel::Warning => format!(
                "You have used {}% of your {} budget.",
                status.percentage_used.round_dp(0),
                budget.category.name
            ),
        };

        Self {
            budget_id: budget.id,
            category_name: budget.category.name.clone(),
            level,
            amount: budget.amount,
            spent: status.spent,
            percentage_used: status.percentage_used,
            message,
        }
    }
}

/// Classify each budget by how much of it has been used.
///
/// Budgets under the warning threshold produce no alert.
pub fn budget_alerts(budgets: &[BudgetWithStatus]) -> Vec<BudgetAlert> {
    budgets
        .iter()
        .filter_map(|entry| {
            AlertLevel::classify(entry.status.percentage_used)
                .map(|level| BudgetAlert::new(entry, level))
        })
        .collect()
}

/// Budgeted versus actual spending for one budget.
#[derive(Clone, Debug, PartialEq)]
pub struct BudgetAnalysis {
    pub budget_id: Uuid,
    pub category_name: String,
    pub budgeted: Decimal,
    pub actual: Decimal,
    pub remaining: Decimal,
    pub percentage_used: Decimal,
}

pub fn budget_analysis(budgets: &[Budget], expenses: &[Expense]) -> Vec<BudgetAnalysis> {
    budgets
        .iter()
        .map(|budget| {
            let status = compute_budget_status(budget, expenses);

            BudgetAnalysis {
                budget_id: budget.id,
                category_name: budget.category.name.clone(),
                budgeted: budget.amount,
                actual: status.spent,
                remaining: status.remaining,
                percentage_used: status.percentage_used,
            }
        })
        .collect()
}
