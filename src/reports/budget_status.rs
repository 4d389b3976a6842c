use rust_decimal::Decimal;

use crate::{budgets::domain::Budget, expenses::domain::Expense};

/// Derived spending figures for a budget. Never persisted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BudgetStatus {
    pub spent: Decimal,
    pub remaining: Decimal,
    /// Unrounded percentage of the budget that has been spent.
    pub percentage_used: Decimal,
}

/// A budget paired with its computed status.
#[derive(Clone, Debug, PartialEq)]
pub struct BudgetWithStatus {
    pub budget: Budget,
    pub status: BudgetStatus,
}

/// Compute how much of a budget has been used.
///
/// Only expenses in the budget's category with a date inside the budget's
/// inclusive window are counted. A budget with an amount of zero always
/// reports 0% used.
pub fn compute_budget_status(budget: &Budget, expenses: &[Expense]) -> BudgetStatus {
    let window = budget.window();
    let spent: Decimal = expenses
        .iter()
        .filter(|expense| expense.category.id == budget.category.id)
        .filter(|expense| window.contains(expense.date))
        .map(|expense| expense.amount)
        .sum();

    let percentage_used = if budget.amount.is_zero() {
        Decimal::ZERO
    } else {
        spent * Decimal::ONE_HUNDRED / budget.amount
    };

    BudgetStatus {
        spent,
        remaining: budget.amount - spent,
        percentage_used,
    }
}

/// Attach a status to each budget.
pub fn with_status(budgets: Vec<Budget>, expenses: &[Expense]) -> Vec<BudgetWithStatus> {
    budgets
        .into_iter()
        .map(|budget| {
            let status = compute_budget_status(&budget, expenses);

            BudgetWithStatus { budget, status }
        })
        .collect()
}
