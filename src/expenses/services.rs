use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    budgets::services::BudgetService,
    repos::{DynCategoryRepo, DynExpenseRepo},
};

use super::domain::{Expense, ExpenseData, ExpenseQuery, NewExpense};

#[derive(Debug, Error)]
pub enum ExpenseError {
    #[error("invalid expense data")]
    Invalid(#[from] ValidationErrors),

    #[error("expense not found")]
    NotFound,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct ExpenseService {
    budget_service: BudgetService,
    category_repo: DynCategoryRepo,
    expense_repo: DynExpenseRepo,
}

impl ExpenseService {
    pub fn new(
        budget_service: BudgetService,
        category_repo: DynCategoryRepo,
        expense_repo: DynExpenseRepo,
    ) -> Self {
        Self {
            budget_service,
            category_repo,
            expense_repo,
        }
    }

    pub async fn list_expenses(&self, query: &ExpenseQuery) -> anyhow::Result<Vec<Expense>> {
        self.expense_repo.list_expenses(query).await
    }

    pub async fn get_expense(
        &self,
        user_id: Uuid,
        expense_id: Uuid,
    ) -> Result<Expense, ExpenseError> {
        self.expense_repo
            .get_expense(user_id, expense_id)
            .await?
            .ok_or(ExpenseError::NotFound)
    }

    /// Record a new expense.
    ///
    /// The expense's category must belong to the same user. Once saved, any
    /// budget pushed over a threshold by the expense produces a notification.
    pub async fn create_expense(
        &self,
        user_id: Uuid,
        data: ExpenseData,
    ) -> Result<Expense, ExpenseError> {
        let new_expense = NewExpense::from_data(user_id, data)?;
        self.ensure_category_owned(&new_expense).await?;

        let expense = self.expense_repo.create_expense(&new_expense).await?;
        info!(expense_id = %expense.id, %user_id, "Created expense.");

        self.notify_budgets(&expense).await;

        Ok(expense)
    }

    pub async fn update_expense(
        &self,
        user_id: Uuid,
        expense_id: Uuid,
        data: ExpenseData,
    ) -> Result<Expense, ExpenseError> {
        let new_expense = NewExpense::from_data(user_id, data)?;
        self.ensure_category_owned(&new_expense).await?;

        let expense = self
            .expense_repo
            .update_expense(expense_id, &new_expense)
            .await?
            .ok_or(ExpenseError::NotFound)?;

        self.notify_budgets(&expense).await;

        Ok(expense)
    }

    pub async fn delete_expense(&self, user_id: Uuid, expense_id: Uuid) -> Result<(), ExpenseError> {
        if self.expense_repo.delete_expense(user_id, expense_id).await? {
            info!(%expense_id, %user_id, "Deleted expense.");

            Ok(())
        } else {
            Err(ExpenseError::NotFound)
        }
    }

    async fn notify_budgets(&self, expense: &Expense) {
        if let Err(error) = self.budget_service.record_alert_notifications(expense).await {
            error!(?error, expense_id = %expense.id, "Failed to record budget notifications.");
        }
    }

    async fn ensure_category_owned(&self, expense: &NewExpense) -> Result<(), ExpenseError> {
        if self
            .category_repo
            .get_category(expense.user_id, expense.category_id)
            .await?
            .is_none()
        {
            warn!(category_id = %expense.category_id, "Expense references unknown category.");

            let mut errors = ValidationErrors::new();
            let mut error = ValidationError::new("category");
            error.message = Some("Category not found.".into());
            errors.add("category_id", error);

            return Err(ExpenseError::Invalid(errors));
        }

        Ok(())
    }
}
