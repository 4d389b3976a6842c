use std::{convert::TryFrom, sync::Arc};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    budgets::domain::{Budget, NewBudget},
    database::PostgresConnection,
    models::BudgetModel,
};

pub type DynBudgetRepo = Arc<dyn BudgetRepo + Send + Sync>;

#[async_trait]
pub trait BudgetRepo {
    /// List all of a user's budgets, most recently started first.
    async fn list_budgets(&self, user_id: Uuid) -> anyhow::Result<Vec<Budget>>;

    async fn get_budget(&self, user_id: Uuid, budget_id: Uuid) -> anyhow::Result<Option<Budget>>;

    async fn create_budget(&self, budget: &NewBudget) -> anyhow::Result<Budget>;

    /// Overwrite a budget owned by the user who owns `budget`.
    async fn update_budget(
        &self,
        budget_id: Uuid,
        budget: &NewBudget,
    ) -> anyhow::Result<Option<Budget>>;

    async fn delete_budget(&self, user_id: Uuid, budget_id: Uuid) -> anyhow::Result<bool>;
}

const BUDGET_SELECT: &str = r#"
    SELECT b.id, b.user_id, b.category_id,
        c.name AS category_name, c.color AS category_color, c.icon AS category_icon,
        b.amount, b.period, b.start_date, b.end_date, b.created_at, b.updated_at
    FROM budget b
        JOIN category c ON c.id = b.category_id
"#;

impl PostgresConnection {
    async fn fetch_budget(&self, budget_id: Uuid) -> anyhow::Result<Option<Budget>> {
        let model = sqlx::query_as::<_, BudgetModel>(&format!("{} WHERE b.id = $1", BUDGET_SELECT))
            .bind(budget_id)
            .fetch_optional(&**self)
            .await?;

        model.map(Budget::try_from).transpose()
    }
}

#[async_trait]
impl BudgetRepo for PostgresConnection {
    async fn list_budgets(&self, user_id: Uuid) -> anyhow::Result<Vec<Budget>> {
        sqlx::query_as::<_, BudgetModel>(&format!(
            "{} WHERE b.user_id = $1 ORDER BY b.start_date DESC, c.name",
            BUDGET_SELECT
        ))
        .bind(user_id)
        .fetch_all(&**self)
        .await?
        .into_iter()
        .map(Budget::try_from)
        .collect()
    }

    async fn get_budget(&self, user_id: Uuid, budget_id: Uuid) -> anyhow::Result<Option<Budget>> {
        let model = sqlx::query_as::<_, BudgetModel>(&format!(
            "{} WHERE b.id = $1 AND b.user_id = $2",
            BUDGET_SELECT
        ))
        .bind(budget_id)
        .bind(user_id)
        .fetch_optional(&**self)
        .await?;

        model.map(Budget::try_from).transpose()
    }

    async fn create_budget(&self, budget: &NewBudget) -> anyhow::Result<Budget> {
        let budget_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO budget (id, user_id, category_id, amount, period, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(budget.user_id)
        .bind(budget.category_id)
        .bind(budget.amount)
        .bind(budget.period.as_str())
        .bind(budget.start_date)
        .bind(budget.end_date)
        .fetch_one(&**self)
        .await?;

        self.fetch_budget(budget_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Budget {} vanished after insert.", budget_id))
    }

    async fn update_budget(
        &self,
        budget_id: Uuid,
        budget: &NewBudget,
    ) -> anyhow::Result<Option<Budget>> {
        let updated: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE budget
            SET category_id = $3, amount = $4, period = $5, start_date = $6,
                end_date = $7, updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING id
            "#,
        )
        .bind(budget_id)
        .bind(budget.user_id)
        .bind(budget.category_id)
        .bind(budget.amount)
        .bind(budget.period.as_str())
        .bind(budget.start_date)
        .bind(budget.end_date)
        .fetch_optional(&**self)
        .await?;

        match updated {
            Some(id) => self.fetch_budget(id).await,
            None => Ok(None),
        }
    }

    async fn delete_budget(&self, user_id: Uuid, budget_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM budget WHERE id = $1 AND user_id = $2")
            .bind(budget_id)
            .bind(user_id)
            .execute(&**self)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
