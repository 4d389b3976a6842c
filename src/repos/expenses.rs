use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    database::PostgresConnection,
    expenses::domain::{Expense, ExpenseQuery, NewExpense},
    models::ExpenseModel,
};

pub type DynExpenseRepo = Arc<dyn ExpenseRepo + Send + Sync>;

#[async_trait]
pub trait ExpenseRepo {
    /// List the expenses matching the provided query.
    ///
    /// Expenses are ordered newest first.
    async fn list_expenses(&self, query: &ExpenseQuery) -> anyhow::Result<Vec<Expense>>;

    async fn get_expense(&self, user_id: Uuid, expense_id: Uuid)
        -> anyhow::Result<Option<Expense>>;

    /// The sum of every expense a user has recorded.
    async fn total_spent(&self, user_id: Uuid) -> anyhow::Result<Decimal>;

    async fn create_expense(&self, expense: &NewExpense) -> anyhow::Result<Expense>;

    /// Overwrite an expense owned by the user who owns `expense`.
    ///
    /// # Returns
    ///
    /// The updated expense, or [`None`] if the user has no such expense.
    async fn update_expense(
        &self,
        expense_id: Uuid,
        expense: &NewExpense,
    ) -> anyhow::Result<Option<Expense>>;

    /// Delete an expense.
    ///
    /// # Returns
    ///
    /// A boolean indicating if the expense existed.
    async fn delete_expense(&self, user_id: Uuid, expense_id: Uuid) -> anyhow::Result<bool>;
}

const EXPENSE_SELECT: &str = r#"
    SELECT e.id, e.user_id, e.category_id,
        c.name AS category_name, c.color AS category_color, c.icon AS category_icon,
        e.amount, e.description, e."date", e.note, e.receipt, e.created_at, e.updated_at
    FROM expense e
        JOIN category c ON c.id = e.category_id
"#;

impl PostgresConnection {
    async fn fetch_expense(&self, expense_id: Uuid) -> anyhow::Result<Option<Expense>> {
        let model = sqlx::query_as::<_, ExpenseModel>(&format!("{} WHERE e.id = $1", EXPENSE_SELECT))
            .bind(expense_id)
            .fetch_optional(&**self)
            .await?;

        Ok(model.map(Expense::from))
    }
}

#[async_trait]
impl ExpenseRepo for PostgresConnection {
    async fn list_expenses(&self, query: &ExpenseQuery) -> anyhow::Result<Vec<Expense>> {
        let mut query_builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(EXPENSE_SELECT);

        query_builder
            .push(" WHERE e.user_id = ")
            .push_bind(query.user_id);

        if let Some(start) = query.start {
            query_builder.push(r#" AND e."date" >= "#).push_bind(start);
        }

        if let Some(end) = query.end {
            query_builder.push(r#" AND e."date" <= "#).push_bind(end);
        }

        if let Some(category_id) = query.category_id {
            query_builder
                .push(" AND e.category_id = ")
                .push_bind(category_id);
        }

        query_builder.push(r#" ORDER BY e."date" DESC, e.created_at DESC"#);

        if let Some(limit) = query.limit {
            query_builder.push(" LIMIT ").push_bind(limit);
        }

        let expenses = query_builder
            .build()
            .fetch_all(&**self)
            .await?
            .iter()
            .map(ExpenseModel::from_row)
            .collect::<Result<Vec<_>, sqlx::Error>>()?
            .into_iter()
            .map(Expense::from)
            .collect();

        Ok(expenses)
    }

    async fn get_expense(
        &self,
        user_id: Uuid,
        expense_id: Uuid,
    ) -> anyhow::Result<Option<Expense>> {
        let model = sqlx::query_as::<_, ExpenseModel>(&format!(
            "{} WHERE e.id = $1 AND e.user_id = $2",
            EXPENSE_SELECT
        ))
        .bind(expense_id)
        .bind(user_id)
        .fetch_optional(&**self)
        .await?;

        Ok(model.map(Expense::from))
    }

    async fn total_spent(&self, user_id: Uuid) -> anyhow::Result<Decimal> {
        let total: Decimal =
            sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0) FROM expense WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&**self)
                .await?;

        Ok(total)
    }

    async fn create_expense(&self, expense: &NewExpense) -> anyhow::Result<Expense> {
        let expense_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO expense (id, user_id, category_id, amount, description, "date", note, receipt)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(expense.user_id)
        .bind(expense.category_id)
        .bind(expense.amount)
        .bind(&expense.description)
        .bind(expense.date)
        .bind(&expense.note)
        .bind(&expense.receipt)
        .fetch_one(&**self)
        .await?;

        self.fetch_expense(expense_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Expense {} vanished after insert.", expense_id))
    }

    async fn update_expense(
        &self,
        expense_id: Uuid,
        expense: &NewExpense,
    ) -> anyhow::Result<Option<Expense>> {
        let updated: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE expense
            SET category_id = $3, amount = $4, description = $5, "date" = $6,
                note = $7, receipt = $8, updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING id
            "#,
        )
        .bind(expense_id)
        .bind(expense.user_id)
        .bind(expense.category_id)
        .bind(expense.amount)
        .bind(&expense.description)
        .bind(expense.date)
        .bind(&expense.note)
        .bind(&expense.receipt)
        .fetch_optional(&**self)
        .await?;

        match updated {
            Some(id) => self.fetch_expense(id).await,
            None => Ok(None),
        }
    }

    async fn delete_expense(&self, user_id: Uuid, expense_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM expense WHERE id = $1 AND user_id = $2")
            .bind(expense_id)
            .bind(user_id)
            .execute(&**self)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
