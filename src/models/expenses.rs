use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{categories::domain::CategoryRef, expenses::domain::Expense};

/// An expense joined with the category it is tagged with.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ExpenseModel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub category_name: String,
    pub category_color: String,
    pub category_icon: Option<String>,
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub receipt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ExpenseModel> for Expense {
    fn from(model: ExpenseModel) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            category: CategoryRef {
                id: model.category_id,
                name: model.category_name,
                color: model.category_color,
                icon: model.category_icon,
            },
            amount: model.amount,
            description: model.description,
            date: model.date,
            note: model.note,
            receipt: model.receipt,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
