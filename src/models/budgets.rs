use std::convert::TryFrom;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{budgets::domain::Budget, categories::domain::CategoryRef};

/// A budget joined with the category it caps.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct BudgetModel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub category_name: String,
    pub category_color: String,
    pub category_icon: Option<String>,
    pub amount: Decimal,
    pub period: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BudgetModel> for Budget {
    type Error = anyhow::Error;

    fn try_from(model: BudgetModel) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            category: CategoryRef {
                id: model.category_id,
                name: model.category_name,
                color: model.category_color,
                icon: model.category_icon,
            },
            amount: model.amount,
            period: model.period.parse()?,
            start_date: model.start_date,
            end_date: model.end_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
