use std::convert::TryFrom;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::categories::domain::Category;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct CategoryModel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: Option<String>,
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CategoryModel> for Category {
    type Error = anyhow::Error;

    fn try_from(model: CategoryModel) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            description: model.description,
            color: model.color,
            icon: model.icon,
            kind: model.kind.parse()?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
