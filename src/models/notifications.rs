use std::convert::TryFrom;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::budgets::domain::Notification;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct NotificationModel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub budget_id: Option<Uuid>,
    pub kind: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<NotificationModel> for Notification {
    type Error = anyhow::Error;

    fn try_from(model: NotificationModel) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            budget_id: model.budget_id,
            kind: model.kind.parse()?,
            message: model.message,
            is_read: model.is_read,
            created_at: model.created_at,
        })
    }
}
