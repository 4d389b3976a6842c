use std::{convert::TryFrom, sync::Arc};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    budgets::domain::{NewNotification, Notification, NotificationKind},
    database::PostgresConnection,
    models::NotificationModel,
};

pub type DynNotificationRepo = Arc<dyn NotificationRepo + Send + Sync>;

/// The most notifications returned in a single listing.
pub const NOTIFICATION_PAGE_SIZE: i64 = 50;

#[async_trait]
pub trait NotificationRepo {
    /// List a user's most recent notifications, newest first.
    async fn list_notifications(&self, user_id: Uuid) -> anyhow::Result<Vec<Notification>>;

    /// Determine if a budget already has an unread notification of a kind.
    async fn has_unread(
        &self,
        user_id: Uuid,
        budget_id: Uuid,
        kind: NotificationKind,
    ) -> anyhow::Result<bool>;

    async fn create_notification(
        &self,
        notification: &NewNotification,
    ) -> anyhow::Result<Notification>;

    /// Mark a notification as read.
    ///
    /// # Returns
    ///
    /// The updated notification, or [`None`] if the user has no such
    /// notification.
    async fn mark_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> anyhow::Result<Option<Notification>>;
}

const NOTIFICATION_COLUMNS: &str = "id, user_id, budget_id, kind, message, is_read, created_at";

#[async_trait]
impl NotificationRepo for PostgresConnection {
    async fn list_notifications(&self, user_id: Uuid) -> anyhow::Result<Vec<Notification>> {
        sqlx::query_as::<_, NotificationModel>(&format!(
            "SELECT {} FROM notification WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
            NOTIFICATION_COLUMNS
        ))
        .bind(user_id)
        .bind(NOTIFICATION_PAGE_SIZE)
        .fetch_all(&**self)
        .await?
        .into_iter()
        .map(Notification::try_from)
        .collect()
    }

    async fn has_unread(
        &self,
        user_id: Uuid,
        budget_id: Uuid,
        kind: NotificationKind,
    ) -> anyhow::Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM notification
                WHERE user_id = $1 AND budget_id = $2 AND kind = $3 AND NOT is_read
            )
            "#,
        )
        .bind(user_id)
        .bind(budget_id)
        .bind(kind.as_str())
        .fetch_one(&**self)
        .await?;

        Ok(exists)
    }

    async fn create_notification(
        &self,
        notification: &NewNotification,
    ) -> anyhow::Result<Notification> {
        let model = sqlx::query_as::<_, NotificationModel>(&format!(
            r#"
            INSERT INTO notification (id, user_id, budget_id, kind, message)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(notification.user_id)
        .bind(notification.budget_id)
        .bind(notification.kind.as_str())
        .bind(&notification.message)
        .fetch_one(&**self)
        .await?;

        Notification::try_from(model)
    }

    async fn mark_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> anyhow::Result<Option<Notification>> {
        let model = sqlx::query_as::<_, NotificationModel>(&format!(
            r#"
            UPDATE notification SET is_read = true
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(notification_id)
        .bind(user_id)
        .fetch_optional(&**self)
        .await?;

        model.map(Notification::try_from).transpose()
    }
}
