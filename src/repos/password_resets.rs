use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    database::PostgresConnection,
    identities::{
        domain::password_resets::PasswordResetTokenData,
        models::password_resets::{NewPasswordResetModel, PasswordReset},
    },
};

pub type DynPasswordResetRepo = Arc<dyn PasswordResetRepo + Send + Sync>;

#[async_trait]
pub trait PasswordResetRepo {
    async fn insert_reset(&self, reset: &NewPasswordResetModel) -> anyhow::Result<()>;

    async fn get_reset(&self, token: &str) -> anyhow::Result<Option<PasswordResetTokenData>>;

    /// Remove every outstanding reset token belonging to a user.
    async fn delete_resets_for_user(&self, user_id: Uuid) -> anyhow::Result<()>;
}

#[async_trait]
impl PasswordResetRepo for PostgresConnection {
    async fn insert_reset(&self, reset: &NewPasswordResetModel) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO password_reset (token, user_id) VALUES ($1, $2)")
            .bind(&reset.token)
            .bind(reset.user_id)
            .execute(&**self)
            .await?;

        Ok(())
    }

    async fn get_reset(&self, token: &str) -> anyhow::Result<Option<PasswordResetTokenData>> {
        let reset = sqlx::query_as::<_, PasswordReset>(
            "SELECT token, user_id, created_at FROM password_reset WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&**self)
        .await?;

        Ok(reset.map(Into::into))
    }

    async fn delete_resets_for_user(&self, user_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM password_reset WHERE user_id = $1")
            .bind(user_id)
            .execute(&**self)
            .await?;

        Ok(())
    }
}
