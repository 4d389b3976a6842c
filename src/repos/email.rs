use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    database::PostgresConnection,
    identities::{
        domain::email::EmailVerificationData,
        models::email::{EmailVerificationModel, NewEmailVerification},
    },
};

#[derive(Debug, Error)]
pub enum EmailVerificationError {
    #[error("no email verification exists with the provided token")]
    NotFound,

    #[error("the email verification token has expired")]
    Expired,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DynEmailRepo = Arc<dyn EmailRepo + Send + Sync>;

#[async_trait]
pub trait EmailRepo {
    async fn insert_verification(
        &self,
        email_verification: &NewEmailVerification,
    ) -> anyhow::Result<()>;

    async fn get_verification(&self, token: &str)
        -> anyhow::Result<Option<EmailVerificationData>>;

    /// Mark the email of the user who owns a verification token as verified.
    ///
    /// # Returns
    ///
    /// The ID of the user whose email was verified.
    async fn mark_email_as_verified(&self, token: &str) -> Result<Uuid, EmailVerificationError>;

    async fn delete_verification_by_token(&self, token: &str) -> anyhow::Result<()>;
}

#[async_trait]
impl EmailRepo for PostgresConnection {
    async fn insert_verification(
        &self,
        email_verification: &NewEmailVerification,
    ) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO email_verification (token, user_id) VALUES ($1, $2)")
            .bind(&email_verification.token)
            .bind(email_verification.user_id)
            .execute(&**self)
            .await?;

        Ok(())
    }

    async fn get_verification(
        &self,
        token: &str,
    ) -> anyhow::Result<Option<EmailVerificationData>> {
        let verification = sqlx::query_as::<_, EmailVerificationModel>(
            "SELECT token, user_id, created_at FROM email_verification WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&**self)
        .await?;

        Ok(verification.map(Into::into))
    }

    async fn mark_email_as_verified(&self, token: &str) -> Result<Uuid, EmailVerificationError> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE "user" u
            SET email_verified_at = COALESCE(u.email_verified_at, now())
            FROM email_verification v
            WHERE v.user_id = u.id AND v.token = $1
            RETURNING u.id
            "#,
        )
        .bind(token)
        .fetch_optional(&**self)
        .await
        .map_err(anyhow::Error::from)?;

        user_id.ok_or(EmailVerificationError::NotFound)
    }

    async fn delete_verification_by_token(&self, token: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM email_verification WHERE token = $1")
            .bind(token)
            .execute(&**self)
            .await?;

        Ok(())
    }
}
