use std::{convert::TryFrom, sync::Arc};

use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    categories::domain::NewCategory,
    database::{is_unique_violation, PostgresConnection},
    identities::domain::users::{ProfileUpdate, User, UserCredentials},
    models::{NewUserModel, UserCredentialsModel, UserModel},
    passwords,
};

#[derive(Debug, Error)]
pub enum UserPersistenceError {
    #[error("duplicate email address: {0:?}")]
    DuplicateEmail(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DynUserRepo = Arc<dyn UserRepo + Send + Sync>;

#[async_trait]
pub trait UserRepo {
    /// Persist a new user along with their starting categories.
    ///
    /// Either everything is saved or nothing is.
    async fn persist_new_user(
        &self,
        user: &NewUserModel,
        categories: &[NewCategory],
    ) -> Result<User, UserPersistenceError>;

    async fn get_user(&self, user_id: Uuid) -> anyhow::Result<Option<User>>;

    /// Find the credentials for the user with a normalized email address.
    async fn get_credentials_by_email(
        &self,
        email: &str,
    ) -> anyhow::Result<Option<UserCredentials>>;

    async fn get_credentials(&self, user_id: Uuid) -> anyhow::Result<Option<UserCredentials>>;

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> anyhow::Result<Option<User>>;

    /// Replace a user's password hash.
    ///
    /// This is the only way a user's credential changes after registration.
    async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &passwords::Hash,
    ) -> anyhow::Result<()>;
}

const USER_COLUMNS: &str = r#"
    id, email, first_name, last_name, role, phone_number, profile_picture,
    preferences, email_verified_at, created_at, updated_at
"#;

#[async_trait]
impl UserRepo for PostgresConnection {
    async fn persist_new_user(
        &self,
        user: &NewUserModel,
        categories: &[NewCategory],
    ) -> Result<User, UserPersistenceError> {
        let mut tx = self.begin().await.map_err(anyhow::Error::from)?;

        let insert_result = sqlx::query_as::<_, UserModel>(&format!(
            r#"
            INSERT INTO "user" (id, email, password, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .fetch_one(&mut tx)
        .await;

        let saved = match insert_result {
            Ok(saved) => saved,
            Err(error) if is_unique_violation(&error) => {
                return Err(UserPersistenceError::DuplicateEmail(user.email.clone()))
            }
            Err(error) => return Err(anyhow::Error::from(error).into()),
        };

        if !categories.is_empty() {
            let mut query_builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
                "INSERT INTO category (id, user_id, name, description, color, icon, kind) ",
            );
            query_builder.push_values(categories, |mut row, category| {
                row.push_bind(Uuid::new_v4())
                    .push_bind(category.user_id)
                    .push_bind(&category.name)
                    .push_bind(&category.description)
                    .push_bind(&category.color)
                    .push_bind(&category.icon)
                    .push_bind(category.kind.as_str());
            });

            query_builder
                .build()
                .execute(&mut tx)
                .await
                .map_err(anyhow::Error::from)?;
        }

        tx.commit().await.map_err(anyhow::Error::from)?;

        Ok(User::try_from(saved)?)
    }

    async fn get_user(&self, user_id: Uuid) -> anyhow::Result<Option<User>> {
        let model = sqlx::query_as::<_, UserModel>(&format!(
            r#"SELECT {} FROM "user" WHERE id = $1"#,
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&**self)
        .await?;

        model.map(User::try_from).transpose()
    }

    async fn get_credentials_by_email(
        &self,
        email: &str,
    ) -> anyhow::Result<Option<UserCredentials>> {
        let model = sqlx::query_as::<_, UserCredentialsModel>(
            r#"
            SELECT id, email, role, password AS password_hash
            FROM "user"
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&**self)
        .await?;

        model.map(UserCredentials::try_from).transpose()
    }

    async fn get_credentials(&self, user_id: Uuid) -> anyhow::Result<Option<UserCredentials>> {
        let model = sqlx::query_as::<_, UserCredentialsModel>(
            r#"
            SELECT id, email, role, password AS password_hash
            FROM "user"
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&**self)
        .await?;

        model.map(UserCredentials::try_from).transpose()
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> anyhow::Result<Option<User>> {
        let model = sqlx::query_as::<_, UserModel>(&format!(
            r#"
            UPDATE "user"
            SET first_name = $2,
                last_name = $3,
                phone_number = CASE WHEN $4 THEN $5 ELSE phone_number END,
                preferences = COALESCE($6, preferences),
                updated_at = now()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(update.phone_number.is_some())
        .bind(update.phone_number.clone().flatten())
        .bind(&update.preferences)
        .fetch_optional(&**self)
        .await?;

        model.map(User::try_from).transpose()
    }

    async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &passwords::Hash,
    ) -> anyhow::Result<()> {
        sqlx::query(r#"UPDATE "user" SET password = $2, updated_at = now() WHERE id = $1"#)
            .bind(user_id)
            .bind(password_hash.as_str())
            .execute(&**self)
            .await?;

        Ok(())
    }
}
