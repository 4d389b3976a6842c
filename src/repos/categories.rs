use std::{convert::TryFrom, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    categories::domain::{Category, NewCategory},
    database::{is_foreign_key_violation, PostgresConnection},
    models::CategoryModel,
};

#[derive(Debug, Error)]
pub enum CategoryDeletionError {
    /// Expenses or budgets still reference the category.
    #[error("category is still in use")]
    InUse,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DynCategoryRepo = Arc<dyn CategoryRepo + Send + Sync>;

#[async_trait]
pub trait CategoryRepo {
    /// List a user's categories ordered by name.
    async fn list_categories(&self, user_id: Uuid) -> anyhow::Result<Vec<Category>>;

    async fn get_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> anyhow::Result<Option<Category>>;

    async fn create_category(&self, category: &NewCategory) -> anyhow::Result<Category>;

    /// Overwrite a category owned by the user who owns `category`.
    ///
    /// # Returns
    ///
    /// The updated category, or [`None`] if the user has no such category.
    async fn update_category(
        &self,
        category_id: Uuid,
        category: &NewCategory,
    ) -> anyhow::Result<Option<Category>>;

    /// Delete a category.
    ///
    /// # Returns
    ///
    /// A boolean indicating if the category existed.
    async fn delete_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<bool, CategoryDeletionError>;
}

const CATEGORY_COLUMNS: &str =
    "id, user_id, name, description, color, icon, kind, created_at, updated_at";

#[async_trait]
impl CategoryRepo for PostgresConnection {
    async fn list_categories(&self, user_id: Uuid) -> anyhow::Result<Vec<Category>> {
        sqlx::query_as::<_, CategoryModel>(&format!(
            "SELECT {} FROM category WHERE user_id = $1 ORDER BY name, created_at",
            CATEGORY_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&**self)
        .await?
        .into_iter()
        .map(Category::try_from)
        .collect()
    }

    async fn get_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> anyhow::Result<Option<Category>> {
        let model = sqlx::query_as::<_, CategoryModel>(&format!(
            "SELECT {} FROM category WHERE id = $1 AND user_id = $2",
            CATEGORY_COLUMNS
        ))
        .bind(category_id)
        .bind(user_id)
        .fetch_optional(&**self)
        .await?;

        model.map(Category::try_from).transpose()
    }

    async fn create_category(&self, category: &NewCategory) -> anyhow::Result<Category> {
        let model = sqlx::query_as::<_, CategoryModel>(&format!(
            r#"
            INSERT INTO category (id, user_id, name, description, color, icon, kind)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(category.user_id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.color)
        .bind(&category.icon)
        .bind(category.kind.as_str())
        .fetch_one(&**self)
        .await?;

        Category::try_from(model)
    }

    async fn update_category(
        &self,
        category_id: Uuid,
        category: &NewCategory,
    ) -> anyhow::Result<Option<Category>> {
        let model = sqlx::query_as::<_, CategoryModel>(&format!(
            r#"
            UPDATE category
            SET name = $3, description = $4, color = $5, icon = $6, kind = $7,
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        ))
        .bind(category_id)
        .bind(category.user_id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.color)
        .bind(&category.icon)
        .bind(category.kind.as_str())
        .fetch_optional(&**self)
        .await?;

        model.map(Category::try_from).transpose()
    }

    async fn delete_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<bool, CategoryDeletionError> {
        let result = sqlx::query("DELETE FROM category WHERE id = $1 AND user_id = $2")
            .bind(category_id)
            .bind(user_id)
            .execute(&**self)
            .await;

        match result {
            Ok(done) => Ok(done.rows_affected() > 0),
            Err(error) if is_foreign_key_violation(&error) => Err(CategoryDeletionError::InUse),
            Err(error) => Err(anyhow::Error::from(error).into()),
        }
    }
}
