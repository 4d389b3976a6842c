use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;
use validator::ValidationErrors;

use crate::repos::{CategoryDeletionError, DynCategoryRepo};

use super::domain::{Category, CategoryData, NewCategory};

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("invalid category data")]
    Invalid(#[from] ValidationErrors),

    #[error("category not found")]
    NotFound,

    /// The category is still referenced by expenses or budgets.
    #[error("category is in use")]
    InUse,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct CategoryService {
    category_repo: DynCategoryRepo,
}

impl CategoryService {
    pub fn new(category_repo: DynCategoryRepo) -> Self {
        Self { category_repo }
    }

    pub async fn list_categories(&self, user_id: Uuid) -> anyhow::Result<Vec<Category>> {
        self.category_repo.list_categories(user_id).await
    }

    pub async fn get_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<Category, CategoryError> {
        self.category_repo
            .get_category(user_id, category_id)
            .await?
            .ok_or(CategoryError::NotFound)
    }

    pub async fn create_category(
        &self,
        user_id: Uuid,
        data: CategoryData,
    ) -> Result<Category, CategoryError> {
        let new_category = NewCategory::from_data(user_id, data)?;
        let category = self.category_repo.create_category(&new_category).await?;

        info!(category_id = %category.id, %user_id, "Created category.");

        Ok(category)
    }

    pub async fn update_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        data: CategoryData,
    ) -> Result<Category, CategoryError> {
        let new_category = NewCategory::from_data(user_id, data)?;

        self.category_repo
            .update_category(category_id, &new_category)
            .await?
            .ok_or(CategoryError::NotFound)
    }

    pub async fn delete_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<(), CategoryError> {
        match self.category_repo.delete_category(user_id, category_id).await {
            Ok(true) => {
                info!(%category_id, %user_id, "Deleted category.");

                Ok(())
            }
            Ok(false) => Err(CategoryError::NotFound),
            Err(CategoryDeletionError::InUse) => {
                debug!(%category_id, "Refused to delete category in use.");

                Err(CategoryError::InUse)
            }
            Err(CategoryDeletionError::Other(error)) => Err(error.into()),
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;
    use crate::{categories::domain::CategoryKind, repos::memory::MemoryStore};

    fn data(name: &str) -> CategoryData {
        CategoryData {
            name: name.to_owned(),
            description: None,
            color: None,
            icon: None,
            kind: CategoryKind::Expense,
        }
    }

    #[tokio::test]
    async fn categories_are_scoped_to_owner() {
        let service = CategoryService::new(Arc::new(MemoryStore::new()));
        let owner = Uuid::new_v4();
        let category = service.create_category(owner, data("Pets")).await.unwrap();

        assert_eq!(category, service.get_category(owner, category.id).await.unwrap());
        assert!(matches!(
            service.get_category(Uuid::new_v4(), category.id).await,
            Err(CategoryError::NotFound)
        ));
        assert!(matches!(
            service
                .update_category(Uuid::new_v4(), category.id, data("Stolen"))
                .await,
            Err(CategoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn list_orders_by_name() {
        let service = CategoryService::new(Arc::new(MemoryStore::new()));
        let owner = Uuid::new_v4();
        for name in ["Travel", "Books", "Garden"] {
            service.create_category(owner, data(name)).await.unwrap();
        }

        let names: Vec<_> = service
            .list_categories(owner)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();

        assert_eq!(vec!["Books", "Garden", "Travel"], names);
    }

    #[tokio::test]
    async fn create_rejects_invalid_data() {
        let service = CategoryService::new(Arc::new(MemoryStore::new()));

        let result = service.create_category(Uuid::new_v4(), data("")).await;

        assert!(matches!(result, Err(CategoryError::Invalid(_))));
    }

    #[tokio::test]
    async fn delete_missing_category() {
        let service = CategoryService::new(Arc::new(MemoryStore::new()));

        let result = service
            .delete_category(Uuid::new_v4(), Uuid::new_v4())
            .await;

        assert!(matches!(result, Err(CategoryError::NotFound)));
    }
}
