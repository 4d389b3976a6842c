use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::categories::domain::{Category, CategoryKind, CategoryRef};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRep {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: Option<String>,
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryRep {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            color: category.color,
            icon: category.icon,
            kind: category.kind,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

/// The summary of a category embedded in expenses and budgets.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CategorySummaryRep {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub icon: Option<String>,
}

impl From<CategoryRef> for CategorySummaryRep {
    fn from(category: CategoryRef) -> Self {
        Self {
            id: category.id,
            name: category.name,
            color: category.color,
            icon: category.icon,
        }
    }
}
