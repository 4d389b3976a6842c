use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

/// Color assigned to categories created without one.
pub const DEFAULT_COLOR: &str = "#666666";

/// Whether a category tracks money going out or coming in.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    #[default]
    Expense,
    Income,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown category kind: {0:?}")]
pub struct UnknownCategoryKind(String);

impl FromStr for CategoryKind {
    type Err = UnknownCategoryKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expense" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            other => Err(UnknownCategoryKind(other.to_owned())),
        }
    }
}

/// A category owned by a user.
#[derive(Clone, Debug, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: Option<String>,
    pub kind: CategoryKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn to_ref(&self) -> CategoryRef {
        CategoryRef {
            id: self.id,
            name: self.name.clone(),
            color: self.color.clone(),
            icon: self.icon.clone(),
        }
    }
}

/// The parts of a category embedded in the expenses and budgets that reference
/// it.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryRef {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub icon: Option<String>,
}

/// Category information provided by a user.
#[derive(Debug, Deserialize, Validate)]
pub struct CategoryData {
    #[validate(length(min = 1, max = 100, message = "Category name is required."))]
    pub name: String,

    #[validate(length(max = 500, message = "Descriptions may not exceed 500 characters."))]
    pub description: Option<String>,

    /// A hex color such as `#1a2b3c`.
    #[validate(custom = "validate_color")]
    pub color: Option<String>,

    pub icon: Option<String>,

    #[serde(rename = "type", default)]
    pub kind: CategoryKind,
}

fn validate_color(color: &str) -> Result<(), ValidationError> {
    let digits = color.strip_prefix('#').unwrap_or_default();
    let is_hex = matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit());

    if is_hex {
        Ok(())
    } else {
        let mut error = ValidationError::new("color");
        error.message = Some("Colors must be hex values like #a1b2c3.".into());

        Err(error)
    }
}

/// A validated category that has not been persisted yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NewCategory {
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: Option<String>,
    pub kind: CategoryKind,
}

impl NewCategory {
    /// Construct a category from user provided data.
    ///
    /// # Arguments
    /// * `user_id` - The ID of the category's owner.
    /// * `data` - The user's input.
    ///
    /// # Returns
    /// The new category, or the set of [`ValidationErrors`] describing why the
    /// data was rejected.
    pub fn from_data(user_id: Uuid, data: CategoryData) -> Result<Self, ValidationErrors> {
        if let Err(validation_error) = data.validate() {
            debug!(?validation_error, "New category failed validation.");

            return Err(validation_error);
        }

        Ok(Self {
            user_id,
            name: data.name.trim().to_owned(),
            description: data.description.filter(|d| !d.trim().is_empty()),
            color: data.color.unwrap_or_else(|| DEFAULT_COLOR.to_owned()),
            icon: data.icon,
            kind: data.kind,
        })
    }
}

const DEFAULT_CATEGORIES: [(&str, CategoryKind, &str, &str); 12] = [
    (
        "Food & Dining",
        CategoryKind::Expense,
        "Restaurants, groceries, and food delivery",
        "🍽️",
    ),
    (
        "Transportation",
        CategoryKind::Expense,
        "Public transit, fuel, car maintenance",
        "🚗",
    ),
    (
        "Housing",
        CategoryKind::Expense,
        "Rent, utilities, maintenance",
        "🏠",
    ),
    (
        "Entertainment",
        CategoryKind::Expense,
        "Movies, games, hobbies",
        "🎮",
    ),
    (
        "Shopping",
        CategoryKind::Expense,
        "Clothing, electronics, personal items",
        "🛍️",
    ),
    (
        "Healthcare",
        CategoryKind::Expense,
        "Medical expenses, medications, insurance",
        "⚕️",
    ),
    (
        "Education",
        CategoryKind::Expense,
        "Tuition, books, courses",
        "📚",
    ),
    (
        "Bills & Utilities",
        CategoryKind::Expense,
        "Phone, internet, electricity",
        "📱",
    ),
    (
        "Salary",
        CategoryKind::Income,
        "Regular employment income",
        "💰",
    ),
    (
        "Investments",
        CategoryKind::Income,
        "Stock dividends, interest, capital gains",
        "📈",
    ),
    (
        "Freelance",
        CategoryKind::Income,
        "Contract work and side gigs",
        "💻",
    ),
    ("Gifts", CategoryKind::Income, "Money received as gifts", "🎁"),
];

/// The categories every new user starts with.
pub fn default_categories(user_id: Uuid) -> Vec<NewCategory> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(name, kind, description, icon)| NewCategory {
            user_id,
            name: (*name).to_owned(),
            description: Some((*description).to_owned()),
            color: DEFAULT_COLOR.to_owned(),
            icon: Some((*icon).to_owned()),
            kind: *kind,
        })
        .collect()
}
