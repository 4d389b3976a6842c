//! An in-memory implementation of every repository used to exercise services
//! and routes without a database.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    budgets::domain::{Budget, NewBudget, NewNotification, Notification, NotificationKind},
    categories::domain::{Category, NewCategory},
    expenses::domain::{Expense, ExpenseQuery, NewExpense},
    identities::{
        domain::{
            email::EmailVerificationData,
            password_resets::PasswordResetTokenData,
            users::{ProfileUpdate, Role, User, UserCredentials},
        },
        models::{email::NewEmailVerification, password_resets::NewPasswordResetModel},
    },
    models::NewUserModel,
    passwords,
};

use super::{
    BudgetRepo, CategoryDeletionError, CategoryRepo, EmailRepo, EmailVerificationError,
    ExpenseRepo, NotificationRepo, PasswordResetRepo, UserPersistenceError, UserRepo,
};

#[derive(Default)]
struct State {
    users: Vec<(User, String)>,
    verifications: Vec<EmailVerificationData>,
    resets: Vec<PasswordResetTokenData>,
    categories: Vec<Category>,
    expenses: Vec<Expense>,
    budgets: Vec<Budget>,
    notifications: Vec<Notification>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn verification_tokens(&self, user_id: Uuid) -> Vec<String> {
        self.state()
            .verifications
            .iter()
            .filter(|v| v.user_id == user_id)
            .map(|v| v.token.clone())
            .collect()
    }

    pub fn reset_tokens(&self, user_id: Uuid) -> Vec<String> {
        self.state()
            .resets
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.token.clone())
            .collect()
    }

    /// Backdate a verification token so expiry can be tested.
    pub fn set_verification_created_at(&self, token: &str, created_at: DateTime<Utc>) {
        for verification in self
            .state()
            .verifications
            .iter_mut()
            .filter(|v| v.token == token)
        {
            verification.created_at = created_at;
        }
    }

    /// Backdate a reset token so expiry can be tested.
    pub fn set_reset_created_at(&self, token: &str, created_at: DateTime<Utc>) {
        for reset in self.state().resets.iter_mut().filter(|r| r.token == token) {
            reset.created_at = created_at;
        }
    }

    pub fn set_role(&self, user_id: Uuid, role: Role) {
        for (user, _) in self.state().users.iter_mut().filter(|(u, _)| u.id == user_id) {
            user.role = role;
        }
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.state().notifications.clone()
    }

    fn category_ref(state: &State, category_id: Uuid) -> anyhow::Result<Category> {
        state
            .categories
            .iter()
            .find(|c| c.id == category_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no category {}", category_id))
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn persist_new_user(
        &self,
        user: &NewUserModel,
        categories: &[NewCategory],
    ) -> Result<User, UserPersistenceError> {
        let mut state = self.state();

        if state.users.iter().any(|(u, _)| u.email == user.email) {
            return Err(UserPersistenceError::DuplicateEmail(user.email.clone()));
        }

        let now = Utc::now();
        let saved = User {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: Role::User,
            phone_number: None,
            profile_picture: None,
            preferences: serde_json::json!({}),
            email_verified_at: None,
            created_at: now,
            updated_at: now,
        };
        state.users.push((saved.clone(), user.password_hash.clone()));

        for category in categories {
            state.categories.push(new_category(category));
        }

        Ok(saved)
    }

    async fn get_user(&self, user_id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self
            .state()
            .users
            .iter()
            .find(|(u, _)| u.id == user_id)
            .map(|(u, _)| u.clone()))
    }

    async fn get_credentials_by_email(
        &self,
        email: &str,
    ) -> anyhow::Result<Option<UserCredentials>> {
        Ok(self
            .state()
            .users
            .iter()
            .find(|(u, _)| u.email == email)
            .map(credentials))
    }

    async fn get_credentials(&self, user_id: Uuid) -> anyhow::Result<Option<UserCredentials>> {
        Ok(self
            .state()
            .users
            .iter()
            .find(|(u, _)| u.id == user_id)
            .map(credentials))
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> anyhow::Result<Option<User>> {
        let mut state = self.state();

        Ok(state
            .users
            .iter_mut()
            .find(|(u, _)| u.id == user_id)
            .map(|(user, _)| {
                user.first_name = update.first_name.clone();
                user.last_name = update.last_name.clone();
                if let Some(phone_number) = &update.phone_number {
                    user.phone_number = phone_number.clone();
                }
                if let Some(preferences) = &update.preferences {
                    user.preferences = preferences.clone();
                }
                user.updated_at = Utc::now();

                user.clone()
            }))
    }

    async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &passwords::Hash,
    ) -> anyhow::Result<()> {
        for (_, hash) in self.state().users.iter_mut().filter(|(u, _)| u.id == user_id) {
            *hash = password_hash.as_str().to_owned();
        }

        Ok(())
    }
}

fn credentials((user, hash): &(User, String)) -> UserCredentials {
    UserCredentials {
        id: user.id,
        email: user.email.clone(),
        role: user.role,
        password_hash: hash.clone(),
    }
}

fn new_category(category: &NewCategory) -> Category {
    let now = Utc::now();

    Category {
        id: Uuid::new_v4(),
        user_id: category.user_id,
        name: category.name.clone(),
        description: category.description.clone(),
        color: category.color.clone(),
        icon: category.icon.clone(),
        kind: category.kind,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl EmailRepo for MemoryStore {
    async fn insert_verification(
        &self,
        email_verification: &NewEmailVerification,
    ) -> anyhow::Result<()> {
        self.state().verifications.push(EmailVerificationData {
            token: email_verification.token.clone(),
            user_id: email_verification.user_id,
            created_at: Utc::now(),
        });

        Ok(())
    }

    async fn get_verification(
        &self,
        token: &str,
    ) -> anyhow::Result<Option<EmailVerificationData>> {
        Ok(self
            .state()
            .verifications
            .iter()
            .find(|v| v.token == token)
            .cloned())
    }

    async fn mark_email_as_verified(&self, token: &str) -> Result<Uuid, EmailVerificationError> {
        let mut state = self.state();
        let user_id = state
            .verifications
            .iter()
            .find(|v| v.token == token)
            .map(|v| v.user_id)
            .ok_or(EmailVerificationError::NotFound)?;

        for (user, _) in state.users.iter_mut().filter(|(u, _)| u.id == user_id) {
            user.email_verified_at.get_or_insert_with(Utc::now);
        }

        Ok(user_id)
    }

    async fn delete_verification_by_token(&self, token: &str) -> anyhow::Result<()> {
        self.state().verifications.retain(|v| v.token != token);

        Ok(())
    }
}

#[async_trait]
impl PasswordResetRepo for MemoryStore {
    async fn insert_reset(&self, reset: &NewPasswordResetModel) -> anyhow::Result<()> {
        self.state().resets.push(PasswordResetTokenData {
            token: reset.token.clone(),
            user_id: reset.user_id,
            created_at: Utc::now(),
        });

        Ok(())
    }

    async fn get_reset(&self, token: &str) -> anyhow::Result<Option<PasswordResetTokenData>> {
        Ok(self
            .state()
            .resets
            .iter()
            .find(|r| r.token == token)
            .cloned())
    }

    async fn delete_resets_for_user(&self, user_id: Uuid) -> anyhow::Result<()> {
        self.state().resets.retain(|r| r.user_id != user_id);

        Ok(())
    }
}

#[async_trait]
impl CategoryRepo for MemoryStore {
    async fn list_categories(&self, user_id: Uuid) -> anyhow::Result<Vec<Category>> {
        let mut categories: Vec<_> = self
            .state()
            .categories
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(categories)
    }

    async fn get_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> anyhow::Result<Option<Category>> {
        Ok(self
            .state()
            .categories
            .iter()
            .find(|c| c.id == category_id && c.user_id == user_id)
            .cloned())
    }

    async fn create_category(&self, category: &NewCategory) -> anyhow::Result<Category> {
        let saved = new_category(category);
        self.state().categories.push(saved.clone());

        Ok(saved)
    }

    async fn update_category(
        &self,
        category_id: Uuid,
        category: &NewCategory,
    ) -> anyhow::Result<Option<Category>> {
        let mut state = self.state();

        Ok(state
            .categories
            .iter_mut()
            .find(|c| c.id == category_id && c.user_id == category.user_id)
            .map(|saved| {
                saved.name = category.name.clone();
                saved.description = category.description.clone();
                saved.color = category.color.clone();
                saved.icon = category.icon.clone();
                saved.kind = category.kind;
                saved.updated_at = Utc::now();

                saved.clone()
            }))
    }

    async fn delete_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<bool, CategoryDeletionError> {
        let mut state = self.state();

        let in_use = state.expenses.iter().any(|e| e.category.id == category_id)
            || state.budgets.iter().any(|b| b.category.id == category_id);
        let owned = state
            .categories
            .iter()
            .any(|c| c.id == category_id && c.user_id == user_id);

        if owned && in_use {
            return Err(CategoryDeletionError::InUse);
        }

        state.categories.retain(|c| !(c.id == category_id && c.user_id == user_id));

        Ok(owned)
    }
}

#[async_trait]
impl ExpenseRepo for MemoryStore {
    async fn list_expenses(&self, query: &ExpenseQuery) -> anyhow::Result<Vec<Expense>> {
        let mut expenses: Vec<_> = self
            .state()
            .expenses
            .iter()
            .filter(|e| e.user_id == query.user_id)
            .filter(|e| query.start.map_or(true, |start| e.date >= start))
            .filter(|e| query.end.map_or(true, |end| e.date <= end))
            .filter(|e| query.category_id.map_or(true, |id| e.category.id == id))
            .cloned()
            .collect();
        expenses.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        if let Some(limit) = query.limit {
            expenses.truncate(limit.max(0) as usize);
        }

        Ok(expenses)
    }

    async fn get_expense(
        &self,
        user_id: Uuid,
        expense_id: Uuid,
    ) -> anyhow::Result<Option<Expense>> {
        Ok(self
            .state()
            .expenses
            .iter()
            .find(|e| e.id == expense_id && e.user_id == user_id)
            .cloned())
    }

    async fn total_spent(&self, user_id: Uuid) -> anyhow::Result<Decimal> {
        Ok(self
            .state()
            .expenses
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.amount)
            .sum())
    }

    async fn create_expense(&self, expense: &NewExpense) -> anyhow::Result<Expense> {
        let mut state = self.state();
        let category = Self::category_ref(&state, expense.category_id)?;
        let now = Utc::now();

        let saved = Expense {
            id: Uuid::new_v4(),
            user_id: expense.user_id,
            category: category.to_ref(),
            amount: expense.amount,
            description: expense.description.clone(),
            date: expense.date,
            note: expense.note.clone(),
            receipt: expense.receipt.clone(),
            created_at: now,
            updated_at: now,
        };
        state.expenses.push(saved.clone());

        Ok(saved)
    }

    async fn update_expense(
        &self,
        expense_id: Uuid,
        expense: &NewExpense,
    ) -> anyhow::Result<Option<Expense>> {
        let mut state = self.state();
        let category = Self::category_ref(&state, expense.category_id)?;

        Ok(state
            .expenses
            .iter_mut()
            .find(|e| e.id == expense_id && e.user_id == expense.user_id)
            .map(|saved| {
                saved.category = category.to_ref();
                saved.amount = expense.amount;
                saved.description = expense.description.clone();
                saved.date = expense.date;
                saved.note = expense.note.clone();
                saved.receipt = expense.receipt.clone();
                saved.updated_at = Utc::now();

                saved.clone()
            }))
    }

    async fn delete_expense(&self, user_id: Uuid, expense_id: Uuid) -> anyhow::Result<bool> {
        let mut state = self.state();
        let before = state.expenses.len();
        state
            .expenses
            .retain(|e| !(e.id == expense_id && e.user_id == user_id));

        Ok(state.expenses.len() < before)
    }
}

#[async_trait]
impl BudgetRepo for MemoryStore {
    async fn list_budgets(&self, user_id: Uuid) -> anyhow::Result<Vec<Budget>> {
        let mut budgets: Vec<_> = self
            .state()
            .budgets
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        budgets.sort_by(|a, b| b.start_date.cmp(&a.start_date));

        Ok(budgets)
    }

    async fn get_budget(&self, user_id: Uuid, budget_id: Uuid) -> anyhow::Result<Option<Budget>> {
        Ok(self
            .state()
            .budgets
            .iter()
            .find(|b| b.id == budget_id && b.user_id == user_id)
            .cloned())
    }

    async fn create_budget(&self, budget: &NewBudget) -> anyhow::Result<Budget> {
        let mut state = self.state();
        let category = Self::category_ref(&state, budget.category_id)?;
        let now = Utc::now();

        let saved = Budget {
            id: Uuid::new_v4(),
            user_id: budget.user_id,
            category: category.to_ref(),
            amount: budget.amount,
            period: budget.period,
            start_date: budget.start_date,
            end_date: budget.end_date,
            created_at: now,
            updated_at: now,
        };
        state.budgets.push(saved.clone());

        Ok(saved)
    }

    async fn update_budget(
        &self,
        budget_id: Uuid,
        budget: &NewBudget,
    ) -> anyhow::Result<Option<Budget>> {
        let mut state = self.state();
        let category = Self::category_ref(&state, budget.category_id)?;

        Ok(state
            .budgets
            .iter_mut()
            .find(|b| b.id == budget_id && b.user_id == budget.user_id)
            .map(|saved| {
                saved.category = category.to_ref();
                saved.amount = budget.amount;
                saved.period = budget.period;
                saved.start_date = budget.start_date;
                saved.end_date = budget.end_date;
                saved.updated_at = Utc::now();

                saved.clone()
            }))
    }

    async fn delete_budget(&self, user_id: Uuid, budget_id: Uuid) -> anyhow::Result<bool> {
        let mut state = self.state();
        let before = state.budgets.len();
        state
            .budgets
            .retain(|b| !(b.id == budget_id && b.user_id == user_id));
        let deleted = state.budgets.len() < before;

        if deleted {
            state.notifications.retain(|n| n.budget_id != Some(budget_id));
        }

        Ok(deleted)
    }
}

#[async_trait]
impl NotificationRepo for MemoryStore {
    async fn list_notifications(&self, user_id: Uuid) -> anyhow::Result<Vec<Notification>> {
        let mut notifications: Vec<_> = self
            .state()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(notifications)
    }

    async fn has_unread(
        &self,
        user_id: Uuid,
        budget_id: Uuid,
        kind: NotificationKind,
    ) -> anyhow::Result<bool> {
        Ok(self.state().notifications.iter().any(|n| {
            n.user_id == user_id && n.budget_id == Some(budget_id) && n.kind == kind && !n.is_read
        }))
    }

    async fn create_notification(
        &self,
        notification: &NewNotification,
    ) -> anyhow::Result<Notification> {
        let saved = Notification {
            id: Uuid::new_v4(),
            user_id: notification.user_id,
            budget_id: notification.budget_id,
            kind: notification.kind,
            message: notification.message.clone(),
            is_read: false,
            created_at: Utc::now(),
        };
        self.state().notifications.push(saved.clone());

        Ok(saved)
    }

    async fn mark_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> anyhow::Result<Option<Notification>> {
        let mut state = self.state();

        Ok(state
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id && n.user_id == user_id)
            .map(|n| {
                n.is_read = true;

                n.clone()
            }))
    }
}
