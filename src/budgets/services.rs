use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    expenses::domain::{Expense, ExpenseQuery},
    reports::{budget_alerts, with_status, BudgetAlert, BudgetWithStatus},
    repos::{DynBudgetRepo, DynCategoryRepo, DynExpenseRepo, DynNotificationRepo},
};

use super::domain::{Budget, BudgetData, NewBudget, NewNotification, Notification};

#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("invalid budget data")]
    Invalid(#[from] ValidationErrors),

    #[error("budget not found")]
    NotFound,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct BudgetService {
    budget_repo: DynBudgetRepo,
    category_repo: DynCategoryRepo,
    expense_repo: DynExpenseRepo,
    notification_repo: DynNotificationRepo,
}

impl BudgetService {
    pub fn new(
        budget_repo: DynBudgetRepo,
        category_repo: DynCategoryRepo,
        expense_repo: DynExpenseRepo,
        notification_repo: DynNotificationRepo,
    ) -> Self {
        Self {
            budget_repo,
            category_repo,
            expense_repo,
            notification_repo,
        }
    }

    /// List a user's budgets along with how much of each has been spent.
    pub async fn list_budgets(&self, user_id: Uuid) -> anyhow::Result<Vec<BudgetWithStatus>> {
        let budgets = self.budget_repo.list_budgets(user_id).await?;
        let expenses = self.expenses_covering(user_id, &budgets).await?;

        Ok(with_status(budgets, &expenses))
    }

    pub async fn get_budget(
        &self,
        user_id: Uuid,
        budget_id: Uuid,
    ) -> Result<BudgetWithStatus, BudgetError> {
        let budget = self
            .budget_repo
            .get_budget(user_id, budget_id)
            .await?
            .ok_or(BudgetError::NotFound)?;

        self.attach_status(budget).await
    }

    /// Create a budget.
    ///
    /// # Arguments
    /// * `user_id` - The budget's owner.
    /// * `data` - The user's input.
    /// * `today` - Used to default the budget's dates to the current period.
    pub async fn create_budget(
        &self,
        user_id: Uuid,
        data: BudgetData,
        today: NaiveDate,
    ) -> Result<BudgetWithStatus, BudgetError> {
        let new_budget = NewBudget::from_data(user_id, data, today)?;
        self.ensure_category_owned(&new_budget).await?;

        let budget = self.budget_repo.create_budget(&new_budget).await?;
        info!(budget_id = %budget.id, %user_id, "Created budget.");

        self.attach_status(budget).await
    }

    pub async fn update_budget(
        &self,
        user_id: Uuid,
        budget_id: Uuid,
        data: BudgetData,
        today: NaiveDate,
    ) -> Result<BudgetWithStatus, BudgetError> {
        let new_budget = NewBudget::from_data(user_id, data, today)?;
        self.ensure_category_owned(&new_budget).await?;

        let budget = self
            .budget_repo
            .update_budget(budget_id, &new_budget)
            .await?
            .ok_or(BudgetError::NotFound)?;

        self.attach_status(budget).await
    }

    pub async fn delete_budget(&self, user_id: Uuid, budget_id: Uuid) -> Result<(), BudgetError> {
        if self.budget_repo.delete_budget(user_id, budget_id).await? {
            info!(%budget_id, %user_id, "Deleted budget.");

            Ok(())
        } else {
            Err(BudgetError::NotFound)
        }
    }

    /// Alerts for the budgets that are active on `today` and close to or over
    /// their cap.
    pub async fn alerts(&self, user_id: Uuid, today: NaiveDate) -> anyhow::Result<Vec<BudgetAlert>> {
        let active: Vec<Budget> = self
            .budget_repo
            .list_budgets(user_id)
            .await?
            .into_iter()
            .filter(|budget| budget.is_active_on(today))
            .collect();
        let expenses = self.expenses_covering(user_id, &active).await?;

        Ok(budget_alerts(&with_status(active, &expenses)))
    }

    /// Record notifications for budgets affected by an expense.
    ///
    /// Only budgets for the expense's category whose window contains the
    /// expense's date are considered. A budget receives at most one unread
    /// notification of each kind.
    pub async fn record_alert_notifications(
        &self,
        expense: &Expense,
    ) -> anyhow::Result<Vec<Notification>> {
        let affected: Vec<Budget> = self
            .budget_repo
            .list_budgets(expense.user_id)
            .await?
            .into_iter()
            .filter(|budget| {
                budget.category.id == expense.category.id && budget.is_active_on(expense.date)
            })
            .collect();

        if affected.is_empty() {
            return Ok(Vec::new());
        }

        let expenses = self.expenses_covering(expense.user_id, &affected).await?;
        let mut recorded = Vec::new();

        for alert in budget_alerts(&with_status(affected, &expenses)) {
            let kind = alert.level.notification_kind();
            if self
                .notification_repo
                .has_unread(expense.user_id, alert.budget_id, kind)
                .await?
            {
                debug!(budget_id = %alert.budget_id, ?kind, "Budget already has unread notification.");

                continue;
            }

            let notification = self
                .notification_repo
                .create_notification(&NewNotification {
                    user_id: expense.user_id,
                    budget_id: Some(alert.budget_id),
                    kind,
                    message: alert.message,
                })
                .await?;

            info!(
                budget_id = %alert.budget_id,
                notification_id = %notification.id,
                ?kind,
                "Recorded budget notification."
            );
            recorded.push(notification);
        }

        Ok(recorded)
    }

    pub async fn list_notifications(&self, user_id: Uuid) -> anyhow::Result<Vec<Notification>> {
        self.notification_repo.list_notifications(user_id).await
    }

    pub async fn mark_notification_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> anyhow::Result<Option<Notification>> {
        self.notification_repo
            .mark_read(user_id, notification_id)
            .await
    }

    async fn attach_status(&self, budget: Budget) -> Result<BudgetWithStatus, BudgetError> {
        let expenses = self
            .expenses_covering(budget.user_id, std::slice::from_ref(&budget))
            .await?;

        Ok(with_status(vec![budget], &expenses)
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Budget status was not computed."))?)
    }

    /// Load the user's expenses that fall within any of the budgets' windows.
    async fn expenses_covering(
        &self,
        user_id: Uuid,
        budgets: &[Budget],
    ) -> anyhow::Result<Vec<Expense>> {
        let start = budgets.iter().map(|b| b.start_date).min();
        let end = budgets.iter().map(|b| b.end_date).max();

        match (start, end) {
            (Some(start), Some(end)) => {
                let query = ExpenseQuery {
                    start: Some(start),
                    end: Some(end),
                    ..ExpenseQuery::for_user(user_id)
                };

                self.expense_repo.list_expenses(&query).await
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn ensure_category_owned(&self, budget: &NewBudget) -> Result<(), BudgetError> {
        if self
            .category_repo
            .get_category(budget.user_id, budget.category_id)
            .await?
            .is_none()
        {
            warn!(category_id = %budget.category_id, "Budget references unknown category.");

            let mut errors = ValidationErrors::new();
            let mut error = ValidationError::new("category");
            error.message = Some("Category not found.".into());
            errors.add("category_id", error);

            return Err(BudgetError::Invalid(errors));
        }

        Ok(())
    }
}


#[cfg(test)]
mod test {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::{test_support::budget_service, *};
    use crate::{
        budgets::domain::{BudgetPeriod, NotificationKind},
        categories::domain::{Category, CategoryKind, NewCategory},
        expenses::domain::NewExpense,
        reports::AlertLevel,
        repos::{memory::MemoryStore, CategoryRepo, ExpenseRepo},
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dec(raw: &str) -> Decimal {
        Decimal::from_str(raw).unwrap()
    }

    async fn category(store: &MemoryStore, user_id: Uuid, name: &str) -> Category {
        store
            .create_category(&NewCategory {
                user_id,
                name: name.to_owned(),
                description: None,
                color: "#123456".to_owned(),
                icon: None,
                kind: CategoryKind::Expense,
            })
            .await
            .unwrap()
    }

    async fn spend(
        store: &MemoryStore,
        user_id: Uuid,
        category: &Category,
        amount: &str,
        on: NaiveDate,
    ) -> Expense {
        store
            .create_expense(&NewExpense {
                user_id,
                category_id: category.id,
                amount: dec(amount),
                description: "Spent".to_owned(),
                date: on,
                note: None,
                receipt: None,
            })
            .await
            .unwrap()
    }

    fn monthly(category: &Category, amount: &str) -> BudgetData {
        BudgetData {
            amount: dec(amount),
            category_id: category.id,
            period: BudgetPeriod::Monthly,
            start_date: None,
            end_date: None,
        }
    }

    #[tokio::test]
    async fn create_defaults_to_current_month() {
        let store = MemoryStore::new();
        let service = budget_service(&store);
        let user_id = Uuid::new_v4();
        let food = category(&store, user_id, "Food").await;
        spend(&store, user_id, &food, "125.50", date(2024, 2, 10)).await;
        spend(&store, user_id, &food, "99", date(2024, 1, 31)).await;

        let created = service
            .create_budget(user_id, monthly(&food, "500"), date(2024, 2, 14))
            .await
            .unwrap();

        assert_eq!(date(2024, 2, 1), created.budget.start_date);
        assert_eq!(date(2024, 2, 29), created.budget.end_date);
        assert_eq!(dec("125.50"), created.status.spent);
        assert_eq!(dec("374.50"), created.status.remaining);
    }

    #[tokio::test]
    async fn create_rejects_foreign_category() {
        let store = MemoryStore::new();
        let service = budget_service(&store);
        let other = category(&store, Uuid::new_v4(), "Food").await;

        let result = service
            .create_budget(Uuid::new_v4(), monthly(&other, "500"), date(2024, 2, 14))
            .await;

        match result {
            Err(BudgetError::Invalid(errors)) => {
                assert!(errors.field_errors().contains_key("category_id"))
            }
            other => panic!("expected validation error, got {:?}", other.map(|b| b.budget.id)),
        }
    }

    #[tokio::test]
    async fn alerts_only_cover_active_budgets() {
        let store = MemoryStore::new();
        let service = budget_service(&store);
        let user_id = Uuid::new_v4();
        let food = category(&store, user_id, "Food").await;
        let fun = category(&store, user_id, "Fun").await;
        spend(&store, user_id, &food, "525", date(2024, 2, 3)).await;
        spend(&store, user_id, &fun, "90", date(2024, 2, 3)).await;
        spend(&store, user_id, &fun, "500", date(2024, 1, 3)).await;

        service
            .create_budget(user_id, monthly(&food, "500"), date(2024, 2, 1))
            .await
            .unwrap();
        service
            .create_budget(user_id, monthly(&fun, "100"), date(2024, 2, 1))
            .await
            .unwrap();
        service
            .create_budget(user_id, monthly(&fun, "100"), date(2024, 1, 1))
            .await
            .unwrap();

        let mut alerts = service.alerts(user_id, date(2024, 2, 20)).await.unwrap();
        alerts.sort_by(|a, b| a.category_name.cmp(&b.category_name));

        assert_eq!(2, alerts.len());
        assert_eq!(AlertLevel::Exceeded, alerts[0].level);
        assert_eq!(dec("105"), alerts[0].percentage_used);
        assert_eq!(AlertLevel::Warning, alerts[1].level);
    }

    #[tokio::test]
    async fn notifications_are_not_duplicated_while_unread() {
        let store = MemoryStore::new();
        let service = budget_service(&store);
        let user_id = Uuid::new_v4();
        let food = category(&store, user_id, "Food").await;
        service
            .create_budget(user_id, monthly(&food, "100"), date(2024, 2, 1))
            .await
            .unwrap();

        let first = spend(&store, user_id, &food, "85", date(2024, 2, 2)).await;
        let recorded = service.record_alert_notifications(&first).await.unwrap();
        assert_eq!(1, recorded.len());
        assert_eq!(NotificationKind::BudgetWarning, recorded[0].kind);

        let second = spend(&store, user_id, &food, "5", date(2024, 2, 3)).await;
        assert!(service
            .record_alert_notifications(&second)
            .await
            .unwrap()
            .is_empty());

        service
            .mark_notification_read(user_id, recorded[0].id)
            .await
            .unwrap()
            .expect("notification should exist");
        let third = spend(&store, user_id, &food, "20", date(2024, 2, 4)).await;
        let recorded = service.record_alert_notifications(&third).await.unwrap();

        assert_eq!(1, recorded.len());
        assert_eq!(NotificationKind::BudgetExceeded, recorded[0].kind);
        assert_eq!(2, service.list_notifications(user_id).await.unwrap().len());
    }

    #[tokio::test]
    async fn expenses_outside_budget_window_do_not_notify() {
        let store = MemoryStore::new();
        let service = budget_service(&store);
        let user_id = Uuid::new_v4();
        let food = category(&store, user_id, "Food").await;
        service
            .create_budget(user_id, monthly(&food, "100"), date(2024, 2, 1))
            .await
            .unwrap();

        let expense = spend(&store, user_id, &food, "500", date(2024, 3, 1)).await;

        assert!(service
            .record_alert_notifications(&expense)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn delete_is_scoped_to_owner() {
        let store = MemoryStore::new();
        let service = budget_service(&store);
        let user_id = Uuid::new_v4();
        let food = category(&store, user_id, "Food").await;
        let created = service
            .create_budget(user_id, monthly(&food, "100"), date(2024, 2, 1))
            .await
            .unwrap();

        assert!(matches!(
            service.delete_budget(Uuid::new_v4(), created.budget.id).await,
            Err(BudgetError::NotFound)
        ));
        service.delete_budget(user_id, created.budget.id).await.unwrap();
        assert!(matches!(
            service.get_budget(user_id, created.budget.id).await,
            Err(BudgetError::NotFound)
        ));
    }
}
