use std::collections::BTreeMap;

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::{
    budgets::domain::{Budget, BudgetPeriod},
    expenses::domain::{Expense, ExpenseQuery},
    reports::{
        budget_analysis, dates::month_start, monthly_trend, summarize, BudgetAnalysis, DateRange, MonthlyTotal, SpendingSummary,
    },
    repos::{DynBudgetRepo, DynExpenseRepo},
};

/// Number of months covered by a trend when the client does not ask for a
/// specific number.
pub const DEFAULT_TREND_MONTHS: u32 = 12;

pub const MAX_TREND_MONTHS: u32 = 120;

/// Number of expenses shown on the dashboard.
pub const RECENT_EXPENSE_COUNT: i64 = 5;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("months must be between 1 and 120, got {0}")]
    InvalidMonths(u32),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// An overview of a user's spending as of one day.
#[derive(Clone, Debug, PartialEq)]
pub struct Dashboard {
    pub total_spent: Decimal,
    pub month_spent: Decimal,
    /// Sum of the monthly budgets that are active today.
    pub monthly_budget_total: Decimal,
    /// Sum of every budget that is active today, regardless of period.
    pub budget_total: Decimal,
    pub recent_expenses: Vec<Expense>,
    pub month_by_category: BTreeMap<String, Decimal>,
}

#[derive(Clone)]
pub struct AnalyticsService {
    budget_repo: DynBudgetRepo,
    expense_repo: DynExpenseRepo,
}

impl AnalyticsService {
    pub fn new(budget_repo: DynBudgetRepo, expense_repo: DynExpenseRepo) -> Self {
        Self {
            budget_repo,
            expense_repo,
        }
    }

    /// Monthly spending totals for the `months` calendar months ending with
    /// the month containing `today`.
    pub async fn trend(
        &self,
        user_id: Uuid,
        months: u32,
        today: NaiveDate,
    ) -> Result<Vec<MonthlyTotal>, AnalyticsError> {
        if !(1..=MAX_TREND_MONTHS).contains(&months) {
            return Err(AnalyticsError::InvalidMonths(months));
        }

        let start = month_start(today) - Months::new(months - 1);
        let end = DateRange::month_of(today).end();
        let expenses = self.expenses_between(user_id, start, end).await?;

        debug!(%user_id, months, expenses = expenses.len(), "Computing spending trend.");

        Ok(monthly_trend(&expenses, months, today))
    }

    pub async fn summary(&self, user_id: Uuid, range: DateRange) -> anyhow::Result<SpendingSummary> {
        let expenses = self
            .expenses_between(user_id, range.start(), range.end())
            .await?;

        Ok(summarize(&expenses, range))
    }

    /// Budgeted versus actual spending for budgets overlapping `range`.
    ///
    /// Only spending inside both the budget's window and `range` counts.
    pub async fn budget_analysis(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> anyhow::Result<Vec<BudgetAnalysis>> {
        let budgets: Vec<Budget> = self
            .budget_repo
            .list_budgets(user_id)
            .await?
            .into_iter()
            .filter(|budget| budget.window().overlaps(&range))
            .collect();

        if budgets.is_empty() {
            return Ok(Vec::new());
        }

        let expenses = self
            .expenses_between(user_id, range.start(), range.end())
            .await?;

        Ok(budget_analysis(&budgets, &expenses))
    }

    pub async fn dashboard(&self, user_id: Uuid, today: NaiveDate) -> anyhow::Result<Dashboard> {
        let total_spent = self.expense_repo.total_spent(user_id).await?;

        let this_month = DateRange::month_of(today);
        let month_expenses = self
            .expenses_between(user_id, this_month.start(), this_month.end())
            .await?;
        let month = summarize(&month_expenses, this_month);

        let recent_expenses = self
            .expense_repo
            .list_expenses(&ExpenseQuery {
                limit: Some(RECENT_EXPENSE_COUNT),
                ..ExpenseQuery::for_user(user_id)
            })
            .await?;

        let active: Vec<Budget> = self
            .budget_repo
            .list_budgets(user_id)
            .await?
            .into_iter()
            .filter(|budget| budget.is_active_on(today))
            .collect();
        let monthly_budget_total = active
            .iter()
            .filter(|budget| budget.period == BudgetPeriod::Monthly)
            .map(|budget| budget.amount)
            .sum();
        let budget_total = active.iter().map(|budget| budget.amount).sum();

        Ok(Dashboard {
            total_spent,
            month_spent: month.total,
            monthly_budget_total,
            budget_total,
            recent_expenses,
            month_by_category: month.by_category,
        })
    }

    async fn expenses_between(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<Expense>> {
        let query = ExpenseQuery {
            start: Some(start),
            end: Some(end),
            ..ExpenseQuery::for_user(user_id)
        };

        self.expense_repo.list_expenses(&query).await
    }
}


#[cfg(test)]
mod test {
    use std::{
        str::FromStr,
        sync::{Arc, Mutex},
    };

    use async_trait::async_trait;

    use super::{test_support::analytics_service, *};
    use crate::{
        budgets::domain::NewBudget,
        categories::domain::{Category, CategoryKind, NewCategory},
        expenses::domain::NewExpense,
        repos::{memory::MemoryStore, BudgetRepo, CategoryRepo, ExpenseRepo},
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dec(raw: &str) -> Decimal {
        Decimal::from_str(raw).unwrap()
    }

    struct Fixture {
        store: MemoryStore,
        user_id: Uuid,
        food: Category,
        rent: Category,
    }

    impl Fixture {
        async fn new() -> Self {
            let store = MemoryStore::new();
            let user_id = Uuid::new_v4();
            let food = Self::category(&store, user_id, "Food").await;
            let rent = Self::category(&store, user_id, "Rent").await;

            Self {
                store,
                user_id,
                food,
                rent,
            }
        }

        async fn category(store: &MemoryStore, user_id: Uuid, name: &str) -> Category {
            store
                .create_category(&NewCategory {
                    user_id,
                    name: name.to_owned(),
                    description: None,
                    color: "#666666".to_owned(),
                    icon: None,
                    kind: CategoryKind::Expense,
                })
                .await
                .unwrap()
        }

        async fn expense(&self, category: &Category, amount: &str, on: NaiveDate) -> Expense {
            self.store
                .create_expense(&NewExpense {
                    user_id: self.user_id,
                    category_id: category.id,
                    amount: dec(amount),
                    description: format!("{} on {}", category.name, on),
                    date: on,
                    note: None,
                    receipt: None,
                })
                .await
                .unwrap()
        }

        async fn budget(
            &self,
            category: &Category,
            amount: &str,
            period: BudgetPeriod,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Budget {
            self.store
                .create_budget(&NewBudget {
                    user_id: self.user_id,
                    category_id: category.id,
                    amount: dec(amount),
                    period,
                    start_date: start,
                    end_date: end,
                })
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn trend_is_zero_filled() {
        let fixture = Fixture::new().await;
        fixture.expense(&fixture.food, "10", date(2024, 1, 15)).await;
        fixture.expense(&fixture.food, "5", date(2024, 3, 2)).await;
        fixture.expense(&fixture.rent, "900", date(2023, 6, 1)).await;

        let trend = analytics_service(&fixture.store)
            .trend(fixture.user_id, 3, date(2024, 3, 20))
            .await
            .unwrap();

        assert_eq!(
            vec![
                MonthlyTotal {
                    month: date(2024, 1, 1),
                    total: dec("10")
                },
                MonthlyTotal {
                    month: date(2024, 2, 1),
                    total: Decimal::ZERO
                },
                MonthlyTotal {
                    month: date(2024, 3, 1),
                    total: dec("5")
                },
            ],
            trend
        );
    }

    #[tokio::test]
    async fn trend_rejects_out_of_range_months() {
        let fixture = Fixture::new().await;
        let service = analytics_service(&fixture.store);

        for months in [0, MAX_TREND_MONTHS + 1] {
            assert!(matches!(
                service.trend(fixture.user_id, months, date(2024, 3, 1)).await,
                Err(AnalyticsError::InvalidMonths(m)) if m == months
            ));
        }
    }

    #[tokio::test]
    async fn summary_covers_range() {
        let fixture = Fixture::new().await;
        fixture.expense(&fixture.food, "12.50", date(2024, 3, 1)).await;
        fixture.expense(&fixture.rent, "900", date(2024, 3, 31)).await;
        fixture.expense(&fixture.rent, "900", date(2024, 4, 1)).await;

        let summary = analytics_service(&fixture.store)
            .summary(fixture.user_id, DateRange::month_of(date(2024, 3, 10)))
            .await
            .unwrap();

        assert_eq!(dec("912.50"), summary.total);
        assert_eq!(2, summary.transaction_count);
        assert_eq!(dec("12.50"), summary.by_category["Food"]);
    }

    #[tokio::test]
    async fn budget_analysis_only_includes_overlapping_budgets() {
        let fixture = Fixture::new().await;
        let march = fixture
            .budget(
                &fixture.food,
                "200",
                BudgetPeriod::Monthly,
                date(2024, 3, 1),
                date(2024, 3, 31),
            )
            .await;
        fixture
            .budget(
                &fixture.food,
                "200",
                BudgetPeriod::Monthly,
                date(2024, 5, 1),
                date(2024, 5, 31),
            )
            .await;
        fixture.expense(&fixture.food, "50", date(2024, 3, 3)).await;

        let analysis = analytics_service(&fixture.store)
            .budget_analysis(fixture.user_id, DateRange::month_of(date(2024, 3, 1)))
            .await
            .unwrap();

        assert_eq!(1, analysis.len());
        assert_eq!(march.id, analysis[0].budget_id);
        assert_eq!(dec("50"), analysis[0].actual);
        assert_eq!(dec("150"), analysis[0].remaining);
        assert_eq!(dec("25"), analysis[0].percentage_used);
    }

    #[tokio::test]
    async fn dashboard_totals() {
        let fixture = Fixture::new().await;
        let today = date(2024, 3, 20);
        fixture.expense(&fixture.rent, "900", date(2023, 12, 1)).await;
        for day in 1..=6 {
            fixture.expense(&fixture.food, "10", date(2024, 3, day)).await;
        }
        fixture
            .budget(
                &fixture.food,
                "300",
                BudgetPeriod::Monthly,
                date(2024, 3, 1),
                date(2024, 3, 31),
            )
            .await;
        fixture
            .budget(
                &fixture.rent,
                "12000",
                BudgetPeriod::Yearly,
                date(2024, 1, 1),
                date(2024, 12, 31),
            )
            .await;
        fixture
            .budget(
                &fixture.food,
                "250",
                BudgetPeriod::Monthly,
                date(2024, 2, 1),
                date(2024, 2, 29),
            )
            .await;

        let dashboard = analytics_service(&fixture.store)
            .dashboard(fixture.user_id, today)
            .await
            .unwrap();

        assert_eq!(dec("960"), dashboard.total_spent);
        assert_eq!(dec("60"), dashboard.month_spent);
        assert_eq!(dec("300"), dashboard.monthly_budget_total);
        assert_eq!(dec("12300"), dashboard.budget_total);
        assert_eq!(5, dashboard.recent_expenses.len());
        assert_eq!(date(2024, 3, 6), dashboard.recent_expenses[0].date);
        assert_eq!(dec("60"), dashboard.month_by_category["Food"]);
        assert!(!dashboard.month_by_category.contains_key("Rent"));
    }

    /// Records every listing query before delegating to the store.
    struct ListingLog {
        store: MemoryStore,
        queries: Arc<Mutex<Vec<ExpenseQuery>>>,
    }

    #[async_trait]
    impl ExpenseRepo for ListingLog {
        async fn list_expenses(&self, query: &ExpenseQuery) -> anyhow::Result<Vec<Expense>> {
            self.queries.lock().unwrap().push(query.clone());
            self.store.list_expenses(query).await
        }

        async fn get_expense(
            &self,
            user_id: Uuid,
            expense_id: Uuid,
        ) -> anyhow::Result<Option<Expense>> {
            self.store.get_expense(user_id, expense_id).await
        }

        async fn total_spent(&self, user_id: Uuid) -> anyhow::Result<Decimal> {
            self.store.total_spent(user_id).await
        }

        async fn create_expense(&self, expense: &NewExpense) -> anyhow::Result<Expense> {
            self.store.create_expense(expense).await
        }

        async fn update_expense(
            &self,
            expense_id: Uuid,
            expense: &NewExpense,
        ) -> anyhow::Result<Option<Expense>> {
            self.store.update_expense(expense_id, expense).await
        }

        async fn delete_expense(&self, user_id: Uuid, expense_id: Uuid) -> anyhow::Result<bool> {
            self.store.delete_expense(user_id, expense_id).await
        }
    }

    #[tokio::test]
    async fn dashboard_never_lists_full_history() {
        let fixture = Fixture::new().await;
        for year in 2015..2024 {
            fixture.expense(&fixture.rent, "900", date(year, 6, 1)).await;
        }
        fixture.expense(&fixture.food, "10", date(2024, 3, 2)).await;
        let queries = Arc::new(Mutex::new(Vec::new()));
        let service = AnalyticsService::new(
            Arc::new(fixture.store.clone()),
            Arc::new(ListingLog {
                store: fixture.store.clone(),
                queries: queries.clone(),
            }),
        );

        let dashboard = service
            .dashboard(fixture.user_id, date(2024, 3, 20))
            .await
            .unwrap();

        assert_eq!(dec("8110"), dashboard.total_spent);
        assert_eq!(dec("10"), dashboard.month_spent);
        let queries = queries.lock().unwrap();
        assert!(!queries.is_empty());
        assert!(queries
            .iter()
            .all(|query| query.limit.is_some() || query.start.is_some()));
    }
}
