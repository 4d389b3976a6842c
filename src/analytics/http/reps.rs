use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    analytics::services::{Dashboard, DEFAULT_TREND_MONTHS},
    budgets::http::reps::PERCENTAGE_SCALE,
    expenses::http::reps::ExpenseRep,
    reports::{
        dates::month_start, parse_optional_date, BudgetAnalysis, DateError, DateRange,
        MonthlyTotal, SpendingSummary,
    },
};

#[derive(Debug, Default, Deserialize)]
pub struct TrendParams {
    pub months: Option<u32>,
}

impl TrendParams {
    pub fn months(&self) -> u32 {
        self.months.unwrap_or(DEFAULT_TREND_MONTHS)
    }
}

/// An optional date range given as query parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl RangeParams {
    /// Resolve the range, defaulting to the start of the current month
    /// through `today`.
    pub fn into_range(self, today: NaiveDate) -> Result<DateRange, DateError> {
        let start = parse_optional_date(self.start_date.as_deref())?;
        let end = parse_optional_date(self.end_date.as_deref())?;

        DateRange::new(
            start.unwrap_or_else(|| month_start(today)),
            end.unwrap_or(today),
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotalRep {
    /// The month in `YYYY-MM` form.
    pub month: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

impl From<MonthlyTotal> for MonthlyTotalRep {
    fn from(total: MonthlyTotal) -> Self {
        Self {
            month: total.month.format("%Y-%m").to_string(),
            total: total.total,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotalRep {
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

fn category_totals(totals: BTreeMap<String, Decimal>) -> Vec<CategoryTotalRep> {
    totals
        .into_iter()
        .map(|(category, total)| CategoryTotalRep { category, total })
        .collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRep {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub transaction_count: usize,
    pub by_category: Vec<CategoryTotalRep>,
}

impl SummaryRep {
    pub fn new(range: DateRange, summary: SpendingSummary) -> Self {
        Self {
            start_date: range.start(),
            end_date: range.end(),
            total: summary.total,
            transaction_count: summary.transaction_count,
            by_category: category_totals(summary.by_category),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAnalysisRep {
    pub budget_id: Uuid,
    pub category_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub budgeted: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub actual: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub percentage_used: Decimal,
}

impl From<BudgetAnalysis> for BudgetAnalysisRep {
    fn from(analysis: BudgetAnalysis) -> Self {
        Self {
            budget_id: analysis.budget_id,
            category_name: analysis.category_name,
            budgeted: analysis.budgeted,
            actual: analysis.actual,
            remaining: analysis.remaining,
            percentage_used: analysis.percentage_used.round_dp(PERCENTAGE_SCALE),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRep {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_spent: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub month_spent: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_budget: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_budget: Decimal,
    pub recent_expenses: Vec<ExpenseRep>,
    pub spending_by_category: Vec<CategoryTotalRep>,
}

impl From<Dashboard> for DashboardRep {
    fn from(dashboard: Dashboard) -> Self {
        Self {
            total_spent: dashboard.total_spent,
            month_spent: dashboard.month_spent,
            monthly_budget: dashboard.monthly_budget_total,
            total_budget: dashboard.budget_total,
            recent_expenses: dashboard
                .recent_expenses
                .into_iter()
                .map(ExpenseRep::from)
                .collect(),
            spending_by_category: category_totals(dashboard.month_by_category),
        }
    }
}
