//! Pure aggregation over expenses and budgets that have already been loaded
//! from the store.

pub mod alerts;
pub mod budget_status;
pub mod dates;
pub mod summary;
pub mod trend;

pub use alerts::{budget_alerts, budget_analysis, AlertLevel, BudgetAlert, BudgetAnalysis};
pub use budget_status::{compute_budget_status, with_status, BudgetStatus, BudgetWithStatus};
pub use dates::{parse_date, parse_optional_date, DateError, DateRange};
pub use summary::{summarize, SpendingSummary};
pub use trend::{monthly_trend, MonthlyTotal};
