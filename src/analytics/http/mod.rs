use axum::{extract::State, routing::get, Router};
use chrono::Utc;

use crate::{
    authentication::TokenClaims,
    envelope::{Envelope, QueryParams},
    http_err::{ApiError, ApiResponse},
    server::AppState,
};

use super::services::{AnalyticsError, AnalyticsService};

pub mod reps;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/trend", get(get_trend))
        .route("/summary", get(get_summary))
        .route("/budget-analysis", get(get_budget_analysis))
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/", get(get_dashboard))
}

impl From<AnalyticsError> for ApiError {
    fn from(error: AnalyticsError) -> Self {
        match error {
            AnalyticsError::InvalidMonths(_) => {
                ApiError::field("months", "Months must be between 1 and 120.")
            }
            AnalyticsError::Other(error) => error.into(),
        }
    }
}

async fn get_trend(
    claims: TokenClaims,
    State(analytics_service): State<AnalyticsService>,
    QueryParams(params): QueryParams<reps::TrendParams>,
) -> ApiResponse<Envelope<Vec<reps::MonthlyTotalRep>>> {
    let trend = analytics_service
        .trend(claims.user_id(), params.months(), Utc::now().date_naive())
        .await?;

    Ok(Envelope::data(
        trend.into_iter().map(reps::MonthlyTotalRep::from).collect(),
    ))
}

async fn get_summary(
    claims: TokenClaims,
    State(analytics_service): State<AnalyticsService>,
    QueryParams(params): QueryParams<reps::RangeParams>,
) -> ApiResponse<Envelope<reps::SummaryRep>> {
    let range = params.into_range(Utc::now().date_naive())?;
    let summary = analytics_service.summary(claims.user_id(), range).await?;

    Ok(Envelope::data(reps::SummaryRep::new(range, summary)))
}

async fn get_budget_analysis(
    claims: TokenClaims,
    State(analytics_service): State<AnalyticsService>,
    QueryParams(params): QueryParams<reps::RangeParams>,
) -> ApiResponse<Envelope<Vec<reps::BudgetAnalysisRep>>> {
    let range = params.into_range(Utc::now().date_naive())?;
    let analysis = analytics_service
        .budget_analysis(claims.user_id(), range)
        .await?;

    Ok(Envelope::data(
        analysis
            .into_iter()
            .map(reps::BudgetAnalysisRep::from)
            .collect(),
    ))
}

async fn get_dashboard(
    claims: TokenClaims,
    State(analytics_service): State<AnalyticsService>,
) -> ApiResponse<Envelope<reps::DashboardRep>> {
    let dashboard = analytics_service
        .dashboard(claims.user_id(), Utc::now().date_naive())
        .await?;

    Ok(Envelope::data(dashboard.into()))
}
