use axum::{
    extract::State,
    routing::{get, put},
    Router,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    authentication::TokenClaims,
    envelope::{Created, Envelope, JsonBody, PathParams},
    http_err::{ApiError, ApiResponse},
    server::AppState,
};

use super::{
    domain::BudgetData,
    services::{BudgetError, BudgetService},
};

pub mod reps;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_budgets).post(create_budget))
        .route("/alerts", get(get_alerts))
        .route("/notifications", get(list_notifications))
        .route(
            "/notifications/:notification_id/read",
            put(mark_notification_read),
        )
        .route(
            "/:budget_id",
            get(get_budget).put(update_budget).delete(delete_budget),
        )
}

impl From<BudgetError> for ApiError {
    fn from(error: BudgetError) -> Self {
        match error {
            BudgetError::Invalid(errors) => errors.into(),
            BudgetError::NotFound => ApiError::not_found("Budget"),
            BudgetError::Other(error) => error.into(),
        }
    }
}

async fn list_budgets(
    claims: TokenClaims,
    State(budget_service): State<BudgetService>,
) -> ApiResponse<Envelope<Vec<reps::BudgetRep>>> {
    let budgets = budget_service.list_budgets(claims.user_id()).await?;

    Ok(Envelope::data(
        budgets.into_iter().map(reps::BudgetRep::from).collect(),
    ))
}

async fn get_budget(
    claims: TokenClaims,
    State(budget_service): State<BudgetService>,
    PathParams(budget_id): PathParams<Uuid>,
) -> ApiResponse<Envelope<reps::BudgetRep>> {
    let budget = budget_service
        .get_budget(claims.user_id(), budget_id)
        .await?;

    Ok(Envelope::data(budget.into()))
}

async fn create_budget(
    claims: TokenClaims,
    State(budget_service): State<BudgetService>,
    JsonBody(data): JsonBody<BudgetData>,
) -> ApiResponse<Created<reps::BudgetRep>> {
    let budget = budget_service
        .create_budget(claims.user_id(), data, Utc::now().date_naive())
        .await?;

    Ok(Created(
        Envelope::data(budget.into()).with_message("Budget created."),
    ))
}

async fn update_budget(
    claims: TokenClaims,
    State(budget_service): State<BudgetService>,
    PathParams(budget_id): PathParams<Uuid>,
    JsonBody(data): JsonBody<BudgetData>,
) -> ApiResponse<Envelope<reps::BudgetRep>> {
    let budget = budget_service
        .update_budget(claims.user_id(), budget_id, data, Utc::now().date_naive())
        .await?;

    Ok(Envelope::data(budget.into()).with_message("Budget updated."))
}

async fn delete_budget(
    claims: TokenClaims,
    State(budget_service): State<BudgetService>,
    PathParams(budget_id): PathParams<Uuid>,
) -> ApiResponse<Envelope<()>> {
    budget_service
        .delete_budget(claims.user_id(), budget_id)
        .await?;

    Ok(Envelope::message("Budget deleted."))
}

async fn get_alerts(
    claims: TokenClaims,
    State(budget_service): State<BudgetService>,
) -> ApiResponse<Envelope<Vec<reps::AlertRep>>> {
    let alerts = budget_service
        .alerts(claims.user_id(), Utc::now().date_naive())
        .await?;

    Ok(Envelope::data(
        alerts.into_iter().map(reps::AlertRep::from).collect(),
    ))
}

async fn list_notifications(
    claims: TokenClaims,
    State(budget_service): State<BudgetService>,
) -> ApiResponse<Envelope<Vec<reps::NotificationRep>>> {
    let notifications = budget_service.list_notifications(claims.user_id()).await?;

    Ok(Envelope::data(
        notifications
            .into_iter()
            .map(reps::NotificationRep::from)
            .collect(),
    ))
}

async fn mark_notification_read(
    claims: TokenClaims,
    State(budget_service): State<BudgetService>,
    PathParams(notification_id): PathParams<Uuid>,
) -> ApiResponse<Envelope<reps::NotificationRep>> {
    match budget_service
        .mark_notification_read(claims.user_id(), notification_id)
        .await?
    {
        Some(notification) => Ok(Envelope::data(notification.into())),
        None => Err(ApiError::not_found("Notification")),
    }
}
