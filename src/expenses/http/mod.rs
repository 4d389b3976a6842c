use axum::{extract::State, routing::get, Router};
use uuid::Uuid;

use crate::{
    authentication::TokenClaims,
    envelope::{Created, Envelope, JsonBody, PathParams, QueryParams},
    http_err::{ApiError, ApiResponse},
    server::AppState,
};

use super::{
    domain::ExpenseData,
    services::{ExpenseError, ExpenseService},
};

pub mod reps;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_expenses).post(create_expense))
        .route(
            "/:expense_id",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
}

impl From<ExpenseError> for ApiError {
    fn from(error: ExpenseError) -> Self {
        match error {
            ExpenseError::Invalid(errors) => errors.into(),
            ExpenseError::NotFound => ApiError::not_found("Expense"),
            ExpenseError::Other(error) => error.into(),
        }
    }
}

async fn list_expenses(
    claims: TokenClaims,
    State(expense_service): State<ExpenseService>,
    QueryParams(filters): QueryParams<reps::ExpenseFilters>,
) -> ApiResponse<Envelope<Vec<reps::ExpenseRep>>> {
    let query = filters.into_query(claims.user_id())?;
    let expenses = expense_service.list_expenses(&query).await?;

    Ok(Envelope::data(
        expenses.into_iter().map(reps::ExpenseRep::from).collect(),
    ))
}

async fn get_expense(
    claims: TokenClaims,
    State(expense_service): State<ExpenseService>,
    PathParams(expense_id): PathParams<Uuid>,
) -> ApiResponse<Envelope<reps::ExpenseRep>> {
    let expense = expense_service
        .get_expense(claims.user_id(), expense_id)
        .await?;

    Ok(Envelope::data(expense.into()))
}

async fn create_expense(
    claims: TokenClaims,
    State(expense_service): State<ExpenseService>,
    JsonBody(data): JsonBody<ExpenseData>,
) -> ApiResponse<Created<reps::ExpenseRep>> {
    let expense = expense_service
        .create_expense(claims.user_id(), data)
        .await?;

    Ok(Created(
        Envelope::data(expense.into()).with_message("Expense created."),
    ))
}

async fn update_expense(
    claims: TokenClaims,
    State(expense_service): State<ExpenseService>,
    PathParams(expense_id): PathParams<Uuid>,
    JsonBody(data): JsonBody<ExpenseData>,
) -> ApiResponse<Envelope<reps::ExpenseRep>> {
    let expense = expense_service
        .update_expense(claims.user_id(), expense_id, data)
        .await?;

    Ok(Envelope::data(expense.into()).with_message("Expense updated."))
}

async fn delete_expense(
    claims: TokenClaims,
    State(expense_service): State<ExpenseService>,
    PathParams(expense_id): PathParams<Uuid>,
) -> ApiResponse<Envelope<()>> {
    expense_service
        .delete_expense(claims.user_id(), expense_id)
        .await?;

    Ok(Envelope::message("Expense deleted."))
}
