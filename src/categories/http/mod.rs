use axum::{extract::State, routing::get, Router};
use uuid::Uuid;

use crate::{
    authentication::TokenClaims,
    envelope::{Created, Envelope, JsonBody, PathParams},
    http_err::{ApiError, ApiResponse},
    server::AppState,
};

use super::{
    domain::CategoryData,
    services::{CategoryError, CategoryService},
};

pub mod reps;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/:category_id",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
}

impl From<CategoryError> for ApiError {
    fn from(error: CategoryError) -> Self {
        match error {
            CategoryError::Invalid(errors) => errors.into(),
            CategoryError::NotFound => ApiError::not_found("Category"),
            CategoryError::InUse => ApiError::Conflict(
                "Category is used by expenses or budgets and cannot be deleted.".to_owned(),
            ),
            CategoryError::Other(error) => error.into(),
        }
    }
}

async fn list_categories(
    claims: TokenClaims,
    State(category_service): State<CategoryService>,
) -> ApiResponse<Envelope<Vec<reps::CategoryRep>>> {
    let categories = category_service.list_categories(claims.user_id()).await?;

    Ok(Envelope::data(
        categories.into_iter().map(reps::CategoryRep::from).collect(),
    ))
}

async fn get_category(
    claims: TokenClaims,
    State(category_service): State<CategoryService>,
    PathParams(category_id): PathParams<Uuid>,
) -> ApiResponse<Envelope<reps::CategoryRep>> {
    let category = category_service
        .get_category(claims.user_id(), category_id)
        .await?;

    Ok(Envelope::data(category.into()))
}

async fn create_category(
    claims: TokenClaims,
    State(category_service): State<CategoryService>,
    JsonBody(data): JsonBody<CategoryData>,
) -> ApiResponse<Created<reps::CategoryRep>> {
    let category = category_service
        .create_category(claims.user_id(), data)
        .await?;

    Ok(Created(
        Envelope::data(category.into()).with_message("Category created."),
    ))
}

async fn update_category(
    claims: TokenClaims,
    State(category_service): State<CategoryService>,
    PathParams(category_id): PathParams<Uuid>,
    JsonBody(data): JsonBody<CategoryData>,
) -> ApiResponse<Envelope<reps::CategoryRep>> {
    let category = category_service
        .update_category(claims.user_id(), category_id, data)
        .await?;

    Ok(Envelope::data(category.into()).with_message("Category updated."))
}

async fn delete_category(
    claims: TokenClaims,
    State(category_service): State<CategoryService>,
    PathParams(category_id): PathParams<Uuid>,
) -> ApiResponse<Envelope<()>> {
    category_service
        .delete_category(claims.user_id(), category_id)
        .await?;

    Ok(Envelope::message("Category deleted."))
}
