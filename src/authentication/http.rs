use axum::{extract::State, routing::post, Router};
use tracing::error;

use crate::{
    client_ip::ClientIp,
    envelope::{Envelope, JsonBody},
    http_err::{ApiError, ApiResponse},
    identities::{
        http::reps::{LoginRequest, SessionRep},
        services::{LoginError, UserService},
    },
    server::AppState,
};

use super::JwtKeys;

pub fn routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

async fn login(
    ClientIp(client_ip): ClientIp,
    State(user_service): State<UserService>,
    State(jwt_keys): State<JwtKeys>,
    JsonBody(credentials): JsonBody<LoginRequest>,
) -> ApiResponse<Envelope<SessionRep>> {
    let user_credentials = user_service
        .authenticate(
            &client_ip.to_string(),
            &credentials.email,
            &credentials.password,
        )
        .await
        .map_err(|error| match error {
            LoginError::InvalidCredentials => {
                ApiError::BadRequestReason("Invalid credentials".to_owned())
            }
            LoginError::RateLimited(error) => error.into(),
            LoginError::Other(error) => error.into(),
        })?;

    let token = jwt_keys.issue_for(&user_credentials)?;
    let user = match user_service.get_profile(user_credentials.id).await? {
        Some(user) => user,
        None => {
            error!(user_id = %user_credentials.id, "User disappeared during login.");

            return Err(ApiError::InternalServerError);
        }
    };

    Ok(Envelope::data(SessionRep {
        token,
        user: user.into(),
    }))
}
