use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use tracing::{debug, error};
use validator::Validate;

use crate::{
    authentication::{JwtKeys, TokenClaims},
    client_ip::ClientIp,
    envelope::{Created, Envelope, JsonBody, QueryParams},
    http_err::{ApiError, ApiResponse},
    repos::EmailVerificationError,
    server::AppState,
};

use super::{
    domain::users::ProfileUpdate,
    services::{
        ChangePasswordError, CreateUserError, EmailService, PasswordResetRequestError,
        ResetPasswordError, UserService,
    },
};

pub mod reps;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/me", get(get_me).put(update_me))
        .route("/change-password", post(change_password))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/verify-email", get(verify_email))
}

async fn register(
    ClientIp(client_ip): ClientIp,
    State(user_service): State<UserService>,
    State(jwt_keys): State<JwtKeys>,
    JsonBody(request): JsonBody<reps::RegisterRequest>,
) -> ApiResponse<Created<reps::SessionRep>> {
    let user = user_service
        .create_user(&client_ip.to_string(), request.into())
        .await
        .map_err(|error| match error {
            CreateUserError::InvalidUser(context) => {
                ApiError::Validation(reps::new_user_errors(context))
            }
            CreateUserError::DuplicateEmail => {
                ApiError::Conflict("An account with this email already exists.".to_owned())
            }
            CreateUserError::RateLimited(error) => error.into(),
            CreateUserError::Other(error) => error.into(),
        })?;

    let token = jwt_keys.issue(user.id, &user.email, user.role)?;

    Ok(Created(
        Envelope::data(reps::SessionRep {
            token,
            user: user.into(),
        })
        .with_message("Registration successful."),
    ))
}

async fn get_me(
    claims: TokenClaims,
    State(user_service): State<UserService>,
) -> ApiResponse<Envelope<reps::UserRep>> {
    match user_service.get_profile(claims.user_id()).await? {
        Some(user) => Ok(Envelope::data(user.into())),
        None => {
            debug!(user_id = %claims.user_id(), "Token refers to a missing user.");

            Err(ApiError::not_found("User"))
        }
    }
}

async fn update_me(
    claims: TokenClaims,
    State(user_service): State<UserService>,
    JsonBody(request): JsonBody<reps::ProfileUpdateRequest>,
) -> ApiResponse<Envelope<reps::UserRep>> {
    request.validate()?;
    let update = ProfileUpdate::from(request);

    match user_service
        .update_profile(claims.user_id(), &update)
        .await?
    {
        Some(user) => Ok(Envelope::data(user.into()).with_message("Profile updated.")),
        None => Err(ApiError::not_found("User")),
    }
}

async fn change_password(
    claims: TokenClaims,
    State(user_service): State<UserService>,
    JsonBody(request): JsonBody<reps::ChangePasswordRequest>,
) -> ApiResponse<Envelope<()>> {
    user_service
        .change_password(
            claims.user_id(),
            &request.current_password,
            &request.new_password,
        )
        .await
        .map_err(|error| match error {
            ChangePasswordError::IncorrectPassword => {
                ApiError::field("currentPassword", "Current password is incorrect.")
            }
            ChangePasswordError::InvalidPassword(context) => {
                ApiError::Validation(reps::password_errors("newPassword", context))
            }
            ChangePasswordError::Other(error) => error.into(),
        })?;

    Ok(Envelope::message("Password changed successfully."))
}

async fn forgot_password(
    ClientIp(client_ip): ClientIp,
    State(user_service): State<UserService>,
    JsonBody(request): JsonBody<reps::ForgotPasswordRequest>,
) -> ApiResponse<Envelope<()>> {
    user_service
        .request_password_reset(&client_ip.to_string(), &request.email)
        .await
        .map_err(|error| match error {
            PasswordResetRequestError::InvalidEmail(context) => {
                ApiError::Validation(reps::email_errors(context))
            }
            PasswordResetRequestError::RateLimited(error) => error.into(),
            PasswordResetRequestError::Other(error) => error.into(),
        })?;

    Ok(Envelope::message(
        "If an account exists for that email, a password reset link has been sent.",
    ))
}

async fn reset_password(
    ClientIp(client_ip): ClientIp,
    State(user_service): State<UserService>,
    JsonBody(request): JsonBody<reps::ResetPasswordRequest>,
) -> ApiResponse<Envelope<()>> {
    user_service
        .reset_password(&client_ip.to_string(), &request.token, &request.password)
        .await
        .map_err(|error| match error {
            ResetPasswordError::InvalidToken => ApiError::BadRequestReason(
                "The password reset token has expired or does not exist.".to_owned(),
            ),
            ResetPasswordError::InvalidPassword(context) => {
                ApiError::Validation(reps::password_errors("password", context))
            }
            ResetPasswordError::RateLimited(error) => error.into(),
            ResetPasswordError::Other(error) => error.into(),
        })?;

    Ok(Envelope::message("Password reset successfully."))
}

async fn verify_email(
    State(email_service): State<EmailService>,
    QueryParams(params): QueryParams<reps::VerifyEmailParams>,
) -> ApiResponse<Envelope<()>> {
    match email_service.verify_email(&params.token).await {
        Ok(_) => Ok(Envelope::message("Email verified successfully.")),
        Err(EmailVerificationError::NotFound) => Err(ApiError::BadRequestReason(
            "Invalid or expired verification token.".to_owned(),
        )),
        Err(EmailVerificationError::Expired) => Err(ApiError::BadRequestReason(
            "Verification token has expired.".to_owned(),
        )),
        Err(EmailVerificationError::Other(error)) => {
            error!(?error, "Failed to verify email.");

            Err(ApiError::InternalServerError)
        }
    }
}
