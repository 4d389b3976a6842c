use std::{convert::TryFrom, sync::Arc};

use anyhow::Context;
use chrono::Utc;
use semval::{context::Context as ValidationContext, ValidatedFrom};
use tera::Tera;
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::{
    categories::domain::default_categories,
    email::{
        clients::{EmailClient, Message},
        templates,
    },
    models::NewUserModel,
    passwords::{self, Password, PasswordInvalidity},
    rate_limit::{self, RateLimitError, RateLimiter},
    repos::{
        DynEmailRepo, DynPasswordResetRepo, DynUserRepo, EmailVerificationError,
        UserPersistenceError,
    },
};

use super::{
    domain::{
        email::{Email, EmailInvalidity, EmailVerification},
        password_resets::NewPasswordReset,
        users::{NewUser, NewUserData, NewUserInvalidity, ProfileUpdate, User, UserCredentials},
    },
    models::{email::NewEmailVerification, password_resets::NewPasswordResetModel},
};

/// The number of attempts a client may make per minute at each
/// unauthenticated identity operation.
pub const IDENTITY_OPERATIONS_PER_MINUTE: u64 = 10;

/// A service object providing functionality relating to emails.
#[derive(Clone)]
pub struct EmailService {
    email_repo: DynEmailRepo,
}

impl EmailService {
    pub fn new(email_repo: DynEmailRepo) -> Self {
        Self { email_repo }
    }

    /// Mark the address owning a verification token as verified.
    ///
    /// Expired tokens are deleted and rejected.
    ///
    /// # Returns
    ///
    /// The ID of the user whose address was verified.
    pub async fn verify_email(&self, token: &str) -> Result<Uuid, EmailVerificationError> {
        let verification = self
            .email_repo
            .get_verification(token)
            .await?
            .ok_or(EmailVerificationError::NotFound)?;

        if verification.is_expired_at(Utc::now()) {
            debug!(user_id = %verification.user_id, "Email verification token expired.");
            self.email_repo.delete_verification_by_token(token).await?;

            return Err(EmailVerificationError::Expired);
        }

        let user_id = self.email_repo.mark_email_as_verified(token).await?;
        self.email_repo.delete_verification_by_token(token).await?;

        info!(%user_id, "Verified email address.");

        Ok(user_id)
    }
}

pub type DynEmailClient = Arc<dyn EmailClient>;
pub type DynRateLimiter = Arc<dyn RateLimiter>;

/// A service object providing functionality relating to users.
#[derive(Clone)]
pub struct UserService {
    email_client: DynEmailClient,
    email_repo: DynEmailRepo,
    frontend_url: String,
    rate_limiter: DynRateLimiter,
    reset_repo: DynPasswordResetRepo,
    templates: Tera,
    user_repo: DynUserRepo,
}

#[derive(Debug, Error)]
pub enum CreateUserError {
    /// The provided user data is invalid.
    #[error("invalid user data: {0:?}")]
    InvalidUser(ValidationContext<NewUserInvalidity>),

    #[error("a user with the provided email already exists")]
    DuplicateEmail,

    /// The operation is rate limited for the provided client.
    #[error("operation is rate limited")]
    RateLimited(#[from] RateLimitError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum LoginError {
    /// The email is unknown or the password does not match.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("operation is rate limited")]
    RateLimited(#[from] RateLimitError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum PasswordResetRequestError {
    #[error("invalid email: {0:?}")]
    InvalidEmail(ValidationContext<EmailInvalidity>),

    #[error("operation is rate limited")]
    RateLimited(#[from] RateLimitError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ResetPasswordError {
    /// The token does not exist or has expired.
    #[error("invalid or expired password reset token")]
    InvalidToken,

    #[error("invalid password: {0:?}")]
    InvalidPassword(ValidationContext<PasswordInvalidity>),

    #[error("operation is rate limited")]
    RateLimited(#[from] RateLimitError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ChangePasswordError {
    #[error("current password is incorrect")]
    IncorrectPassword,

    #[error("invalid password: {0:?}")]
    InvalidPassword(ValidationContext<PasswordInvalidity>),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl UserService {
    /// Create a new user service.
    ///
    /// # Arguments
    ///
    /// * `email_client` - The client used to send emails.
    /// * `email_repo` - The repository used to persist email verifications.
    /// * `frontend_url` - The base URL of the web application that links in
    ///   emails point to.
    /// * `rate_limiter` - The rate limiter to use for rate limited operations.
    /// * `reset_repo` - The repository used to persist password resets.
    /// * `templates` - The templating engine to use for composing email
    ///   content.
    /// * `user_repo` - The repository used to persist and query user
    ///   information.
    pub fn new(
        email_client: DynEmailClient,
        email_repo: DynEmailRepo,
        frontend_url: String,
        rate_limiter: DynRateLimiter,
        reset_repo: DynPasswordResetRepo,
        templates: Tera,
        user_repo: DynUserRepo,
    ) -> Self {
        Self {
            email_client,
            email_repo,
            frontend_url: frontend_url.trim_end_matches('/').to_owned(),
            rate_limiter,
            reset_repo,
            templates,
            user_repo,
        }
    }

    /// Create a new user.
    ///
    /// The user is persisted along with their default categories, and then a
    /// verification email is sent to the provided address.
    ///
    /// # Arguments
    ///
    /// * `client_identifier` - A unique identifier for the client performing
    ///   the operation. This is used for rate limiting.
    /// * `new_user_data` - The new user's information.
    pub async fn create_user(
        &self,
        client_identifier: &str,
        new_user_data: NewUserData,
    ) -> Result<User, CreateUserError> {
        let rate_limit_key = format!("/auth/register_post_{}", client_identifier);
        rate_limit::enforce(
            self.rate_limiter.as_ref(),
            &rate_limit_key,
            IDENTITY_OPERATIONS_PER_MINUTE,
        )?;

        let new_user = NewUser::validated_from(new_user_data)
            .map_err(|(_, context)| CreateUserError::InvalidUser(context))?;

        let user_model = NewUserModel::try_from(&new_user)
            .context("Failed to convert from domain to model.")?;
        let categories = default_categories(new_user.id());

        let user = match self
            .user_repo
            .persist_new_user(&user_model, &categories)
            .await
        {
            Ok(user) => user,
            Err(UserPersistenceError::DuplicateEmail(email)) => {
                debug!(%email, "Rejected registration with duplicate email.");

                return Err(CreateUserError::DuplicateEmail);
            }
            Err(UserPersistenceError::Other(error)) => {
                error!(?error, "Failed to persist new user.");

                return Err(error.into());
            }
        };

        let verification = EmailVerification::new();
        self.email_repo
            .insert_verification(&NewEmailVerification::new(user.id, &verification))
            .await
            .context("Failed to save email verification.")?;

        let mut verification_context = self.email_context();
        verification_context.insert("token", verification.token());
        verification_context.insert("first_name", &user.first_name);

        let content = self
            .templates
            .render(templates::VERIFY_EMAIL, &verification_context)
            .context("Failed to render email verification template.")?;

        self.email_client
            .send(&Message {
                to: new_user.email().address().to_owned(),
                subject: "Please Confirm your Email".to_owned(),
                text: content,
            })
            .await
            .context("Failed to send verification email.")?;

        info!(user_id = %user.id, "Registered new user.");

        Ok(user)
    }

    /// Check a user's login credentials.
    ///
    /// # Returns
    ///
    /// The credentials of the user if the email and password match.
    pub async fn authenticate(
        &self,
        client_identifier: &str,
        email: &str,
        password: &str,
    ) -> Result<UserCredentials, LoginError> {
        let rate_limit_key = format!("/auth/login_post_{}", client_identifier);
        rate_limit::enforce(
            self.rate_limiter.as_ref(),
            &rate_limit_key,
            IDENTITY_OPERATIONS_PER_MINUTE,
        )?;

        let normalized = Email::unvalidated(email.to_owned()).normalized();
        let credentials = match self.user_repo.get_credentials_by_email(&normalized).await? {
            Some(credentials) => credentials,
            None => {
                debug!("Login attempted for unknown email.");

                return Err(LoginError::InvalidCredentials);
            }
        };

        let hash = passwords::Hash::parse(&credentials.password_hash)
            .context("Invalid password hash received from database.")?;

        if hash.verify(password)? {
            debug!(user_id = %credentials.id, "Validated user credentials.");

            Ok(credentials)
        } else {
            debug!(user_id = %credentials.id, "Rejected incorrect password.");

            Err(LoginError::InvalidCredentials)
        }
    }

    /// Start the password reset process for an email address.
    ///
    /// If the address belongs to a user, a reset token is saved and emailed to
    /// them. Otherwise the address is told that no account exists. Callers
    /// cannot tell which happened.
    pub async fn request_password_reset(
        &self,
        client_identifier: &str,
        email: &str,
    ) -> Result<(), PasswordResetRequestError> {
        let rate_limit_key = format!("/auth/forgot-password_post_{}", client_identifier);
        rate_limit::enforce(
            self.rate_limiter.as_ref(),
            &rate_limit_key,
            IDENTITY_OPERATIONS_PER_MINUTE,
        )?;

        let reset = NewPasswordReset::validated_from(email)
            .map_err(|(_, context)| PasswordResetRequestError::InvalidEmail(context))?;

        let credentials = self
            .user_repo
            .get_credentials_by_email(&reset.email().normalized())
            .await?;

        let mut context = self.email_context();
        let template = match credentials {
            Some(credentials) => {
                self.reset_repo
                    .insert_reset(&NewPasswordResetModel::for_user(credentials.id, &reset))
                    .await
                    .context("Failed to save password reset.")?;
                context.insert("token", reset.token());

                debug!(user_id = %credentials.id, "Created password reset token.");

                templates::RESET_PASSWORD_TOKEN
            }
            None => templates::RESET_PASSWORD_NO_ACCOUNT,
        };

        let content = self
            .templates
            .render(template, &context)
            .context("Failed to render password reset template.")?;

        self.email_client
            .send(&Message {
                to: reset.email().address().to_owned(),
                subject: "Password Reset Request".to_owned(),
                text: content,
            })
            .await
            .context("Failed to send password reset email.")?;

        Ok(())
    }

    /// Set a new password using a reset token.
    ///
    /// Every outstanding reset token for the user is discarded afterwards.
    pub async fn reset_password(
        &self,
        client_identifier: &str,
        token: &str,
        new_password: &str,
    ) -> Result<(), ResetPasswordError> {
        let rate_limit_key = format!("/auth/reset-password_post_{}", client_identifier);
        rate_limit::enforce(
            self.rate_limiter.as_ref(),
            &rate_limit_key,
            IDENTITY_OPERATIONS_PER_MINUTE,
        )?;

        let reset = self
            .reset_repo
            .get_reset(token)
            .await?
            .ok_or(ResetPasswordError::InvalidToken)?;

        if let Err(invalidity) = reset.check_usable_at(Utc::now()) {
            debug!(user_id = %reset.user_id, ?invalidity, "Rejected password reset token.");

            return Err(ResetPasswordError::InvalidToken);
        }

        let password = Password::validated_from(new_password)
            .map_err(|(_, context)| ResetPasswordError::InvalidPassword(context))?;
        let hash = passwords::Hash::of(&password)?;

        self.user_repo.update_password(reset.user_id, &hash).await?;
        self.reset_repo.delete_resets_for_user(reset.user_id).await?;

        info!(user_id = %reset.user_id, "Reset user's password.");

        Ok(())
    }

    pub async fn get_profile(&self, user_id: Uuid) -> anyhow::Result<Option<User>> {
        self.user_repo.get_user(user_id).await
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> anyhow::Result<Option<User>> {
        self.user_repo.update_profile(user_id, update).await
    }

    /// Replace a user's password after confirming their current one.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ChangePasswordError> {
        let credentials = self
            .user_repo
            .get_credentials(user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Authenticated user {} does not exist.", user_id))?;

        let current_hash = passwords::Hash::parse(&credentials.password_hash)
            .context("Invalid password hash received from database.")?;
        if !current_hash.verify(current_password)? {
            return Err(ChangePasswordError::IncorrectPassword);
        }

        let password = Password::validated_from(new_password)
            .map_err(|(_, context)| ChangePasswordError::InvalidPassword(context))?;
        let hash = passwords::Hash::of(&password)?;

        self.user_repo.update_password(user_id, &hash).await?;

        info!(%user_id, "Changed user's password.");

        Ok(())
    }

    fn email_context(&self) -> tera::Context {
        let mut context = tera::Context::new();
        context.insert("frontend_url", &self.frontend_url);

        context
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::{
        email::{clients::test_support::RecordingMailer, load_templates},
        rate_limit::UnlimitedRateLimiter,
        repos::memory::MemoryStore,
    };

    pub const FRONTEND_URL: &str = "https://app.example.com";

    pub fn user_service(
        store: &MemoryStore,
        mailer: Arc<RecordingMailer>,
        rate_limiter: DynRateLimiter,
    ) -> UserService {
        UserService::new(
            mailer,
            Arc::new(store.clone()),
            FRONTEND_URL.to_owned(),
            rate_limiter,
            Arc::new(store.clone()),
            load_templates().unwrap(),
            Arc::new(store.clone()),
        )
    }

    pub fn unlimited_user_service(store: &MemoryStore) -> (UserService, Arc<RecordingMailer>) {
        let mailer = Arc::new(RecordingMailer::default());
        let service = user_service(store, mailer.clone(), Arc::new(UnlimitedRateLimiter));

        (service, mailer)
    }

    pub fn registration(email: &str, password: &str) -> NewUserData {
        NewUserData {
            email: email.to_owned(),
            password: password.to_owned(),
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
        }
    }
}

#[cfg(test)]
mod test {
    use chrono::Duration;

    use super::{test_support::*, *};
    use crate::{
        rate_limit::test_support::CountingRateLimiter,
        email::clients::test_support::RecordingMailer,
        repos::{memory::MemoryStore, CategoryRepo},
    };

    const CLIENT: &str = "127.0.0.1";

    #[tokio::test]
    async fn create_user_sends_verification() {
        let store = MemoryStore::new();
        let (service, mailer) = unlimited_user_service(&store);

        let user = service
            .create_user(CLIENT, registration("ada@Example.com", "hunter22"))
            .await
            .unwrap();

        assert_eq!("ada@example.com", user.email);
        assert!(user.email_verified_at.is_none());

        let tokens = store.verification_tokens(user.id);
        assert_eq!(1, tokens.len());

        let sent = mailer.sent();
        assert_eq!(1, sent.len());
        assert_eq!("ada@Example.com", sent[0].to);
        assert!(sent[0]
            .text
            .contains(&format!("{}/verify-email?token={}", FRONTEND_URL, tokens[0])));
    }

    #[tokio::test]
    async fn create_user_adds_default_categories() {
        let store = MemoryStore::new();
        let (service, _) = unlimited_user_service(&store);

        let user = service
            .create_user(CLIENT, registration("ada@example.com", "hunter22"))
            .await
            .unwrap();

        assert_eq!(12, store.list_categories(user.id).await.unwrap().len());
    }

    #[tokio::test]
    async fn create_user_duplicate_email() {
        let store = MemoryStore::new();
        let (service, mailer) = unlimited_user_service(&store);

        service
            .create_user(CLIENT, registration("ada@example.com", "hunter22"))
            .await
            .unwrap();
        let error = service
            .create_user(CLIENT, registration("ada@EXAMPLE.com", "hunter22"))
            .await
            .expect_err("duplicate should be rejected");

        assert!(matches!(error, CreateUserError::DuplicateEmail));
        assert_eq!(1, mailer.sent().len());
    }

    #[tokio::test]
    async fn create_user_invalid() {
        let store = MemoryStore::new();
        let (service, mailer) = unlimited_user_service(&store);

        let error = service
            .create_user(CLIENT, registration("nope", "short"))
            .await
            .expect_err("invalid user should be rejected");

        assert!(matches!(error, CreateUserError::InvalidUser(_)));
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn create_user_rate_limited() {
        let store = MemoryStore::new();
        let mailer = Arc::new(RecordingMailer::default());
        let service = user_service(&store, mailer, Arc::new(CountingRateLimiter::default()));

        for i in 0..IDENTITY_OPERATIONS_PER_MINUTE {
            service
                .create_user(CLIENT, registration(&format!("user{}@example.com", i), "hunter22"))
                .await
                .unwrap();
        }

        let error = service
            .create_user(CLIENT, registration("late@example.com", "hunter22"))
            .await
            .expect_err("registration should be limited");

        assert!(matches!(error, CreateUserError::RateLimited(_)));
    }

    #[tokio::test]
    async fn authenticate_checks_password() {
        let store = MemoryStore::new();
        let (service, _) = unlimited_user_service(&store);
        let user = service
            .create_user(CLIENT, registration("ada@example.com", "hunter22"))
            .await
            .unwrap();

        let credentials = service
            .authenticate(CLIENT, "ada@EXAMPLE.com", "hunter22")
            .await
            .unwrap();
        assert_eq!(user.id, credentials.id);

        let wrong = service
            .authenticate(CLIENT, "ada@example.com", "hunter23")
            .await;
        assert!(matches!(wrong, Err(LoginError::InvalidCredentials)));

        let unknown = service
            .authenticate(CLIENT, "bob@example.com", "hunter22")
            .await;
        assert!(matches!(unknown, Err(LoginError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn verify_email_consumes_token() {
        let store = MemoryStore::new();
        let (service, _) = unlimited_user_service(&store);
        let email_service = EmailService::new(Arc::new(store.clone()));
        let user = service
            .create_user(CLIENT, registration("ada@example.com", "hunter22"))
            .await
            .unwrap();
        let token = store.verification_tokens(user.id).remove(0);

        assert_eq!(user.id, email_service.verify_email(&token).await.unwrap());

        let profile = service.get_profile(user.id).await.unwrap().unwrap();
        assert!(profile.email_verified_at.is_some());
        assert!(matches!(
            email_service.verify_email(&token).await,
            Err(EmailVerificationError::NotFound)
        ));
    }

    #[tokio::test]
    async fn verify_email_rejects_expired_token() {
        let store = MemoryStore::new();
        let (service, _) = unlimited_user_service(&store);
        let email_service = EmailService::new(Arc::new(store.clone()));
        let user = service
            .create_user(CLIENT, registration("ada@example.com", "hunter22"))
            .await
            .unwrap();
        let token = store.verification_tokens(user.id).remove(0);
        store.set_verification_created_at(&token, Utc::now() - Duration::hours(25));

        assert!(matches!(
            email_service.verify_email(&token).await,
            Err(EmailVerificationError::Expired)
        ));

        let profile = service.get_profile(user.id).await.unwrap().unwrap();
        assert!(profile.email_verified_at.is_none());
        assert!(store.verification_tokens(user.id).is_empty());
    }

    #[tokio::test]
    async fn request_password_reset_unknown_email() {
        let store = MemoryStore::new();
        let (service, mailer) = unlimited_user_service(&store);

        service
            .request_password_reset(CLIENT, "nobody@example.com")
            .await
            .unwrap();

        let sent = mailer.sent();
        assert_eq!(1, sent.len());
        assert!(sent[0].text.contains("associated with it"));
        assert!(!sent[0].text.contains("token="));
    }

    #[tokio::test]
    async fn reset_password_flow() {
        let store = MemoryStore::new();
        let (service, mailer) = unlimited_user_service(&store);
        let user = service
            .create_user(CLIENT, registration("ada@example.com", "hunter22"))
            .await
            .unwrap();

        service
            .request_password_reset(CLIENT, "ada@example.com")
            .await
            .unwrap();
        let token = store.reset_tokens(user.id).remove(0);
        assert!(mailer.sent()[1].text.contains(&token));

        service
            .reset_password(CLIENT, &token, "new-password")
            .await
            .unwrap();

        assert!(store.reset_tokens(user.id).is_empty());
        service
            .authenticate(CLIENT, "ada@example.com", "new-password")
            .await
            .expect("new password should work");
        assert!(matches!(
            service.reset_password(CLIENT, &token, "another-one").await,
            Err(ResetPasswordError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn reset_password_expired_token() {
        let store = MemoryStore::new();
        let (service, _) = unlimited_user_service(&store);
        let user = service
            .create_user(CLIENT, registration("ada@example.com", "hunter22"))
            .await
            .unwrap();
        service
            .request_password_reset(CLIENT, "ada@example.com")
            .await
            .unwrap();
        let token = store.reset_tokens(user.id).remove(0);
        store.set_reset_created_at(&token, Utc::now() - Duration::hours(2));

        let result = service.reset_password(CLIENT, &token, "new-password").await;

        assert!(matches!(result, Err(ResetPasswordError::InvalidToken)));
    }

    #[tokio::test]
    async fn reset_password_validates_password() {
        let store = MemoryStore::new();
        let (service, _) = unlimited_user_service(&store);
        let user = service
            .create_user(CLIENT, registration("ada@example.com", "hunter22"))
            .await
            .unwrap();
        service
            .request_password_reset(CLIENT, "ada@example.com")
            .await
            .unwrap();
        let token = store.reset_tokens(user.id).remove(0);

        let result = service.reset_password(CLIENT, &token, "short").await;

        assert!(matches!(result, Err(ResetPasswordError::InvalidPassword(_))));
        assert_eq!(1, store.reset_tokens(user.id).len());
    }

    #[tokio::test]
    async fn change_password_requires_current_password() {
        let store = MemoryStore::new();
        let (service, _) = unlimited_user_service(&store);
        let user = service
            .create_user(CLIENT, registration("ada@example.com", "hunter22"))
            .await
            .unwrap();

        let wrong = service
            .change_password(user.id, "not-it", "new-password")
            .await;
        assert!(matches!(wrong, Err(ChangePasswordError::IncorrectPassword)));

        service
            .change_password(user.id, "hunter22", "new-password")
            .await
            .unwrap();
        service
            .authenticate(CLIENT, "ada@example.com", "new-password")
            .await
            .expect("new password should work");
    }
}
