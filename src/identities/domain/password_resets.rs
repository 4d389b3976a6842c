use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use semval::prelude::*;
use uuid::Uuid;

use super::email::{Email, EmailInvalidity};

/// How long a password reset token may be used after it is issued.
pub fn reset_token_lifetime() -> Duration {
    Duration::hours(1)
}

#[derive(Debug)]
pub struct NewPasswordReset {
    email: Email,
    token: String,
}

const RESET_TOKEN_LENGTH: usize = 64;

impl NewPasswordReset {
    /// Create a new password reset.
    ///
    /// # Arguments
    ///
    /// * `email` - The email address of the user requesting a password reset.
    ///
    /// # Returns
    ///
    /// A new password reset for the provided email address with a randomly
    /// generated token.
    pub fn new(email: Email) -> Self {
        let token: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(RESET_TOKEN_LENGTH)
            .map(char::from)
            .collect();

        Self { email, token }
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl Validate for NewPasswordReset {
    type Invalidity = EmailInvalidity;

    fn validate(&self) -> ValidationResult<Self::Invalidity> {
        ValidationContext::new().validate(&self.email).into()
    }
}

impl ValidatedFrom<&str> for NewPasswordReset {
    fn validated_from(from: &str) -> ValidatedResult<Self> {
        let into = Self::new(Email::unvalidated(from.to_owned()));

        match into.validate() {
            Ok(()) => Ok(into),
            Err(context) => Err((into, context)),
        }
    }
}

/// A persisted password reset token.
#[derive(Clone, Debug, PartialEq)]
pub struct PasswordResetTokenData {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PasswordResetTokenInvalidity {
    Expired,
}

impl PasswordResetTokenData {
    /// Ensure the token may still be used at `now`.
    pub fn check_usable_at(&self, now: DateTime<Utc>) -> Result<(), PasswordResetTokenInvalidity> {
        if now - self.created_at > reset_token_lifetime() {
            Err(PasswordResetTokenInvalidity::Expired)
        } else {
            Ok(())
        }
    }
}
