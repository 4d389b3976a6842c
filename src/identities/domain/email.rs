use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use semval::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Email(String);

impl Email {
    /// Create an unvalidated email.
    ///
    /// This can be useful when constructing an object that contains an email
    /// but has not been validated yet.
    ///
    /// # Arguments
    ///
    /// * `address` - The email's address.
    pub fn unvalidated(address: String) -> Self {
        Self(address.trim().to_owned())
    }

    pub fn address(&self) -> &str {
        &self.0
    }

    /// The address used to look up accounts.
    ///
    /// Only the domain of an address is case insensitive, so the local part
    /// is left untouched.
    pub fn normalized(&self) -> String {
        match self.0.rsplit_once('@') {
            Some((local_part, domain)) => format!("{}@{}", local_part, domain.to_lowercase()),
            None => self.0.clone(),
        }
    }

    fn has_domain(&self) -> bool {
        if let Some(index) = self.0.rfind('@') {
            index < self.0.len() - 1
        } else {
            false
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EmailInvalidity {
    /// The address does not have a domain portion.
    MissingDomain,

    /// The address is missing the `@` symbol separating the local and domain
    /// parts.
    MissingSeparator,
}

impl EmailInvalidity {
    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingDomain => "Email is missing a domain.",
            Self::MissingSeparator => "Email is missing an '@' symbol.",
        }
    }
}

impl Validate for Email {
    type Invalidity = EmailInvalidity;

    fn validate(&self) -> ValidationResult<Self::Invalidity> {
        ValidationContext::new()
            .invalidate_if(!self.0.contains('@'), EmailInvalidity::MissingSeparator)
            .invalidate_if(!self.has_domain(), EmailInvalidity::MissingDomain)
            .into()
    }
}

impl ValidatedFrom<&str> for Email {
    fn validated_from(from: &str) -> ValidatedResult<Self> {
        let into = Self::unvalidated(from.to_owned());

        match into.validate() {
            Ok(()) => Ok(into),
            Err(context) => Err((into, context)),
        }
    }
}

const VERIFICATION_TOKEN_LENGTH: usize = 64;

/// A random token proving ownership of an email address.
pub struct EmailVerification {
    token: String,
}

impl EmailVerification {
    pub fn new() -> Self {
        let token: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(VERIFICATION_TOKEN_LENGTH)
            .map(char::from)
            .collect();

        Self { token }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl Default for EmailVerification {
    fn default() -> Self {
        Self::new()
    }
}

/// How long a verification link stays valid after it is sent.
pub fn verification_token_lifetime() -> Duration {
    Duration::hours(24)
}

/// A persisted email verification token.
#[derive(Clone, Debug, PartialEq)]
pub struct EmailVerificationData {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl EmailVerificationData {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > verification_token_lifetime()
    }
}
