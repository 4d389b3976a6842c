use std::{fmt, str::FromStr};

use anyhow::Result;
use chrono::{DateTime, Utc};
use semval::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::passwords::{self, Password, PasswordInvalidity};

use super::email::{Email, EmailInvalidity};

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown role: {0:?}")]
pub struct UnknownRole(String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownRole(other.to_owned())),
        }
    }
}

/// A registered user. Never carries the password hash.
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    pub preferences: serde_json::Value,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The information needed to check a user's login attempt.
#[derive(Clone, Debug)]
pub struct UserCredentials {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
}

#[derive(Debug)]
pub struct NewUser {
    id: Uuid,
    email: Email,
    password: Password,
    first_name: PersonName,
    last_name: PersonName,
}

impl NewUser {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn first_name(&self) -> &str {
        &self.first_name.0
    }

    pub fn last_name(&self) -> &str {
        &self.last_name.0
    }

    pub fn password_hash(&self) -> Result<passwords::Hash> {
        passwords::Hash::of(&self.password)
    }
}

const MAX_NAME_LENGTH: usize = 100;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NameInvalidity {
    Missing,
    MaxLength(usize),
}

impl NameInvalidity {
    pub fn message(&self, field: &str) -> String {
        match self {
            Self::Missing => format!("{} is required.", field),
            Self::MaxLength(max) => format!("{} may not exceed {} characters.", field, max),
        }
    }
}

/// A first or last name.
#[derive(Debug)]
struct PersonName(String);

impl Validate for PersonName {
    type Invalidity = NameInvalidity;

    fn validate(&self) -> ValidationResult<Self::Invalidity> {
        ValidationContext::new()
            .invalidate_if(self.0.is_empty(), NameInvalidity::Missing)
            .invalidate_if(
                self.0.chars().count() > MAX_NAME_LENGTH,
                NameInvalidity::MaxLength(MAX_NAME_LENGTH),
            )
            .into()
    }
}

#[derive(Debug)]
pub enum NewUserInvalidity {
    Email(EmailInvalidity),
    Password(PasswordInvalidity),
    FirstName(NameInvalidity),
    LastName(NameInvalidity),
}

impl Validate for NewUser {
    type Invalidity = NewUserInvalidity;

    fn validate(&self) -> ValidationResult<Self::Invalidity> {
        ValidationContext::new()
            .validate_with(&self.email, NewUserInvalidity::Email)
            .validate_with(&self.password, NewUserInvalidity::Password)
            .validate_with(&self.first_name, NewUserInvalidity::FirstName)
            .validate_with(&self.last_name, NewUserInvalidity::LastName)
            .into()
    }
}

#[derive(Clone, Debug)]
pub struct NewUserData {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl ValidatedFrom<NewUserData> for NewUser {
    fn validated_from(from: NewUserData) -> ValidatedResult<Self> {
        let into = NewUser {
            id: Uuid::new_v4(),
            email: Email::unvalidated(from.email),
            password: Password::unvalidated(from.password),
            first_name: PersonName(from.first_name.trim().to_owned()),
            last_name: PersonName(from.last_name.trim().to_owned()),
        };

        match into.validate() {
            Ok(()) => Ok(into),
            Err(context) => Err((into, context)),
        }
    }
}

/// Profile fields a user may change about themselves.
#[derive(Clone, Debug, PartialEq)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    /// `None` keeps the stored number and `Some(None)` clears it.
    pub phone_number: Option<Option<String>>,
    /// Replaces the stored preferences when provided.
    pub preferences: Option<serde_json::Value>,
}
