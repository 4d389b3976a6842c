use chrono::{DateTime, Utc};
use semval::context::Context as ValidationContext;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    http_err::FieldErrors,
    identities::domain::{
        email::EmailInvalidity,
        users::{NewUserData, NewUserInvalidity, ProfileUpdate, Role, User},
    },
    passwords::PasswordInvalidity,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    email: String,
    password: String,
    first_name: String,
    last_name: String,
}

impl From<RegisterRequest> for NewUserData {
    fn from(rep: RegisterRequest) -> Self {
        Self {
            email: rep.email,
            password: rep.password,
            first_name: rep.first_name,
            last_name: rep.last_name,
        }
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRep {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    pub preferences: serde_json::Value,
    pub is_email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserRep {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            phone_number: user.phone_number,
            profile_picture: user.profile_picture,
            preferences: user.preferences,
            is_email_verified: user.email_verified_at.is_some(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// A freshly issued bearer token along with its owner.
#[derive(Debug, Deserialize, Serialize)]
pub struct SessionRep {
    pub token: String,
    pub user: UserRep,
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    #[validate(length(min = 1, max = 100, message = "First name is required."))]
    first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name is required."))]
    last_name: String,

    #[validate(length(max = 30, message = "Phone numbers may not exceed 30 characters."))]
    phone_number: Option<String>,

    preferences: Option<serde_json::Value>,
}

impl From<ProfileUpdateRequest> for ProfileUpdate {
    fn from(rep: ProfileUpdateRequest) -> Self {
        Self {
            first_name: rep.first_name.trim().to_owned(),
            last_name: rep.last_name.trim().to_owned(),
            // An empty string clears the number; leaving it out keeps it.
            phone_number: rep.phone_number.map(|phone| {
                let phone = phone.trim();
                (!phone.is_empty()).then(|| phone.to_owned())
            }),
            preferences: rep.preferences,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct VerifyEmailParams {
    pub token: String,
}

fn push(errors: &mut FieldErrors, field: &str, message: String) {
    errors.entry(field.to_owned()).or_default().push(message);
}

pub fn new_user_errors(validation: ValidationContext<NewUserInvalidity>) -> FieldErrors {
    let mut errors = FieldErrors::new();

    for invalidity in validation.into_iter() {
        match invalidity {
            NewUserInvalidity::Email(invalidity) => {
                push(&mut errors, "email", invalidity.message().to_owned())
            }
            NewUserInvalidity::Password(invalidity) => {
                push(&mut errors, "password", invalidity.message())
            }
            NewUserInvalidity::FirstName(invalidity) => {
                push(&mut errors, "firstName", invalidity.message("First name"))
            }
            NewUserInvalidity::LastName(invalidity) => {
                push(&mut errors, "lastName", invalidity.message("Last name"))
            }
        }
    }

    errors
}

pub fn email_errors(validation: ValidationContext<EmailInvalidity>) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for invalidity in validation.into_iter() {
        push(&mut errors, "email", invalidity.message().to_owned());
    }

    errors
}

pub fn password_errors(
    field: &str,
    validation: ValidationContext<PasswordInvalidity>,
) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for invalidity in validation.into_iter() {
        push(&mut errors, field, invalidity.message());
    }

    errors
}
