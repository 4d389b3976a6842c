use std::convert::TryFrom;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::identities::domain::users::{NewUser, User, UserCredentials};

#[derive(Clone)]
pub struct NewUserModel {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

impl TryFrom<&NewUser> for NewUserModel {
    type Error = anyhow::Error;

    fn try_from(user: &NewUser) -> Result<Self, Self::Error> {
        Ok(Self {
            id: user.id(),
            email: user.email().normalized(),
            password_hash: user.password_hash()?.as_str().to_owned(),
            first_name: user.first_name().to_owned(),
            last_name: user.last_name().to_owned(),
        })
    }
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct UserModel {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    pub preferences: serde_json::Value,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserModel> for User {
    type Error = anyhow::Error;

    fn try_from(model: UserModel) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            role: model.role.parse()?,
            phone_number: model.phone_number,
            profile_picture: model.profile_picture,
            preferences: model.preferences,
            email_verified_at: model.email_verified_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct UserCredentialsModel {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub password_hash: String,
}

impl TryFrom<UserCredentialsModel> for UserCredentials {
    type Error = anyhow::Error;

    fn try_from(model: UserCredentialsModel) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            email: model.email,
            role: model.role.parse()?,
            password_hash: model.password_hash,
        })
    }
}
