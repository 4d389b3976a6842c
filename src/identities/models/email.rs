use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::identities::domain::email::{EmailVerification, EmailVerificationData};

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct EmailVerificationModel {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<EmailVerificationModel> for EmailVerificationData {
    fn from(model: EmailVerificationModel) -> Self {
        Self {
            token: model.token,
            user_id: model.user_id,
            created_at: model.created_at,
        }
    }
}

/// An email verification token ready to be persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct NewEmailVerification {
    pub token: String,
    pub user_id: Uuid,
}

impl NewEmailVerification {
    pub fn new(user_id: Uuid, verification: &EmailVerification) -> Self {
        Self {
            token: verification.token().to_owned(),
            user_id,
        }
    }
}
