use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::identities::domain::{self, password_resets::NewPasswordReset};

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct PasswordReset {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<PasswordReset> for domain::password_resets::PasswordResetTokenData {
    fn from(reset: PasswordReset) -> Self {
        Self {
            user_id: reset.user_id,
            token: reset.token,
            created_at: reset.created_at,
        }
    }
}

/// A password reset token ready to be persisted for a known user.
#[derive(Clone, Debug, PartialEq)]
pub struct NewPasswordResetModel {
    pub token: String,
    pub user_id: Uuid,
}

impl NewPasswordResetModel {
    pub fn for_user(user_id: Uuid, reset: &NewPasswordReset) -> Self {
        Self {
            token: reset.token().to_owned(),
            user_id,
        }
    }
}
