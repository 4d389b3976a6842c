use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts, TypedHeader},
    headers::{authorization::Bearer, Authorization},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
    envelope::Envelope,
    identities::domain::users::{Role, UserCredentials},
};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TokenClaims {
    sub: Uuid,
    email: String,
    role: Role,
    iat: i64,
    exp: i64,
}

impl TokenClaims {
    /// Get the ID of the user that the token claims represent.
    ///
    /// This is the user who made the request.
    pub fn user_id(&self) -> Uuid {
        self.sub
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn expires_at(&self) -> i64 {
        self.exp
    }
}

/// Signs and verifies the HS256 tokens handed out at login.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl JwtKeys {
    pub fn new(secret: &[u8], lifetime: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            lifetime,
        }
    }

    /// Create a signed token for a user.
    pub fn issue(&self, user_id: Uuid, email: &str, role: Role) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: user_id,
            email: email.to_owned(),
            role,
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn issue_for(&self, credentials: &UserCredentials) -> anyhow::Result<String> {
        self.issue(credentials.id, &credentials.email, credentials.role)
    }

    /// Check a token's signature and expiration.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(decode::<TokenClaims>(token, &self.decoding, &validation)?.claims)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for TokenClaims
where
    JwtKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = JwtError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    debug!(
                        "Cannot extract token claims from request due to missing authentication token."
                    );

                    JwtError::Missing
                })?;

        keys.verify(bearer.token()).map_err(|error| {
            debug!(?error, "Invalid authentication token received.");

            JwtError::Invalid
        })
    }
}

#[derive(Debug, PartialEq)]
pub enum JwtError {
    Invalid,
    Missing,
}

impl IntoResponse for JwtError {
    fn into_response(self) -> axum::response::Response {
        let message = match self {
            Self::Invalid => "Invalid authentication token.",
            Self::Missing => "No authentication token provided.",
        };

        (StatusCode::UNAUTHORIZED, Envelope::failure(message)).into_response()
    }
}
