use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use tracing::trace;
use uuid::Uuid;

use crate::budgets::http::reps::NotificationRep;

use super::{poller::NotificationSource, Session};

#[derive(Debug, Error)]
pub enum ClientError {
    /// The API rejected the session token.
    #[error("session is not authorized")]
    Unauthorized,

    #[error("API responded with {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct ResponseEnvelope<T> {
    success: bool,
    data: Option<T>,
    message: Option<String>,
}

/// An authenticated connection to the API.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    session: Session,
}

impl ApiClient {
    /// # Arguments
    ///
    /// * `base_url` - The API's base URL, including the `/api` prefix.
    /// * `session` - Credentials attached to every request.
    pub fn new(base_url: &str, session: Session) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            http: reqwest::Client::builder().build()?,
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn notifications(&self) -> Result<Vec<NotificationRep>, ClientError> {
        self.request(Method::GET, "/budgets/notifications").await
    }

    pub async fn mark_notification_read(
        &self,
        notification_id: Uuid,
    ) -> Result<NotificationRep, ClientError> {
        self.request(
            Method::PUT,
            &format!("/budgets/notifications/{}/read", notification_id),
        )
        .await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        trace!(%method, %url, "Sending API request.");

        let response = self
            .http
            .request(method, &url)
            .bearer_auth(self.session.token())
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }

        let envelope: ResponseEnvelope<T> = response.json().await?;

        match envelope {
            ResponseEnvelope {
                success: true,
                data: Some(data),
                ..
            } => Ok(data),
            ResponseEnvelope { message, .. } => Err(ClientError::Api {
                status,
                message: message.unwrap_or_else(|| "No data in response.".to_owned()),
            }),
        }
    }
}

#[async_trait]
impl NotificationSource for ApiClient {
    async fn fetch_notifications(&self) -> anyhow::Result<Vec<NotificationRep>> {
        Ok(self.notifications().await?)
    }
}
