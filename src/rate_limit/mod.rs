mod redis;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::envelope::Envelope;

pub use self::redis::RedisRateLimiter;

/// A requests-per-minute definition of a rate limiter.
pub trait RateLimiter: Send + Sync {
    /// Determine if the rate limit has been exceeded for a specific resource.
    ///
    /// # Arguments
    ///
    /// * `key` - A unique key for the resource being rate limited. In the
    ///   context of a web request, this should encapsulate the request path and
    ///   method, as well as the actor making the request.
    /// * `max_req_per_min` - The maximum number of requests allowed in a given
    ///   minute.
    ///
    /// # Returns
    ///
    /// In the typical case, an [Ok] result containing a result describing the
    /// requestor's rate limit state is returned. An [Err] is returned if the
    /// rate limiter encounters an error while trying to determine if the
    /// request should be rate limited.
    fn is_limited(&self, key: &str, max_req_per_min: u64) -> anyhow::Result<RateLimitResult>;
}

#[derive(Debug)]
pub enum RateLimitResult {
    /// The rate limit has not been exceeded.
    NotLimited,
    /// The rate limit has been exceeded. Requests will be accepted again at the
    /// contained timestamp.
    LimitedUntil(DateTime<Utc>),
}

impl IntoResponse for RateLimitResult {
    fn into_response(self) -> Response {
        if let Self::LimitedUntil(until) = self {
            debug!(%until, "Rejecting rate limited request.");

            (
                StatusCode::TOO_MANY_REQUESTS,
                Envelope::failure("Too many attempts. Please try again later."),
            )
                .into_response()
        } else {
            StatusCode::OK.into_response()
        }
    }
}

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("rate limited until {0}")]
    Limited(DateTime<Utc>),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Record an operation against a rate limit.
///
/// # Arguments
///
/// * `limiter` - The rate limiter tracking operations.
/// * `key` - Identifies the operation and the client performing it.
/// * `max_req_per_min` - The number of operations allowed per minute.
///
/// # Returns
///
/// An [`Err`] containing [`RateLimitError::Limited`] if the operation should
/// be rejected.
pub fn enforce(
    limiter: &dyn RateLimiter,
    key: &str,
    max_req_per_min: u64,
) -> Result<(), RateLimitError> {
    match limiter.is_limited(key, max_req_per_min)? {
        RateLimitResult::NotLimited => Ok(()),
        RateLimitResult::LimitedUntil(until) => Err(RateLimitError::Limited(until)),
    }
}

/// A rate limiter that never limits anything.
///
/// Used when no Redis instance is configured.
pub struct UnlimitedRateLimiter;

impl RateLimiter for UnlimitedRateLimiter {
    fn is_limited(&self, _key: &str, _max_req_per_min: u64) -> anyhow::Result<RateLimitResult> {
        Ok(RateLimitResult::NotLimited)
    }
}
