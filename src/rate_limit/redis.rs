use chrono::{DateTime, Duration, DurationRound, Utc};
use tracing::trace;

use super::{RateLimitResult, RateLimiter};

/// Seconds a window's counter is kept.
const COUNTER_TTL_SECONDS: usize = 60;

/// Fixed one-minute windows counted in Redis.
pub struct RedisRateLimiter {
    client: redis::Client,
}

impl RedisRateLimiter {
    pub fn new(connection_uri: &str) -> anyhow::Result<Self> {
        Ok(Self {
            client: redis::Client::open(connection_uri)?,
        })
    }
}

/// The start of the minute containing `now` and the moment it ends.
fn window_bounds(now: DateTime<Utc>) -> anyhow::Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = now.duration_trunc(Duration::minutes(1))?;

    Ok((start, start + Duration::minutes(1)))
}

fn counter_key(key: &str, window_start: DateTime<Utc>) -> String {
    format!("rate-limit:{}:{}", key, window_start.timestamp())
}

impl RateLimiter for RedisRateLimiter {
    fn is_limited(&self, key: &str, max_req_per_min: u64) -> anyhow::Result<RateLimitResult> {
        let (window_start, window_end) = window_bounds(Utc::now())?;
        let counter = counter_key(key, window_start);

        let mut conn = self.client.get_connection()?;

        // The returned count includes this attempt.
        let (attempts,): (u64,) = redis::pipe()
            .atomic()
            .cmd("INCR")
            .arg(&counter)
            .cmd("EXPIRE")
            .arg(&counter)
            .arg(COUNTER_TTL_SECONDS)
            .ignore()
            .query(&mut conn)?;

        trace!(%counter, attempts, "Counted rate limited operation.");

        if attempts > max_req_per_min {
            Ok(RateLimitResult::LimitedUntil(window_end))
        } else {
            Ok(RateLimitResult::NotLimited)
        }
    }
}
