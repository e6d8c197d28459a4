//! PostgreSQL rate-limit store
//!
//! Counters live on the `users` row (`api_call_count`, `rate_limit_reset`).
//! The row is created on a signed-in user's first check. Anonymous callers
//! are never materialised, so every check on them starts a fresh window and
//! their calls are not counted.

use chrono::{DateTime, Utc};
use platform::rate_limit::{RateLimitError, RateLimitRecord, RateLimitStore};
use sqlx::PgPool;

use crate::domain::context::ANONYMOUS;

#[derive(Clone)]
pub struct PgRateLimitStore {
    pool: PgPool,
}

impl PgRateLimitStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Whether `user_id` gets a `users` row of its own
    pub fn tracks(user_id: &str) -> bool {
        !user_id.is_empty() && user_id != ANONYMOUS
    }
}

impl RateLimitStore for PgRateLimitStore {
    async fn load(&self, user_id: &str) -> Result<Option<RateLimitRecord>, RateLimitError> {
        let row: Option<(i32, Option<DateTime<Utc>>)> = sqlx::query_as(
            r#"
            SELECT api_call_count, rate_limit_reset
            FROM users
            WHERE user_id = $1
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RateLimitError::store)?;

        Ok(row.map(|(call_count, reset)| RateLimitRecord {
            user_id: user_id.to_string(),
            call_count: call_count.max(0) as u32,
            window_reset_at_ms: reset.map(|at| at.timestamp_millis()),
        }))
    }

    async fn start_window(&self, user_id: &str, reset_at_ms: i64) -> Result<(), RateLimitError> {
        if !Self::tracks(user_id) {
            return Ok(());
        }

        let Some(reset_at) = DateTime::<Utc>::from_timestamp_millis(reset_at_ms) else {
            return Err(RateLimitError::Unavailable(format!(
                "reset time out of range: {reset_at_ms}"
            )));
        };

        sqlx::query(
            r#"
            INSERT INTO users (user_id, api_call_count, rate_limit_reset)
            VALUES ($1, 0, $2)
            ON CONFLICT (user_id) DO UPDATE
            SET api_call_count = 0,
                rate_limit_reset = EXCLUDED.rate_limit_reset,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(reset_at)
        .execute(&self.pool)
        .await
        .map_err(RateLimitError::store)?;

        Ok(())
    }

    async fn increment(&self, user_id: &str) -> Result<(), RateLimitError> {
        if !Self::tracks(user_id) {
            return Ok(());
        }

        // A row missing here means the check failed open; its NULL reset makes
        // the next check start a window.
        sqlx::query(
            r#"
            INSERT INTO users (user_id, api_call_count)
            VALUES ($1, 1)
            ON CONFLICT (user_id) DO UPDATE
            SET api_call_count = users.api_call_count + 1,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(RateLimitError::store)?;

        tracing::debug!(user_id, "API call counted");
        Ok(())
    }
}
