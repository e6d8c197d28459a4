//! Rate Limiting Infrastructure
//!
//! Fixed-window limiter keyed by user identity.
//!
//! The check and the increment are separate store operations: the check runs
//! in the middleware, the increment runs in the handler's bookkeeping after
//! the request succeeded. Concurrent requests from one user can both pass the
//! check before either increments, so the bound is approximately `max`
//! requests per window, not exact.
//!
//! ```text
//! FRESH --first request--> ACTIVE --count reaches max--> EXHAUSTED
//!                            ^                              |
//!                            +------ window elapses --------+
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;

/// Rate limit configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    /// 100 requests per 15 minutes
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(15 * 60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }

    /// Window length in whole seconds, rounded up (`Retry-After`)
    pub fn retry_after_secs(&self) -> u64 {
        (self.window.as_millis() as u64).div_ceil(1000)
    }
}

/// Outcome of one limiter check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    /// Unix ms at which the current window ends
    pub reset_at_ms: i64,
}

/// Persisted counter for one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRecord {
    pub user_id: String,
    pub call_count: u32,
    /// `None` until the first window starts
    pub window_reset_at_ms: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("rate limit store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("rate limit store unavailable: {0}")]
    Unavailable(String),
}

impl RateLimitError {
    pub fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        RateLimitError::Store(Box::new(err))
    }
}

/// Storage backend for rate-limit records
#[trait_variant::make(RateLimitStore: Send)]
pub trait LocalRateLimitStore {
    /// Current record, `None` for users the store has never seen
    async fn load(&self, user_id: &str) -> Result<Option<RateLimitRecord>, RateLimitError>;

    /// Zero the counter and set the window end
    ///
    /// Creates the record if missing. Stores may skip identities they do not
    /// track, leaving `load` at `None` for them.
    async fn start_window(&self, user_id: &str, reset_at_ms: i64) -> Result<(), RateLimitError>;

    /// Charge one call against the current window
    async fn increment(&self, user_id: &str) -> Result<(), RateLimitError>;
}

// ============================================================================
// Limiter
// ============================================================================

/// Fixed-window limiter over a [`RateLimitStore`]
pub struct FixedWindowLimiter<S> {
    store: Arc<S>,
}

impl<S> Clone for FixedWindowLimiter<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: RateLimitStore + Sync> FixedWindowLimiter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Check the caller's quota at the current wall-clock time
    ///
    /// Does not charge the call; see [`Self::record_call`].
    pub async fn check_and_consume(
        &self,
        user_id: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitDecision, RateLimitError> {
        self.check_at(user_id, config, Utc::now().timestamp_millis())
            .await
    }

    /// [`Self::check_and_consume`] with an explicit clock
    pub async fn check_at(
        &self,
        user_id: &str,
        config: &RateLimitConfig,
        now_ms: i64,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let fresh_window = |reset_at_ms| RateLimitDecision {
            allowed: true,
            remaining: config.max_requests.saturating_sub(1),
            reset_at_ms,
        };

        let record = self.store.load(user_id).await?;

        let Some(record) = record else {
            let reset_at_ms = now_ms + config.window_ms();
            self.store.start_window(user_id, reset_at_ms).await?;
            tracing::debug!(user_id, reset_at_ms, "Rate limit window started");
            return Ok(fresh_window(reset_at_ms));
        };

        match record.window_reset_at_ms {
            Some(reset_at_ms) if now_ms <= reset_at_ms => {
                if record.call_count >= config.max_requests {
                    Ok(RateLimitDecision {
                        allowed: false,
                        remaining: 0,
                        reset_at_ms,
                    })
                } else {
                    Ok(RateLimitDecision {
                        allowed: true,
                        remaining: config.max_requests - record.call_count - 1,
                        reset_at_ms,
                    })
                }
            }
            _ => {
                let reset_at_ms = now_ms + config.window_ms();
                self.store.start_window(user_id, reset_at_ms).await?;
                tracing::debug!(user_id, reset_at_ms, "Rate limit window reset");
                Ok(fresh_window(reset_at_ms))
            }
        }
    }

    /// Charge one successful call to the user's window
    pub async fn record_call(&self, user_id: &str) -> Result<(), RateLimitError> {
        self.store.increment(user_id).await
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Process-local store for development without a database, and for tests
///
/// Unlike the users-table store, this one materialises a record for any key,
/// so all anonymous callers share one bucket.
#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    records: Mutex<HashMap<String, RateLimitRecord>>,
    failing: AtomicBool,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record
    pub async fn seed(&self, record: RateLimitRecord) {
        self.records
            .lock()
            .await
            .insert(record.user_id.clone(), record);
    }

    pub async fn record(&self, user_id: &str) -> Option<RateLimitRecord> {
        self.records.lock().await.get(user_id).cloned()
    }

    /// Make every operation fail until switched back
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), RateLimitError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(RateLimitError::Unavailable("in-memory store offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    async fn load(&self, user_id: &str) -> Result<Option<RateLimitRecord>, RateLimitError> {
        self.ensure_available()?;
        Ok(self.records.lock().await.get(user_id).cloned())
    }

    async fn start_window(&self, user_id: &str, reset_at_ms: i64) -> Result<(), RateLimitError> {
        self.ensure_available()?;
        let mut records = self.records.lock().await;
        let record = records
            .entry(user_id.to_string())
            .or_insert_with(|| RateLimitRecord {
                user_id: user_id.to_string(),
                call_count: 0,
                window_reset_at_ms: None,
            });
        record.call_count = 0;
        record.window_reset_at_ms = Some(reset_at_ms);
        Ok(())
    }

    async fn increment(&self, user_id: &str) -> Result<(), RateLimitError> {
        self.ensure_available()?;
        if let Some(record) = self.records.lock().await.get_mut(user_id) {
            record.call_count = record.call_count.saturating_add(1);
        }
        Ok(())
    }
}
