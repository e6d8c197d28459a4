//! Application Configuration
//!
//! Limits and pricing for the chat application layer.

use std::time::Duration;

use platform::rate_limit::RateLimitConfig;

/// Chat application configuration
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Longest accepted message, in characters
    pub max_message_chars: usize,
    /// Generation price in USD per million tokens
    pub cost_per_million_tokens: f64,
    /// Quota applied to sending messages
    pub rate_limit: RateLimitConfig,
    /// History page size when `limit` is absent
    pub default_history_limit: i64,
    /// Largest accepted history page size
    pub max_history_limit: i64,
    /// Ledger transactions listed by the metrics report
    pub recent_transactions: i64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_chars: 4000,
            // Average of input and output pricing of the flash model
            cost_per_million_tokens: 0.1875,
            rate_limit: RateLimitConfig::new(100, Duration::from_secs(15 * 60)),
            default_history_limit: 50,
            max_history_limit: 100,
            recent_transactions: 10,
        }
    }
}

impl ChatConfig {
    /// Price of `tokens` in USD
    pub fn cost(&self, tokens: i32) -> f64 {
        f64::from(tokens) / 1_000_000.0 * self.cost_per_million_tokens
    }
}
