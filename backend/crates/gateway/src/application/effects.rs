//! Best-effort side effects
//!
//! Bookkeeping (ledger notarisation, persistence, call counting) must never
//! change the primary response. Failures are logged and dropped.

use std::fmt::Display;
use std::future::Future;

/// Await `fut`; on error log at warn and return `None`
pub async fn best_effort<T, E, F>(operation: &'static str, fut: F) -> Option<T>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match fut.await {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(operation, error = %e, "Best-effort operation failed (continuing)");
            None
        }
    }
}
