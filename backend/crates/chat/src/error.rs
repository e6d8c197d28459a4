//! Chat Error Types
//!
//! Store and ledger failures. Both become a [`Fault`] at the handler, so the
//! HTTP boundary classifies them like any other dependency failure.

use kernel::error::fault::{Cause, Dependency, Fault};
use thiserror::Error;

/// Chat-store result type alias
pub type ChatResult<T> = Result<T, ChatError>;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row that does not map onto the domain
    #[error("Corrupt row: {0}")]
    CorruptRow(String),
}

impl From<ChatError> for Fault {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Database(e) => Fault::from(e),
            ChatError::CorruptRow(detail) => {
                Fault::dependency(Dependency::Database, Cause::Failed, detail)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger notarisation is not configured")]
    Disabled,

    #[error("Ledger rejected the transaction: {0}")]
    Rejected(String),

    #[error("Ledger unreachable: {0}")]
    Unavailable(String),
}

impl From<LedgerError> for Fault {
    fn from(err: LedgerError) -> Self {
        let cause = match err {
            LedgerError::Disabled => return Fault::Configuration(err.to_string()),
            LedgerError::Rejected(_) => Cause::Rejected,
            LedgerError::Unavailable(_) => Cause::Unavailable,
        };
        Fault::dependency(Dependency::Ledger, cause, err)
    }
}
