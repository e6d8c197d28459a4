//! Chat Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Messages, ledger records, repository and collaborator traits
//! - `application/` - Use cases, validation, configuration
//! - `infra/` - PostgreSQL store, Gemini client, ledger notaries
//! - `presentation/` - DTOs, route handlers, router
//!
//! ## Routes
//! - `POST /api/chat` - Send a message (legacy body)
//! - `POST /api/chat/v2` - Send a message
//! - `GET /api/chat/v2` - Message history with stats
//! - `DELETE /api/chat/v2` - Delete history older than `days`
//! - `GET /api/metrics` - Usage and ledger metrics
//! - `GET /api/hedera/transactions` - Recorded ledger transactions with a summary
//!
//! Sending is rate limited and works anonymously; the other routes require a
//! session. Ledger notarisation and persistence never fail a reply.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::ChatConfig;
pub use error::{ChatError, ChatResult, LedgerError};
pub use infra::gemini::{GeminiConfig, GeminiGenerator};
pub use infra::notary::DisabledNotary;
pub use infra::postgres::PgChatRepository;
pub use presentation::router::ChatRoutes;

#[cfg(test)]
mod tests;
