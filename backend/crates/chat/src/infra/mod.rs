//! Infrastructure Layer
//!
//! PostgreSQL persistence, the Gemini REST client and ledger notaries.

pub mod gemini;
pub mod notary;
pub mod postgres;
