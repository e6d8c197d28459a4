//! Application Layer
//!
//! Use cases and request validation.

pub mod config;
pub mod history;
pub mod ledger;
pub mod metrics;
pub mod send_message;
pub mod validation;
