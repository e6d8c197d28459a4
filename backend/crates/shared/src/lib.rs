//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the vocabulary every other crate speaks:
//! - The error-code table ([`error::kind::ErrorKind`]) and classified errors
//!   ([`error::app_error::AppError`])
//! - The failure taxonomy handlers return ([`error::fault::Fault`])
//! - The uniform response envelope ([`response`])
//! - Request identifiers ([`id::RequestId`])

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod fault;
    pub mod kind;
}
pub mod id;
pub mod response;
