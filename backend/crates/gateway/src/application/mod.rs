//! Application Layer

pub mod effects;
pub mod pipeline;
