//! # Access Review Observe - Observability Layer
//!
//! Structured logging setup and span helpers shared by the access review crates.

pub mod logging;
pub mod span_utils;

pub use logging::{LogConfig, LogFormat, init_logging};
