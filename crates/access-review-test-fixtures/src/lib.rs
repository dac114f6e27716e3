//! Test fixtures for access review integration tests
//!
//! Scriptable mock checker, request builders, log capture, and shared proptest
//! configuration used across the workspace's test suites.

#![deny(unsafe_code)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod logs;
pub mod mock_checker;
pub mod proptest_config;
pub mod requests;

pub use logs::CapturedLogs;
pub use mock_checker::{MockChecker, MockOutcome};
pub use requests::{cluster_request, named_request, namespaced_request};
