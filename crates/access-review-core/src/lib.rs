//! # Access Review Core - Permission Check Coordination
//!
//! Answers batches of "may the current user do X?" questions against an
//! external authorization service. Decisions are cached for the life of the
//! process, concurrent callers asking the same question share one outstanding
//! check, and callers observe an aggregate that starts pending and settles
//! once, fail-closed.

pub mod batch;
pub mod checker;
pub mod coalescer;
pub mod error;
pub mod executor;
pub mod gate;
pub mod http;
pub mod metrics;
pub mod service;

pub use batch::{BatchCoordinator, BatchHandle, BatchPhase, BatchState, Subscription};
pub use checker::AccessChecker;
pub use coalescer::{InFlightCoalescer, PendingCheck};
pub use error::{CheckError, Result, SetupError};
pub use executor::CheckExecutor;
pub use gate::PermissionGate;
pub use http::HttpAccessChecker;
pub use metrics::AccessReviewMetrics;
pub use service::AccessReview;
