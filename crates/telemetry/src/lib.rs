//! Logging and run metrics for the feed curator.
//!
//! Logs go to stderr so stdout stays free for run output. Metrics are kept
//! in-process and summarized in the log when a run finishes.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::*;
pub use tracing_setup::*;
