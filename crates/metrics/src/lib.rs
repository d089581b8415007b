//! Metric names for pagelink.
//!
//! Crates record through the `metrics` facade macros re-exported here, behind
//! their own optional `metrics` feature. Nothing is exported unless the host
//! installs a recorder.
//!
//! ```rust,ignore
//! use pagelink_metrics::{counter, gateway};
//!
//! counter!(gateway::REQUESTS_TOTAL, "endpoint" => "channels").increment(1);
//! ```

mod definitions;

pub use definitions::*;

pub use metrics::{counter, gauge, histogram};
