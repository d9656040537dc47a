//! Prometheus metrics functionality.
//
//! Metrics organization:
//! - Relay queue lifecycle: relay_* counters and the pending gauge
//! - Command receiver outcomes: listener_* counters

pub mod meter;

// Re-export commonly used items
pub use meter::*;
