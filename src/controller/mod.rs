// HTTP API controllers of the relay and the command receiver.

pub mod controller;
pub mod listener;
pub mod metrics;
pub mod relay;

// Re-export controller types for convenience
pub use listener::{HealthController, ShutdownController};
pub use metrics::{init_prometheus_exporter, PrometheusMetricsController};
pub use relay::{StatusController, WakeController};
