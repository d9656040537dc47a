// Metric names and recording helpers. All helpers are no-ops until a recorder is installed.

pub const RELAY_ENQUEUED: &str = "relay_enqueued_total";
pub const RELAY_DELIVERED: &str = "relay_delivered_total";
pub const RELAY_EXPIRED: &str = "relay_expired_total";
pub const RELAY_EVICTED: &str = "relay_evicted_total";
pub const RELAY_ACKNOWLEDGED: &str = "relay_acknowledged_total";
pub const RELAY_EMPTY_POLLS: &str = "relay_empty_polls_total";
pub const RELAY_PENDING: &str = "relay_pending";

pub const HTTP_PANICS: &str = "http_panics_total";

pub const LISTENER_SHUTDOWN_ISSUED: &str = "listener_shutdown_issued_total";
pub const LISTENER_SHUTDOWN_FAILED: &str = "listener_shutdown_failed_total";

/// Adds enqueued requests.
pub fn add_enqueued(value: u64) {
    metrics::counter!(RELAY_ENQUEUED).increment(value);
}

/// Adds requests handed to a poller.
pub fn add_delivered(value: u64) {
    metrics::counter!(RELAY_DELIVERED).increment(value);
}

/// Adds requests removed by the sweeper.
pub fn add_expired(value: u64) {
    metrics::counter!(RELAY_EXPIRED).increment(value);
}

/// Adds requests dropped on capacity overflow.
pub fn add_evicted(value: u64) {
    metrics::counter!(RELAY_EVICTED).increment(value);
}

pub fn add_acknowledged(value: u64) {
    metrics::counter!(RELAY_ACKNOWLEDGED).increment(value);
}

pub fn add_empty_polls(value: u64) {
    metrics::counter!(RELAY_EMPTY_POLLS).increment(value);
}

/// Sets the current queue length.
pub fn set_pending(len: usize) {
    metrics::gauge!(RELAY_PENDING).set(len as f64);
}

pub fn add_shutdown_issued(value: u64) {
    metrics::counter!(LISTENER_SHUTDOWN_ISSUED).increment(value);
}

pub fn add_shutdown_failed(value: u64) {
    metrics::counter!(LISTENER_SHUTDOWN_FAILED).increment(value);
}

/// Adds handler panics recovered by the HTTP middleware.
pub fn add_panics(value: u64) {
    metrics::counter!(HTTP_PANICS).increment(value);
}
