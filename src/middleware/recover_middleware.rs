//! Panic recovery middleware.
//

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use tower_http::catch_panic::CatchPanicLayer;
use tracing::error;

use super::middleware::Middleware;
use crate::metrics;

/// Global panic counter.
static PANICS_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Gets the current panic counter value.
pub fn panics_counter() -> u64 {
    PANICS_COUNTER.load(Ordering::Relaxed)
}

/// Turns a handler panic into a JSON 500.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    PANICS_COUNTER.fetch_add(1, Ordering::Relaxed);
    metrics::add_panics(1);

    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(
        component = "http",
        event = "handler_panicked",
        details = %details,
        "request handler panicked"
    );

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "success": false,
            "error": "internal server error",
        })),
    )
        .into_response()
}

/// PanicRecoverMiddleware recovers from panics in HTTP handlers.
pub struct PanicRecoverMiddleware;

impl PanicRecoverMiddleware {
    /// Creates a new panic recovery middleware.
    pub fn new() -> Self {
        Self
    }
}

impl Default for PanicRecoverMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for PanicRecoverMiddleware {
    fn apply(&self, router: Router) -> Router {
        router.layer(CatchPanicLayer::custom(handle_panic))
    }
}
