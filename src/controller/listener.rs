// Command receiver endpoints: shutdown trigger and health check.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use crate::http::Controller;
use crate::metrics;
use crate::power::ShutdownIssuer;

pub const SHUTDOWN_PATH: &str = "/shutdown";
pub const HEALTH_PATH: &str = "/health";

/// ShutdownController triggers the privileged host shutdown.
pub struct ShutdownController {
    issuer: Arc<dyn ShutdownIssuer>,
}

impl ShutdownController {
    pub fn new(issuer: Arc<dyn ShutdownIssuer>) -> Self {
        Self { issuer }
    }

    /// Issues the shutdown and answers before it takes effect.
    async fn shutdown(&self) -> Response {
        info!(component = "listener", event = "shutdown_requested", "shutdown request received");

        match self.issuer.issue_shutdown() {
            Ok(()) => {
                metrics::add_shutdown_issued(1);
                (
                    StatusCode::OK,
                    Json(json!({"success": true, "message": "Shutdown initiated"})),
                )
                    .into_response()
            }
            Err(e) => {
                metrics::add_shutdown_failed(1);
                error!(
                    component = "listener",
                    event = "shutdown_failed",
                    error = %e,
                    "error executing shutdown"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"success": false, "error": e.to_string()})),
                )
                    .into_response()
            }
        }
    }
}

impl Controller for ShutdownController {
    fn add_route(&self, router: Router) -> Router {
        let controller = Arc::new(self.clone());
        router.route(
            SHUTDOWN_PATH,
            post(move || {
                let controller = controller.clone();
                async move { controller.shutdown().await }
            }),
        )
    }
}

impl Clone for ShutdownController {
    fn clone(&self) -> Self {
        Self {
            issuer: self.issuer.clone(),
        }
    }
}

/// HealthController answers liveness checks.
pub struct HealthController;

impl HealthController {
    pub fn new() -> Self {
        Self
    }

    async fn health() -> impl IntoResponse {
        (StatusCode::OK, Json(json!({"status": "running"})))
    }
}

impl Default for HealthController {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller for HealthController {
    fn add_route(&self, router: Router) -> Router {
        router.route(HEALTH_PATH, get(Self::health))
    }
}
