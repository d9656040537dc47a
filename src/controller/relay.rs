// Relay queue endpoints: enqueue, poll, acknowledge and status.

use axum::{
    body::Bytes,
    extract::ConnectInfo,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::http::Controller;
use crate::metrics;
use crate::model::request::UNKNOWN_SOURCE;
use crate::model::{
    capitalize, AckBody, AckResponse, EnqueueBody, EnqueueResponse, PollResponse, RequestKind,
};
use crate::queue::RelayQueue;

pub const ROOT_PATH: &str = "/";
pub const WAKE_PATH: &str = "/api/wake";
pub const ACK_PATH: &str = "/api/wake/ack";
pub const STATUS_PATH: &str = "/api/status";

pub const SERVER_MESSAGE: &str = "ESP32 WOL Server";
pub const RUNNING: &str = "running";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RootResponse {
    message: &'static str,
    status: &'static str,
    pending_requests: usize,
}

#[derive(Debug, Serialize)]
struct StatusEntry {
    id: String,
    #[serde(rename = "type")]
    kind: RequestKind,
    timestamp: String,
    /// Milliseconds since enqueue.
    age: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    server: &'static str,
    pending_requests: usize,
    /// Seconds since the relay started.
    uptime: f64,
    requests: Vec<StatusEntry>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

/// WakeController owns the device-facing queue endpoints.
pub struct WakeController {
    queue: Arc<RelayQueue>,
}

impl WakeController {
    pub fn new(queue: Arc<RelayQueue>) -> Self {
        Self { queue }
    }

    /// Hands the oldest pending request to the polling device.
    async fn poll(&self) -> Response {
        info!(component = "relay", event = "poll", "device polling for wake requests");

        match self.queue.dequeue_oldest() {
            Some(request) => {
                info!(
                    component = "relay",
                    event = "delivered",
                    id = %request.id,
                    kind = %request.kind,
                    "sending request to device"
                );
                Json(PollResponse::from(request)).into_response()
            }
            None => {
                metrics::add_empty_polls(1);
                Json(PollResponse::empty()).into_response()
            }
        }
    }

    /// Queues a request. An empty body means a wake request.
    async fn enqueue(&self, peer: Option<SocketAddr>, body: Bytes) -> Response {
        let body: EnqueueBody = if body.iter().all(u8::is_ascii_whitespace) {
            EnqueueBody::default()
        } else {
            match serde_json::from_slice(&body) {
                Ok(body) => body,
                Err(e) => {
                    warn!(
                        component = "relay",
                        event = "bad_request",
                        error = %e,
                        "rejected malformed enqueue body"
                    );
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(ErrorResponse {
                            success: false,
                            error: format!("invalid request body: {}", e),
                        }),
                    )
                        .into_response();
                }
            }
        };

        let source = peer
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

        let enqueued = self.queue.enqueue(body.kind, source);
        let request = enqueued.request;

        info!(
            component = "relay",
            event = "enqueued",
            id = %request.id,
            kind = %request.kind,
            source = %request.source,
            position = enqueued.position,
            "new request created"
        );

        Json(EnqueueResponse {
            success: true,
            message: format!("{} request queued", capitalize(request.kind.as_str())),
            id: request.id,
            kind: request.kind,
            position: enqueued.position,
        })
        .into_response()
    }

    async fn acknowledge(&self, body: AckBody) -> Response {
        let ack = self.queue.acknowledge(&body.id, &body.status);

        info!(
            component = "relay",
            event = "acknowledged",
            id = %ack.id,
            status = %ack.status,
            action = body.action.as_deref().unwrap_or("-"),
            recognised = ack.recognised,
            "acknowledgment received"
        );

        Json(AckResponse {
            success: true,
            message: "Acknowledgment received".to_string(),
        })
        .into_response()
    }
}

impl Controller for WakeController {
    fn add_route(&self, router: Router) -> Router {
        let controller = Arc::new(self.clone());
        let poll_controller = controller.clone();
        let enqueue_controller = controller.clone();
        let ack_controller = controller;

        router
            .route(
                WAKE_PATH,
                get(move || {
                    let controller = poll_controller.clone();
                    async move { controller.poll().await }
                })
                .post(
                    move |peer: Option<ConnectInfo<SocketAddr>>, body: Bytes| {
                        let controller = enqueue_controller.clone();
                        async move {
                            controller
                                .enqueue(peer.map(|ConnectInfo(addr)| addr), body)
                                .await
                        }
                    },
                ),
            )
            .route(
                ACK_PATH,
                post(move |Json(body): Json<AckBody>| {
                    let controller = ack_controller.clone();
                    async move { controller.acknowledge(body).await }
                }),
            )
    }
}

impl Clone for WakeController {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
        }
    }
}

/// StatusController reports queue contents and relay liveness.
pub struct StatusController {
    queue: Arc<RelayQueue>,
    started_at: Instant,
}

impl StatusController {
    pub fn new(queue: Arc<RelayQueue>, started_at: Instant) -> Self {
        Self { queue, started_at }
    }

    async fn root(&self) -> Json<RootResponse> {
        Json(RootResponse {
            message: SERVER_MESSAGE,
            status: RUNNING,
            pending_requests: self.queue.len(),
        })
    }

    async fn status(&self) -> Json<StatusResponse> {
        let snapshot = self.queue.snapshot();

        Json(StatusResponse {
            server: RUNNING,
            pending_requests: snapshot.count(),
            uptime: self.started_at.elapsed().as_secs_f64(),
            requests: snapshot
                .entries
                .into_iter()
                .map(|e| StatusEntry {
                    timestamp: e
                        .created_at
                        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                    id: e.id,
                    kind: e.kind,
                    age: e.age_ms,
                })
                .collect(),
        })
    }
}

impl Controller for StatusController {
    fn add_route(&self, router: Router) -> Router {
        let controller = Arc::new(self.clone());
        let root_controller = controller.clone();
        let status_controller = controller;

        router
            .route(
                ROOT_PATH,
                get(move || {
                    let controller = root_controller.clone();
                    async move { controller.root().await }
                }),
            )
            .route(
                STATUS_PATH,
                get(move || {
                    let controller = status_controller.clone();
                    async move { controller.status().await }
                }),
            )
    }
}

impl Clone for StatusController {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            started_at: self.started_at,
        }
    }
}
