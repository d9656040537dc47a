// JSON bodies shared by the relay controllers and the device poller.

use serde::{Deserialize, Serialize};

use super::request::{RequestKind, WakeRequest};

/// Body of `POST /api/wake`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EnqueueBody {
    #[serde(rename = "type", default)]
    pub kind: RequestKind,
}

/// Response of `POST /api/wake`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnqueueResponse {
    pub success: bool,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RequestKind,
    pub message: String,
    pub position: usize,
}

/// Response of `GET /api/wake`. `type` and `id` are `null` when nothing is pending.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PollResponse {
    pub wake: bool,
    pub shutdown: bool,
    #[serde(rename = "type")]
    pub kind: Option<RequestKind>,
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl PollResponse {
    /// The "no pending request" sentinel.
    pub fn empty() -> Self {
        Self {
            wake: false,
            shutdown: false,
            kind: None,
            id: None,
            timestamp: None,
            source: None,
        }
    }
}

impl From<WakeRequest> for PollResponse {
    fn from(req: WakeRequest) -> Self {
        Self {
            wake: req.kind.is_wake(),
            shutdown: req.kind.is_shutdown(),
            timestamp: Some(req.timestamp()),
            kind: Some(req.kind),
            id: Some(req.id),
            source: Some(req.source),
        }
    }
}

/// Body of `POST /api/wake/ack`. `action` is sent by devices but not required.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AckBody {
    pub id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AckResponse {
    pub success: bool,
    pub message: String,
}
