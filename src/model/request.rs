// Relay queue entry.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

use crate::time;

pub const WAKE: &str = "wake";
pub const SHUTDOWN: &str = "shutdown";

/// Source recorded when the peer address is not available.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// What the polling device is asked to do.
///
/// Anything other than `wake`/`shutdown` is carried verbatim so callers can
/// extend the vocabulary without the relay rejecting them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum RequestKind {
    #[default]
    Wake,
    Shutdown,
    Other(String),
}

impl RequestKind {
    pub fn as_str(&self) -> &str {
        match self {
            RequestKind::Wake => WAKE,
            RequestKind::Shutdown => SHUTDOWN,
            RequestKind::Other(s) => s.as_str(),
        }
    }

    pub fn is_wake(&self) -> bool {
        matches!(self, RequestKind::Wake)
    }

    pub fn is_shutdown(&self) -> bool {
        matches!(self, RequestKind::Shutdown)
    }
}

impl From<&str> for RequestKind {
    fn from(s: &str) -> Self {
        match s {
            WAKE => RequestKind::Wake,
            SHUTDOWN => RequestKind::Shutdown,
            other => RequestKind::Other(other.to_string()),
        }
    }
}

impl From<String> for RequestKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            WAKE => RequestKind::Wake,
            SHUTDOWN => RequestKind::Shutdown,
            _ => RequestKind::Other(s),
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RequestKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RequestKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(RequestKind::from)
    }
}

/// A pending power-control request. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeRequest {
    pub id: String,
    pub kind: RequestKind,
    pub created_at: DateTime<Utc>,
    pub source: String,
}

impl WakeRequest {
    pub fn new(
        id: String,
        kind: RequestKind,
        created_at: DateTime<Utc>,
        source: impl Into<String>,
    ) -> Self {
        let source = source.into();
        let source = if source.is_empty() {
            UNKNOWN_SOURCE.to_string()
        } else {
            source
        };
        Self {
            id,
            kind,
            created_at,
            source,
        }
    }

    /// Age of the entry at `now`, zero if `now` precedes creation.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        time::since(self.created_at, now)
    }

    pub fn age_millis(&self, now: DateTime<Utc>) -> u64 {
        self.age(now).as_millis() as u64
    }

    /// Whether the entry is past its retention window at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        self.age(now) >= retention
    }

    /// Creation time as RFC 3339 with millisecond precision.
    pub fn timestamp(&self) -> String {
        self.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Uppercases the first character and lowercases the rest.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
