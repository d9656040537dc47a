// In-memory FIFO of pending power-control requests.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::metrics;
use crate::model::{RequestKind, WakeRequest};
use crate::rand;
use crate::time::Clock;

/// How many delivered ids are remembered for acknowledgment diagnostics.
pub const DELIVERED_HISTORY: usize = 64;

pub const DEFAULT_RETENTION: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Result of a successful enqueue.
#[derive(Debug, Clone)]
pub struct Enqueued {
    pub request: WakeRequest,
    /// Queue length right after the append (1-based position of the new entry).
    pub position: usize,
    /// Oldest entry dropped to make room, only when a capacity is configured.
    pub evicted: Option<WakeRequest>,
}

/// Outcome of an acknowledgment. Acknowledging never touches pending entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgement {
    pub id: String,
    pub status: String,
    /// Whether the id was among the recently delivered ones.
    pub recognised: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub id: String,
    pub kind: RequestKind,
    pub created_at: DateTime<Utc>,
    pub age_ms: u64,
}

/// Point-in-time copy of the queue contents.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub entries: Vec<SnapshotEntry>,
}

impl Snapshot {
    pub fn count(&self) -> usize {
        self.entries.len()
    }
}

struct Inner {
    pending: VecDeque<WakeRequest>,
    delivered: VecDeque<String>,
}

/// RelayQueue owns the pending requests. Every operation, reads included,
/// runs under one mutex so nothing ever observes a half-applied mutation.
pub struct RelayQueue {
    inner: Mutex<Inner>,
    retention: Duration,
    capacity: Option<usize>,
    clock: Arc<dyn Clock>,
}

impl RelayQueue {
    /// Creates an empty queue. A capacity of `None` (or zero) means unbounded.
    pub fn new(retention: Duration, capacity: Option<usize>, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                pending: VecDeque::new(),
                delivered: VecDeque::with_capacity(DELIVERED_HISTORY),
            }),
            retention,
            capacity: capacity.filter(|c| *c > 0),
            clock,
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().pending.is_empty()
    }

    /// Appends a new request to the tail and returns it with its position.
    pub fn enqueue(&self, kind: RequestKind, source: impl Into<String>) -> Enqueued {
        let source = source.into();
        let now = self.clock.now();

        let mut inner = self.inner.lock();

        let mut id = rand::request_id();
        while inner.pending.iter().any(|r| r.id == id) {
            id = rand::request_id();
        }

        let evicted = match self.capacity {
            Some(cap) if inner.pending.len() >= cap => inner.pending.pop_front(),
            _ => None,
        };

        let request = WakeRequest::new(id, kind, now, source);
        inner.pending.push_back(request.clone());
        let position = inner.pending.len();
        // Gauge updates stay under the lock so they land in mutation order.
        metrics::set_pending(position);
        drop(inner);

        metrics::add_enqueued(1);
        if let Some(ref old) = evicted {
            metrics::add_evicted(1);
            warn!(
                component = "queue",
                event = "evicted",
                id = %old.id,
                kind = %old.kind,
                capacity = self.capacity.unwrap_or_default(),
                "queue is full, oldest request evicted"
            );
        }

        Enqueued {
            request,
            position,
            evicted,
        }
    }

    /// Removes and returns the oldest pending request, if any.
    pub fn dequeue_oldest(&self) -> Option<WakeRequest> {
        let mut inner = self.inner.lock();
        let request = inner.pending.pop_front()?;

        if inner.delivered.len() >= DELIVERED_HISTORY {
            inner.delivered.pop_front();
        }
        inner.delivered.push_back(request.id.clone());
        metrics::set_pending(inner.pending.len());
        drop(inner);

        metrics::add_delivered(1);
        Some(request)
    }

    /// Records a completion report from a poller. Always succeeds.
    pub fn acknowledge(&self, id: &str, status: &str) -> Acknowledgement {
        let recognised = self.inner.lock().delivered.iter().any(|d| d == id);
        metrics::add_acknowledged(1);
        Acknowledgement {
            id: id.to_string(),
            status: status.to_string(),
            recognised,
        }
    }

    /// Returns the current contents without removing anything.
    pub fn snapshot(&self) -> Snapshot {
        let now = self.clock.now();
        let inner = self.inner.lock();
        let entries = inner
            .pending
            .iter()
            .map(|r| SnapshotEntry {
                id: r.id.clone(),
                kind: r.kind.clone(),
                created_at: r.created_at,
                age_ms: r.age_millis(now),
            })
            .collect();

        Snapshot { entries }
    }

    /// Removes every request whose age reached the retention window.
    /// Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let retention = self.retention;

        let mut inner = self.inner.lock();
        let before = inner.pending.len();
        inner.pending.retain(|r| !r.is_expired(now, retention));
        let after = inner.pending.len();
        let removed = before - after;
        if removed > 0 {
            metrics::set_pending(after);
        }
        drop(inner);

        if removed > 0 {
            metrics::add_expired(removed as u64);
        }
        debug!(
            component = "queue",
            event = "swept",
            removed = removed,
            pending = after,
            "expired requests swept"
        );
        removed
    }
}
