// Package queue provides the relay's bounded-lifetime request queue.

pub mod queue;


pub use queue::{
    Acknowledgement, Enqueued, RelayQueue, Snapshot, SnapshotEntry, DEFAULT_RETENTION,
    DEFAULT_SWEEP_INTERVAL, DELIVERED_HISTORY,
};
