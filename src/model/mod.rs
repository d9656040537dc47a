// Package model provides relay queue entries and the JSON shapes exchanged on the wire.

pub mod request;
pub mod wire;


// Re-export main types
pub use request::{capitalize, RequestKind, WakeRequest};
pub use wire::{AckBody, AckResponse, EnqueueBody, EnqueueResponse, PollResponse};
