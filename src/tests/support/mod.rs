// Shared test support code for integration tests.

pub mod common;
pub mod fakes;
pub mod harness;

pub use common::*;
pub use fakes::{FailingIssuer, RecordingIssuer};
pub use harness::{init_metrics, start_listener, start_relay, ListenerHarness, RelayHarness};
