// Fake shutdown issuers for the command receiver.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::power::{PowerError, ShutdownIssuer};

/// Counts shutdowns instead of powering anything off.
#[derive(Debug, Default)]
pub struct RecordingIssuer {
    calls: AtomicUsize,
}

impl RecordingIssuer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ShutdownIssuer for RecordingIssuer {
    fn issue_shutdown(&self) -> Result<(), PowerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Always fails as if the command could not be started.
#[derive(Debug, Default)]
pub struct FailingIssuer;

impl ShutdownIssuer for FailingIssuer {
    fn issue_shutdown(&self) -> Result<(), PowerError> {
        Err(PowerError::Spawn {
            program: "shutdown".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied"),
        })
    }
}
