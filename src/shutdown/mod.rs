// Package shutdown provides graceful shutdown functionality.

use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::Notify;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub const DEFAULT_GRACEFUL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
#[error("graceful shutdown timeout exceeded")]
pub struct TimeoutError;

/// Graceful shutdown handler: a cancellation token plus a wait group of running tasks.
#[derive(Clone)]
pub struct GracefulShutdown {
    shutdown_token: CancellationToken,
    timeout: Arc<parking_lot::RwLock<Duration>>,
    running: Arc<AtomicUsize>,
    drained: Arc<Notify>,
}

impl GracefulShutdown {
    /// Creates a new graceful shutdown handler
    pub fn new(shutdown_token: CancellationToken) -> Self {
        Self {
            shutdown_token,
            timeout: Arc::new(parking_lot::RwLock::new(DEFAULT_GRACEFUL_TIMEOUT)),
            running: Arc::new(AtomicUsize::new(0)),
            drained: Arc::new(Notify::new()),
        }
    }

    pub fn set_graceful_timeout(&self, timeout: Duration) {
        *self.timeout.write() = timeout;
    }

    /// Registers `n` tasks that must call [`done`](Self::done) before shutdown completes.
    pub fn add(&self, n: usize) {
        self.running.fetch_add(n, Ordering::SeqCst);
    }

    /// Marks one task as done.
    pub fn done(&self) {
        let prev = self
            .running
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .unwrap_or(0);
        if prev <= 1 {
            self.drained.notify_waiters();
        }
    }

    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    /// Waits for an OS signal or cancellation, then for all tasks to complete.
    pub async fn await_shutdown(&self) -> Result<()> {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!(
                    component = "graceful-shutdown",
                    event = "os_signal",
                    signal = "SIGINT",
                    "cancellation started"
                );
            }
            _ = terminate() => {
                info!(
                    component = "graceful-shutdown",
                    event = "os_signal",
                    signal = "SIGTERM",
                    "cancellation started"
                );
            }
            _ = self.shutdown_token.cancelled() => {
                info!(
                    component = "graceful-shutdown",
                    event = "ctx_done",
                    "cancellation started"
                );
            }
        }

        self.cancel_and_await_with_timeout().await
    }

    async fn cancel_and_await_with_timeout(&self) -> Result<()> {
        self.shutdown_token.cancel();

        let timeout_duration = *self.timeout.read();

        match timeout(timeout_duration, self.wait_for_completion()).await {
            Ok(_) => {
                info!(
                    component = "graceful-shutdown",
                    event = "shutdown_success",
                    "service was gracefully shut down"
                );
                Ok(())
            }
            Err(_) => {
                warn!(
                    component = "graceful-shutdown",
                    event = "shutdown_timeout",
                    timeout_secs = timeout_duration.as_secs(),
                    running = self.running(),
                    "not all tasks were closed within timeout"
                );
                Err(TimeoutError.into())
            }
        }
    }

    async fn wait_for_completion(&self) {
        loop {
            // Register interest before checking so a concurrent done() is not missed.
            let notified = self.drained.notified();
            if self.running() == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(unix)]
async fn terminate() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut sig) => {
            sig.recv().await;
        }
        Err(e) => {
            warn!(
                component = "graceful-shutdown",
                event = "sigterm_unavailable",
                error = %e,
                "cannot listen for SIGTERM"
            );
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_await_shutdown_waits_for_tasks() {
        let token = CancellationToken::new();
        let gsh = GracefulShutdown::new(token.clone());
        gsh.set_graceful_timeout(Duration::from_secs(2));
        gsh.add(2);

        for delay in [10u64, 30] {
            let gsh = gsh.clone();
            let token = token.clone();
            tokio::spawn(async move {
                token.cancelled().await;
                tokio::time::sleep(Duration::from_millis(delay)).await;
                gsh.done();
            });
        }

        token.cancel();
        gsh.await_shutdown().await.unwrap();
        assert_eq!(gsh.running(), 0);
    }

    #[tokio::test]
    async fn test_await_shutdown_times_out() {
        let token = CancellationToken::new();
        let gsh = GracefulShutdown::new(token.clone());
        gsh.set_graceful_timeout(Duration::from_millis(50));
        gsh.add(1);

        token.cancel();
        let err = gsh.await_shutdown().await.unwrap_err();
        assert!(err.downcast_ref::<TimeoutError>().is_some());
    }

    #[test]
    fn test_done_never_underflows() {
        let gsh = GracefulShutdown::new(CancellationToken::new());
        gsh.done();
        assert_eq!(gsh.running(), 0);
        gsh.add(1);
        gsh.done();
        gsh.done();
        assert_eq!(gsh.running(), 0);
    }
}
