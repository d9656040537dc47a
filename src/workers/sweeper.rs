// Package sweeper provides the periodic expiry worker of the relay queue.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::queue::RelayQueue;

/// Sweeper drops expired requests from the queue on a fixed period.
pub struct Sweeper {
    queue: Arc<RelayQueue>,
    every: Duration,
}

impl Sweeper {
    pub fn new(queue: Arc<RelayQueue>, every: Duration) -> Self {
        Self { queue, every }
    }

    /// Spawns the sweep loop. It runs until the token is cancelled.
    pub fn spawn(self, shutdown_token: CancellationToken) -> JoinHandle<()> {
        tokio::task::spawn(self.run(shutdown_token))
    }

    async fn run(self, shutdown_token: CancellationToken) {
        // First sweep one period after start, like every following one.
        let mut ticker = interval_at(Instant::now() + self.every, self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            component = "sweeper",
            event = "started",
            every = %humantime::format_duration(self.every),
            retention = %humantime::format_duration(self.queue.retention()),
            "queue sweeper started"
        );

        loop {
            tokio::select! {
                _ = shutdown_token.cancelled() => {
                    debug!(component = "sweeper", event = "stopped", "queue sweeper stopped");
                    return;
                }
                _ = ticker.tick() => {
                    let removed = self.queue.sweep();
                    if removed > 0 {
                        info!(
                            component = "sweeper",
                            event = "expired",
                            removed = removed,
                            pending = self.queue.len(),
                            "cleaned up old requests"
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RequestKind;
    use crate::queue::DEFAULT_RETENTION;
    use crate::time::ManualClock;

    #[tokio::test]
    async fn test_sweeper_expires_stale_requests() {
        let clock = Arc::new(ManualClock::default());
        let queue = Arc::new(RelayQueue::new(DEFAULT_RETENTION, None, clock.clone()));
        queue.enqueue(RequestKind::Wake, "device");
        clock.advance(DEFAULT_RETENTION + Duration::from_secs(1));

        let token = CancellationToken::new();
        let handle = Sweeper::new(queue.clone(), Duration::from_millis(10)).spawn(token.clone());

        let deadline = Instant::now() + Duration::from_secs(2);
        while !queue.is_empty() && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(queue.is_empty());

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_sweeper_keeps_fresh_requests() {
        let clock = Arc::new(ManualClock::default());
        let queue = Arc::new(RelayQueue::new(DEFAULT_RETENTION, None, clock.clone()));
        queue.enqueue(RequestKind::Shutdown, "device");

        let token = CancellationToken::new();
        let handle = Sweeper::new(queue.clone(), Duration::from_millis(5)).spawn(token.clone());
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(queue.len(), 1);

        token.cancel();
        handle.await.unwrap();
    }
}
