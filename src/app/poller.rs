// Device poller application.

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::{Config, ConfigTrait};
use crate::poller::Poller;
use crate::shutdown::GracefulShutdown;

pub struct PollerApp {
    shutdown_token: CancellationToken,
    poller: Poller,
}

impl PollerApp {
    pub fn new(shutdown_token: CancellationToken, cfg: &Config) -> Result<Self> {
        let settings = cfg.poller().context("invalid poller config")?;
        let poller = Poller::new(settings)?;
        Ok(Self {
            shutdown_token,
            poller,
        })
    }

    /// Starts the poll loop in the background, registered with `gsh`.
    pub fn serve(self, gsh: &GracefulShutdown) {
        gsh.add(1);
        let handle = self.poller.spawn(self.shutdown_token);
        let gsh = gsh.clone();
        tokio::task::spawn(async move {
            if let Err(e) = handle.await {
                error!(component = "app", scope = "poller", event = "join_failed", error = %e, "poller task failed");
            }
            gsh.done();
        });

        info!(component = "app", event = "started", role = "poller", "poller started");
    }
}
