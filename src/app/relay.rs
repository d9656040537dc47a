// Relay application: request queue, expiry sweeper and the public HTTP API.

use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::{Config, ConfigTrait, RelaySettings};
use crate::controller::{PrometheusMetricsController, StatusController, WakeController};
use crate::http::{Controller, HttpServer, Middleware};
use crate::middleware::{CorsMiddleware, PanicRecoverMiddleware};
use crate::queue::RelayQueue;
use crate::shutdown::GracefulShutdown;
use crate::time::{Clock, SystemClock};
use crate::workers::Sweeper;

/// Encapsulates the relay state.
pub struct RelayApp {
    settings: RelaySettings,
    shutdown_token: CancellationToken,
    queue: Arc<RelayQueue>,
    server: Arc<HttpServer>,
}

impl RelayApp {
    pub fn new(shutdown_token: CancellationToken, cfg: &Config) -> Result<Self> {
        Self::with_clock(shutdown_token, cfg, Arc::new(SystemClock))
    }

    /// Creates a relay whose queue reads time from `clock`.
    pub fn with_clock(
        shutdown_token: CancellationToken,
        cfg: &Config,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let settings = cfg.relay().context("invalid relay config")?;
        let queue = Arc::new(RelayQueue::new(settings.retention, settings.capacity, clock));

        let controllers: Vec<Box<dyn Controller>> = vec![
            Box::new(StatusController::new(queue.clone(), Instant::now())),
            Box::new(WakeController::new(queue.clone())),
            Box::new(PrometheusMetricsController::new()),
        ];
        let middlewares: Vec<Box<dyn Middleware>> = vec![
            Box::new(CorsMiddleware::new()),
            Box::new(PanicRecoverMiddleware::new()),
        ];

        let server = HttpServer::new(
            shutdown_token.clone(),
            settings.name.clone(),
            settings.addr,
            settings.timeout,
            controllers,
            middlewares,
        );

        Ok(Self {
            settings,
            shutdown_token,
            queue,
            server,
        })
    }

    pub fn queue(&self) -> Arc<RelayQueue> {
        self.queue.clone()
    }

    pub fn router(&self) -> Router {
        self.server.router()
    }

    /// Binds the API, then starts the server and the sweeper in the background.
    /// Both register with `gsh`. Returns the bound address.
    pub async fn serve(&self, gsh: &GracefulShutdown) -> Result<SocketAddr> {
        let listener = self.server.bind().await?;
        let addr = listener
            .local_addr()
            .context("failed to read relay address")?;

        gsh.add(2);

        let sweeper = Sweeper::new(self.queue.clone(), self.settings.sweep_interval)
            .spawn(self.shutdown_token.clone());
        let sweeper_gsh = gsh.clone();
        tokio::task::spawn(async move {
            if let Err(e) = sweeper.await {
                error!(component = "app", scope = "sweeper", event = "join_failed", error = %e, "sweeper task failed");
            }
            sweeper_gsh.done();
        });

        let server = self.server.clone();
        let server_gsh = gsh.clone();
        tokio::task::spawn(async move {
            if let Err(e) = server.serve(listener).await {
                error!(
                    component = "app",
                    scope = "server",
                    event = "serve_failed",
                    error = %e,
                    "relay server failed to serve"
                );
            }
            server_gsh.done();
        });

        info!(
            component = "app",
            event = "started",
            role = "relay",
            addr = %addr,
            retention = %humantime::format_duration(self.settings.retention),
            capacity = ?self.settings.capacity,
            "relay started"
        );

        Ok(addr)
    }
}
