// Command receiver application: accepts shutdown commands for the host.

use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::{Config, ConfigTrait};
use crate::controller::{HealthController, PrometheusMetricsController, ShutdownController};
use crate::http::{Controller, HttpServer, Middleware};
use crate::middleware::PanicRecoverMiddleware;
use crate::power::{CommandIssuer, ShutdownIssuer};
use crate::shutdown::GracefulShutdown;

pub struct ListenerApp {
    server: Arc<HttpServer>,
}

impl ListenerApp {
    /// Creates a listener running the configured shutdown command.
    pub fn new(shutdown_token: CancellationToken, cfg: &Config) -> Result<Self> {
        let settings = cfg.listener().context("invalid listener config")?;
        let issuer = CommandIssuer::new(settings.command).context("invalid shutdown command")?;
        info!(
            component = "app",
            event = "shutdown_command",
            program = issuer.program(),
            args = ?issuer.args(),
            "shutdown command configured"
        );
        Self::with_issuer(shutdown_token, cfg, Arc::new(issuer))
    }

    pub fn with_issuer(
        shutdown_token: CancellationToken,
        cfg: &Config,
        issuer: Arc<dyn ShutdownIssuer>,
    ) -> Result<Self> {
        let settings = cfg.listener().context("invalid listener config")?;

        let controllers: Vec<Box<dyn Controller>> = vec![
            Box::new(ShutdownController::new(issuer)),
            Box::new(HealthController::new()),
            Box::new(PrometheusMetricsController::new()),
        ];
        let middlewares: Vec<Box<dyn Middleware>> = vec![Box::new(PanicRecoverMiddleware::new())];

        let server = HttpServer::new(
            shutdown_token,
            settings.name,
            settings.addr,
            settings.timeout,
            controllers,
            middlewares,
        );

        Ok(Self { server })
    }

    pub fn router(&self) -> Router {
        self.server.router()
    }

    /// Binds the API and serves it in the background. Returns the bound address.
    pub async fn serve(&self, gsh: &GracefulShutdown) -> Result<SocketAddr> {
        let listener = self.server.bind().await?;
        let addr = listener
            .local_addr()
            .context("failed to read listener address")?;

        gsh.add(1);
        let server = self.server.clone();
        let gsh = gsh.clone();
        tokio::task::spawn(async move {
            if let Err(e) = server.serve(listener).await {
                error!(
                    component = "app",
                    scope = "server",
                    event = "serve_failed",
                    error = %e,
                    "listener server failed to serve"
                );
            }
            gsh.done();
        });

        info!(component = "app", event = "started", role = "listener", addr = %addr, "listener started");

        Ok(addr)
    }
}
