//! HTTP server implementation.
//

use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::controller::controller::Controller;
use crate::middleware::Middleware;

/// HTTP server implementation.
pub struct HttpServer {
    shutdown_token: CancellationToken,
    name: String,
    addr: SocketAddr,
    router: Router,
}

impl HttpServer {
    /// Creates a new HTTP server.
    pub fn new(
        shutdown_token: CancellationToken,
        name: impl Into<String>,
        addr: SocketAddr,
        timeout: Duration,
        controllers: Vec<Box<dyn Controller>>,
        middlewares: Vec<Box<dyn Middleware>>,
    ) -> Arc<Self> {
        let router = Self::build_router(controllers);
        let router = Self::merge_middlewares(router, middlewares, timeout);

        Arc::new(Self {
            shutdown_token,
            name: name.into(),
            addr,
            router,
        })
    }

    /// Returns the fully assembled router (controllers plus middlewares).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Binds the configured address.
    pub async fn bind(&self) -> Result<TcpListener> {
        TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("failed to bind {} on {}", self.name, self.addr))
    }

    /// Serves on an already bound listener until the shutdown token is cancelled.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener
            .local_addr()
            .context("failed to read listener address")?;

        info!(
            component = "server",
            event = "started",
            name = %self.name,
            addr = %local_addr,
            "server started"
        );

        let shutdown_token = self.shutdown_token.clone();
        let serve_future = axum::serve(
            listener,
            self.router
                .clone()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown_token.cancelled().await;
        });

        if let Err(e) = serve_future.await {
            error!(
                component = "server",
                event = "listen_and_serve_failed",
                name = %self.name,
                addr = %local_addr,
                error = %e,
                "server failed to listen and serve"
            );
            return Err(e.into());
        }

        info!(
            component = "server",
            event = "stopped",
            name = %self.name,
            addr = %local_addr,
            "server stopped"
        );

        Ok(())
    }

    /// Builds the router with all controllers.
    fn build_router(controllers: Vec<Box<dyn Controller>>) -> Router {
        let mut router = Router::new();

        for controller in controllers {
            router = controller.add_route(router);
        }

        router
    }

    /// Merges middlewares into the router.
    fn merge_middlewares(
        router: Router,
        middlewares: Vec<Box<dyn Middleware>>,
        timeout: Duration,
    ) -> Router {
        let mut result = router;

        // Apply middlewares in reverse order (last middleware wraps first)
        for middleware in middlewares.iter().rev() {
            result = middleware.apply(result);
        }

        result
            .layer(TimeoutLayer::new(timeout))
            .layer(TraceLayer::new_for_http())
    }
}
