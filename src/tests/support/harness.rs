// Integration test harness: relay and listener on ephemeral loopback ports.

use std::net::SocketAddr;
use std::sync::{Arc, Once};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::app::{ListenerApp, RelayApp};
use crate::config::Config;
use crate::power::ShutdownIssuer;
use crate::queue::RelayQueue;
use crate::shutdown::GracefulShutdown;
use crate::time::Clock;

static METRICS: Once = Once::new();

/// Installs the process-wide Prometheus recorder once for the whole test binary.
pub fn init_metrics() {
    METRICS.call_once(|| {
        if let Err(e) = crate::controller::init_prometheus_exporter() {
            println!("[e2e] metrics recorder not installed: {}", e);
        }
    });
}

fn graceful(token: &CancellationToken) -> GracefulShutdown {
    let gsh = GracefulShutdown::new(token.clone());
    gsh.set_graceful_timeout(Duration::from_secs(5));
    gsh
}

pub struct RelayHarness {
    pub app: RelayApp,
    pub addr: SocketAddr,
    token: CancellationToken,
    gsh: GracefulShutdown,
}

/// Starts a live relay with the given clock.
pub async fn start_relay(cfg: Config, clock: Arc<dyn Clock>) -> RelayHarness {
    let token = CancellationToken::new();
    let gsh = graceful(&token);
    let app = RelayApp::with_clock(token.clone(), &cfg, clock).expect("relay app");
    let addr = app.serve(&gsh).await.expect("relay bound");
    println!("[e2e] relay at http://{}", addr);

    RelayHarness {
        app,
        addr,
        token,
        gsh,
    }
}

impl RelayHarness {
    pub fn base(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base(), path)
    }

    pub fn queue(&self) -> Arc<RelayQueue> {
        self.app.queue()
    }

    pub async fn stop(self) {
        self.token.cancel();
        self.gsh
            .await_shutdown()
            .await
            .expect("relay shut down gracefully");
    }
}

pub struct ListenerHarness {
    pub addr: SocketAddr,
    token: CancellationToken,
    gsh: GracefulShutdown,
}

/// Starts a live command receiver backed by `issuer`.
pub async fn start_listener(cfg: Config, issuer: Arc<dyn ShutdownIssuer>) -> ListenerHarness {
    let token = CancellationToken::new();
    let gsh = graceful(&token);
    let app = ListenerApp::with_issuer(token.clone(), &cfg, issuer).expect("listener app");
    let addr = app.serve(&gsh).await.expect("listener bound");
    println!("[e2e] listener at http://{}", addr);

    ListenerHarness { addr, token, gsh }
}

impl ListenerHarness {
    pub fn base(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base(), path)
    }

    pub async fn stop(self) {
        self.token.cancel();
        self.gsh
            .await_shutdown()
            .await
            .expect("listener shut down gracefully");
    }
}
