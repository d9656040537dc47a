// Configuration loading and management.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use crate::queue::{DEFAULT_RETENTION, DEFAULT_SWEEP_INTERVAL};

pub const PROD: &str = "prod";
pub const DEV: &str = "dev";
pub const TEST: &str = "test";

pub const DEFAULT_RELAY_HOST: &str = "127.0.0.1";
pub const DEFAULT_RELAY_PORT: u16 = 3000;
pub const DEFAULT_LISTENER_HOST: &str = "0.0.0.0";
pub const DEFAULT_LISTENER_PORT: u16 = 8080;
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_SHUTDOWN_RETRY_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_POLLER_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_LISTENER_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_WOL_BROADCAST: &str = "255.255.255.255:9";

pub const DEFAULT_SHUTDOWN_COMMAND: [&str; 4] = ["sudo", "shutdown", "-h", "now"];

fn default_env() -> String {
    DEV.to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_env")]
    pub env: String,
    #[serde(default)]
    pub logs: Option<Logs>,
    #[serde(default)]
    pub relay: Option<Relay>,
    #[serde(default)]
    pub listener: Option<Listener>,
    #[serde(default)]
    pub poller: Option<Poller>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            env: default_env(),
            logs: None,
            relay: None,
            listener: None,
            poller: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Logs {
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Api {
    pub name: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl Api {
    fn socket_addr(&self, default_host: &str, default_port: u16) -> Result<SocketAddr> {
        let host = self.host.as_deref().unwrap_or(default_host);
        let ip: IpAddr = host
            .parse()
            .with_context(|| format!("invalid api host {:?}", host))?;
        Ok(SocketAddr::new(ip, self.port.unwrap_or(default_port)))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Queue {
    #[serde(default, with = "humantime_serde")]
    pub retention: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub sweep_interval: Option<Duration>,
    /// Zero or absent keeps the queue unbounded.
    pub capacity: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Relay {
    pub api: Option<Api>,
    pub queue: Option<Queue>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Listener {
    pub api: Option<Api>,
    /// Program followed by its arguments.
    pub command: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Wol {
    pub mac: Option<String>,
    pub broadcast: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Poller {
    pub relay_url: Option<String>,
    pub listener_url: Option<String>,
    #[serde(default, with = "humantime_serde")]
    pub poll_interval: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub shutdown_retry_interval: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
    pub wol: Option<Wol>,
}

/// Relay service settings with defaults applied.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub name: String,
    pub addr: SocketAddr,
    pub timeout: Duration,
    pub retention: Duration,
    pub sweep_interval: Duration,
    pub capacity: Option<usize>,
}

/// Command receiver settings with defaults applied.
#[derive(Debug, Clone)]
pub struct ListenerSettings {
    pub name: String,
    pub addr: SocketAddr,
    pub timeout: Duration,
    pub command: Vec<String>,
}

/// Device poller settings with defaults applied.
#[derive(Debug, Clone)]
pub struct PollerSettings {
    pub relay_url: String,
    pub listener_url: String,
    pub poll_interval: Duration,
    pub shutdown_retry_interval: Duration,
    pub request_timeout: Duration,
    pub mac: Option<String>,
    pub broadcast: SocketAddr,
}

// Config trait
pub trait ConfigTrait {
    fn logs(&self) -> Option<&Logs>;
    fn is_prod(&self) -> bool;
    fn is_test(&self) -> bool;
    fn relay(&self) -> Result<RelaySettings>;
    fn listener(&self) -> Result<ListenerSettings>;
    fn poller(&self) -> Result<PollerSettings>;
}

impl ConfigTrait for Config {
    fn logs(&self) -> Option<&Logs> {
        self.logs.as_ref()
    }

    fn is_prod(&self) -> bool {
        self.env == PROD
    }

    fn is_test(&self) -> bool {
        self.env == TEST
    }

    fn relay(&self) -> Result<RelaySettings> {
        let relay = self.relay.clone().unwrap_or_default();
        let api = relay.api.unwrap_or_default();
        let queue = relay.queue.unwrap_or_default();

        let retention = queue.retention.unwrap_or(DEFAULT_RETENTION);
        let sweep_interval = queue.sweep_interval.unwrap_or(DEFAULT_SWEEP_INTERVAL);
        if retention.is_zero() {
            bail!("relay.queue.retention must be greater than zero");
        }
        if sweep_interval.is_zero() {
            bail!("relay.queue.sweep_interval must be greater than zero");
        }

        Ok(RelaySettings {
            name: api.name.clone().unwrap_or_else(|| "relay".to_string()),
            addr: api
                .socket_addr(DEFAULT_RELAY_HOST, DEFAULT_RELAY_PORT)
                .context("relay.api")?,
            timeout: api.timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT),
            retention,
            sweep_interval,
            capacity: queue.capacity.filter(|c| *c > 0),
        })
    }

    fn listener(&self) -> Result<ListenerSettings> {
        let listener = self.listener.clone().unwrap_or_default();
        let api = listener.api.unwrap_or_default();

        let command = listener
            .command
            .unwrap_or_else(|| DEFAULT_SHUTDOWN_COMMAND.iter().map(|s| s.to_string()).collect());
        if command.first().map_or(true, |p| p.trim().is_empty()) {
            bail!("listener.command must name a program");
        }

        Ok(ListenerSettings {
            name: api.name.clone().unwrap_or_else(|| "listener".to_string()),
            addr: api
                .socket_addr(DEFAULT_LISTENER_HOST, DEFAULT_LISTENER_PORT)
                .context("listener.api")?,
            timeout: api.timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT),
            command,
        })
    }

    fn poller(&self) -> Result<PollerSettings> {
        let poller = self.poller.clone().unwrap_or_default();
        let wol = poller.wol.unwrap_or_default();

        let poll_interval = poller.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL);
        let shutdown_retry_interval = poller
            .shutdown_retry_interval
            .unwrap_or(DEFAULT_SHUTDOWN_RETRY_INTERVAL);
        if poll_interval.is_zero() || shutdown_retry_interval.is_zero() {
            bail!("poller intervals must be greater than zero");
        }

        let broadcast = wol.broadcast.as_deref().unwrap_or(DEFAULT_WOL_BROADCAST);
        let broadcast: SocketAddr = broadcast
            .parse()
            .with_context(|| format!("invalid poller.wol.broadcast {:?}", broadcast))?;

        Ok(PollerSettings {
            relay_url: trim_url(poller.relay_url.as_deref().unwrap_or(DEFAULT_RELAY_URL)),
            listener_url: trim_url(
                poller
                    .listener_url
                    .as_deref()
                    .unwrap_or(DEFAULT_LISTENER_URL),
            ),
            poll_interval,
            shutdown_retry_interval,
            request_timeout: poller
                .request_timeout
                .unwrap_or(DEFAULT_POLLER_REQUEST_TIMEOUT),
            mac: wol.mac,
            broadcast,
        })
    }
}

fn trim_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

impl Config {
    /// Loads configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Resolve absolute path
        let abs_path = path
            .canonicalize()
            .with_context(|| format!("failed to resolve absolute config filepath: {:?}", path))?;

        let data = std::fs::read_to_string(&abs_path)
            .with_context(|| format!("read config yaml file {:?}", abs_path))?;

        Self::from_yaml(&data).with_context(|| format!("load config from {:?}", abs_path))
    }

    /// Parses and validates configuration from YAML text.
    pub fn from_yaml(data: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(data).context("unmarshal yaml")?;

        match cfg.env.as_str() {
            PROD | DEV | TEST => {}
            other => bail!("unknown env {:?} (expected prod, dev or test)", other),
        }

        // Fail fast on sections that are present but invalid.
        if cfg.relay.is_some() {
            cfg.relay()?;
        }
        if cfg.listener.is_some() {
            cfg.listener()?;
        }
        if cfg.poller.is_some() {
            cfg.poller()?;
        }

        Ok(cfg)
    }
}

// Test config is always available for integration tests
mod test_config;
pub use test_config::new_test_config;

#[cfg(test)]
mod config_test;
