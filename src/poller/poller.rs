// Device-side loop: drains the relay and turns requests into power actions.

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PollerSettings;
use crate::model::{AckBody, PollResponse};

use super::wol::{self, MacAddress};

/// How often the retry condition of shutdown mode is evaluated.
const RETRY_CHECK_EVERY: Duration = Duration::from_millis(100);

/// Status reported back to the relay for every handled request.
pub const ACK_STATUS_SENT: &str = "sent";

#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    #[error("relay request failed: {0}")]
    Relay(#[source] reqwest::Error),
    #[error("relay answered with status {0}")]
    RelayStatus(u16),
    #[error("listener request failed: {0}")]
    Listener(#[source] reqwest::Error),
    #[error("listener answered with status {status}: {body}")]
    ListenerStatus { status: u16, body: String },
    #[error("failed to send wake-on-lan packet: {0}")]
    Wol(#[source] std::io::Error),
}

/// What a single poll decided to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing pending.
    Idle,
    Wake(String),
    Shutdown(String),
    /// Same id as the last handled request.
    Duplicate(String),
    /// Request of a kind this device does not act on.
    Ignored { id: String, kind: String },
}

#[derive(Debug, Clone, Default)]
pub struct PollerState {
    pub last_processed_id: Option<String>,
    /// Set by a shutdown request, cleared by the next wake request.
    pub shutdown_mode: bool,
    pub last_shutdown_attempt: Option<Instant>,
}

/// Classifies a poll response against the current state.
pub fn decide(state: &PollerState, resp: &PollResponse) -> Action {
    let id = match resp.id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => id.to_string(),
        None => return Action::Idle,
    };

    if (resp.wake || resp.shutdown) && state.last_processed_id.as_deref() == Some(id.as_str()) {
        return Action::Duplicate(id);
    }
    if resp.wake {
        return Action::Wake(id);
    }
    if resp.shutdown {
        return Action::Shutdown(id);
    }
    Action::Ignored {
        id,
        kind: resp
            .kind
            .as_ref()
            .map(|k| k.to_string())
            .unwrap_or_default(),
    }
}

/// Poller polls the relay, wakes the host over WOL and asks its listener to shut down.
pub struct Poller {
    settings: PollerSettings,
    mac: MacAddress,
    client: reqwest::Client,
    state: PollerState,
}

impl Poller {
    pub fn new(settings: PollerSettings) -> Result<Self> {
        let mac: MacAddress = settings
            .mac
            .as_deref()
            .context("poller.wol.mac is required")?
            .parse()?;
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .context("failed to build http client")?;

        Ok(Self {
            settings,
            mac,
            client,
            state: PollerState::default(),
        })
    }

    pub fn state(&self) -> &PollerState {
        &self.state
    }

    pub fn mac(&self) -> MacAddress {
        self.mac
    }

    /// Spawns the poll loop. It runs until the token is cancelled.
    pub fn spawn(self, shutdown_token: CancellationToken) -> JoinHandle<()> {
        tokio::task::spawn(self.run(shutdown_token))
    }

    async fn run(mut self, shutdown_token: CancellationToken) {
        let mut poll = interval(self.settings.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut retry = interval(RETRY_CHECK_EVERY);
        retry.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            component = "poller",
            event = "started",
            relay = %self.settings.relay_url,
            listener = %self.settings.listener_url,
            mac = %self.mac,
            broadcast = %self.settings.broadcast,
            "device poller started"
        );

        loop {
            tokio::select! {
                _ = shutdown_token.cancelled() => {
                    debug!(component = "poller", event = "stopped", "device poller stopped");
                    return;
                }
                _ = poll.tick() => {
                    // A cycle makes up to three sequential requests; cancellation must not wait for them.
                    tokio::select! {
                        _ = shutdown_token.cancelled() => {
                            debug!(component = "poller", event = "stopped", "device poller stopped mid-poll");
                            return;
                        }
                        res = self.poll_once() => {
                            if let Err(e) = res {
                                warn!(component = "poller", event = "poll_failed", error = %e, "polling relay failed");
                            }
                        }
                    }
                }
                _ = retry.tick() => {
                    tokio::select! {
                        _ = shutdown_token.cancelled() => {
                            debug!(component = "poller", event = "stopped", "device poller stopped mid-retry");
                            return;
                        }
                        res = self.retry_shutdown() => {
                            if let Err(e) = res {
                                warn!(component = "poller", event = "shutdown_retry_failed", error = %e, "shutdown retry failed");
                            }
                        }
                    }
                }
            }
        }
    }

    /// Polls the relay once and acts on the answer.
    pub async fn poll_once(&mut self) -> Result<Action, PollerError> {
        let resp = self.fetch().await?;
        let action = decide(&self.state, &resp);

        match &action {
            Action::Idle => {
                if !self.state.shutdown_mode {
                    debug!(component = "poller", event = "idle", "no wake/shutdown request pending");
                }
            }
            Action::Duplicate(id) => {
                info!(component = "poller", event = "duplicate", id = %id, "duplicate request ignored");
            }
            Action::Ignored { id, kind } => {
                warn!(component = "poller", event = "ignored", id = %id, kind = %kind, "unsupported request type ignored");
            }
            Action::Wake(id) => {
                info!(component = "poller", event = "wake_received", id = %id, "wake request received");
                if self.state.shutdown_mode {
                    info!(component = "poller", event = "shutdown_mode_exit", "leaving shutdown mode");
                    self.state.shutdown_mode = false;
                }
                if let Err(e) = self.wake().await {
                    warn!(component = "poller", event = "wol_failed", id = %id, error = %e, "wake-on-lan failed");
                }
                self.state.last_processed_id = Some(id.clone());
                self.acknowledge(id, "wake").await;
            }
            Action::Shutdown(id) => {
                info!(component = "poller", event = "shutdown_received", id = %id, "shutdown request received");
                self.state.shutdown_mode = true;
                self.state.last_shutdown_attempt = Some(Instant::now());
                if let Err(e) = self.send_shutdown().await {
                    warn!(component = "poller", event = "shutdown_failed", id = %id, error = %e, "shutdown command failed");
                }
                self.state.last_processed_id = Some(id.clone());
                self.acknowledge(id, "shutdown").await;
            }
        }

        Ok(action)
    }

    /// Re-sends the shutdown command while in shutdown mode and the retry interval elapsed.
    /// Returns whether a retry was sent.
    pub async fn retry_shutdown(&mut self) -> Result<bool, PollerError> {
        if !self.state.shutdown_mode {
            return Ok(false);
        }
        let due = self
            .state
            .last_shutdown_attempt
            .map_or(true, |at| at.elapsed() >= self.settings.shutdown_retry_interval);
        if !due {
            return Ok(false);
        }

        info!(component = "poller", event = "shutdown_retry", "retrying shutdown command");
        self.state.last_shutdown_attempt = Some(Instant::now());
        self.send_shutdown().await?;
        Ok(true)
    }

    async fn fetch(&self) -> Result<PollResponse, PollerError> {
        let url = format!("{}/api/wake", self.settings.relay_url);
        let resp = self.client.get(&url).send().await.map_err(PollerError::Relay)?;
        if !resp.status().is_success() {
            return Err(PollerError::RelayStatus(resp.status().as_u16()));
        }
        resp.json::<PollResponse>().await.map_err(PollerError::Relay)
    }

    async fn wake(&self) -> Result<(), PollerError> {
        wol::send_magic_packet(&self.mac, self.settings.broadcast)
            .await
            .map_err(PollerError::Wol)?;
        info!(
            component = "poller",
            event = "wol_sent",
            mac = %self.mac,
            target = %self.settings.broadcast,
            "wake-on-lan packet sent"
        );
        Ok(())
    }

    async fn send_shutdown(&self) -> Result<(), PollerError> {
        let url = format!("{}/shutdown", self.settings.listener_url);
        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(PollerError::Listener)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PollerError::ListenerStatus {
                status: status.as_u16(),
                body,
            });
        }
        info!(
            component = "poller",
            event = "shutdown_sent",
            status = status.as_u16(),
            "shutdown command accepted by host"
        );
        Ok(())
    }

    /// Reports a handled request back to the relay. Failures are only logged.
    async fn acknowledge(&self, id: &str, action: &str) {
        let url = format!("{}/api/wake/ack", self.settings.relay_url);
        let body = AckBody {
            id: id.to_string(),
            status: ACK_STATUS_SENT.to_string(),
            action: Some(action.to_string()),
        };

        match self.client.post(&url).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!(component = "poller", event = "ack_sent", id = %id, "acknowledgment sent");
            }
            Ok(resp) => {
                warn!(
                    component = "poller",
                    event = "ack_rejected",
                    id = %id,
                    status = resp.status().as_u16(),
                    "acknowledgment rejected"
                );
            }
            Err(e) => {
                warn!(component = "poller", event = "ack_failed", id = %id, error = %e, "acknowledgment failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{new_test_config, ConfigTrait};
    use crate::model::RequestKind;

    fn resp(kind: &str, id: &str) -> PollResponse {
        let kind = RequestKind::from(kind);
        PollResponse {
            wake: kind.is_wake(),
            shutdown: kind.is_shutdown(),
            kind: Some(kind),
            id: Some(id.to_string()),
            timestamp: None,
            source: None,
        }
    }

    #[test]
    fn test_decide_on_empty_queue() {
        assert_eq!(decide(&PollerState::default(), &PollResponse::empty()), Action::Idle);
    }

    #[test]
    fn test_decide_wake_and_shutdown() {
        let state = PollerState::default();
        assert_eq!(decide(&state, &resp("wake", "a1")), Action::Wake("a1".into()));
        assert_eq!(decide(&state, &resp("shutdown", "b2")), Action::Shutdown("b2".into()));
    }

    #[test]
    fn test_decide_duplicate() {
        let state = PollerState {
            last_processed_id: Some("a1".into()),
            ..Default::default()
        };
        assert_eq!(decide(&state, &resp("wake", "a1")), Action::Duplicate("a1".into()));
        assert_eq!(decide(&state, &resp("shutdown", "c3")), Action::Shutdown("c3".into()));
    }

    #[test]
    fn test_decide_unknown_kind_is_ignored() {
        assert_eq!(
            decide(&PollerState::default(), &resp("reboot", "d4")),
            Action::Ignored {
                id: "d4".into(),
                kind: "reboot".into()
            }
        );
    }

    #[test]
    fn test_new_requires_valid_mac() {
        let mut settings = new_test_config().poller().unwrap();
        assert!(Poller::new(settings.clone()).is_ok());

        settings.mac = None;
        assert!(Poller::new(settings.clone()).is_err());

        settings.mac = Some("not-a-mac".into());
        assert!(Poller::new(settings).is_err());
    }
}
