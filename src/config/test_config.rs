use super::{Api, Config, Listener, Logs, Poller, Queue, Relay, Wol};
use std::time::Duration;

/// Creates a new test configuration. Servers bind ephemeral loopback ports.
pub fn new_test_config() -> Config {
    Config {
        env: super::TEST.to_string(),
        logs: Some(Logs {
            level: Some("debug".to_string()),
        }),
        relay: Some(Relay {
            api: Some(Api {
                name: Some("relay-test".to_string()),
                host: Some("127.0.0.1".to_string()),
                port: Some(0),
                timeout: Some(Duration::from_secs(5)),
            }),
            queue: Some(Queue {
                retention: Some(Duration::from_secs(5 * 60)),
                sweep_interval: Some(Duration::from_millis(20)),
                capacity: None,
            }),
        }),
        listener: Some(Listener {
            api: Some(Api {
                name: Some("listener-test".to_string()),
                host: Some("127.0.0.1".to_string()),
                port: Some(0),
                timeout: Some(Duration::from_secs(5)),
            }),
            command: Some(vec!["/nonexistent/powerrelay-shutdown".to_string()]),
        }),
        poller: Some(Poller {
            relay_url: Some("http://127.0.0.1:3000".to_string()),
            listener_url: Some("http://127.0.0.1:8080".to_string()),
            poll_interval: Some(Duration::from_millis(50)),
            shutdown_retry_interval: Some(Duration::from_millis(100)),
            request_timeout: Some(Duration::from_secs(2)),
            wol: Some(Wol {
                mac: Some("aa:bb:cc:dd:ee:ff".to_string()),
                broadcast: Some("127.0.0.1:9".to_string()),
            }),
        }),
    }
}
