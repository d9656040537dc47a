#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::time::Duration;

    use crate::config::{new_test_config, Config, ConfigTrait};

    #[test]
    fn test_defaults_match_original_deployment() {
        let cfg = Config::default();

        let relay = cfg.relay().unwrap();
        assert_eq!(relay.addr, "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(relay.retention, Duration::from_secs(300));
        assert_eq!(relay.sweep_interval, Duration::from_secs(60));
        assert_eq!(relay.capacity, None);

        let listener = cfg.listener().unwrap();
        assert_eq!(listener.addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(listener.command, vec!["sudo", "shutdown", "-h", "now"]);

        let poller = cfg.poller().unwrap();
        assert_eq!(poller.poll_interval, Duration::from_secs(5));
        assert_eq!(poller.shutdown_retry_interval, Duration::from_secs(10));
        assert!(poller.mac.is_none());
    }

    #[test]
    fn test_yaml_overrides() {
        let cfg = Config::from_yaml(
            r#"
env: prod
logs:
  level: info
relay:
  api:
    port: 3100
  queue:
    retention: 2m
    sweep_interval: 15s
    capacity: 32
listener:
  api:
    host: 192.168.1.20
  command: ["systemctl", "poweroff"]
poller:
  relay_url: "https://relay.example.com/"
  poll_interval: 3s
  wol:
    mac: "01:23:45:67:89:ab"
    broadcast: "192.168.0.255:9"
"#,
        )
        .unwrap();

        assert!(cfg.is_prod());
        assert_eq!(cfg.logs().and_then(|l| l.level.as_deref()), Some("info"));

        let relay = cfg.relay().unwrap();
        assert_eq!(relay.addr.port(), 3100);
        assert_eq!(relay.retention, Duration::from_secs(120));
        assert_eq!(relay.sweep_interval, Duration::from_secs(15));
        assert_eq!(relay.capacity, Some(32));

        let listener = cfg.listener().unwrap();
        assert_eq!(listener.addr.to_string(), "192.168.1.20:8080");
        assert_eq!(listener.command, vec!["systemctl", "poweroff"]);

        let poller = cfg.poller().unwrap();
        assert_eq!(poller.relay_url, "https://relay.example.com");
        assert_eq!(poller.poll_interval, Duration::from_secs(3));
        assert_eq!(poller.mac.as_deref(), Some("01:23:45:67:89:ab"));
        assert_eq!(poller.broadcast.to_string(), "192.168.0.255:9");
    }

    #[test]
    fn test_rejects_zero_sweep_interval() {
        let err = Config::from_yaml("relay:\n  queue:\n    sweep_interval: 0s\n").unwrap_err();
        assert!(format!("{:#}", err).contains("sweep_interval"));
    }

    #[test]
    fn test_rejects_empty_command() {
        assert!(Config::from_yaml("listener:\n  command: []\n").is_err());
    }

    #[test]
    fn test_rejects_unknown_env() {
        assert!(Config::from_yaml("env: staging\n").is_err());
    }

    #[test]
    fn test_rejects_bad_host() {
        assert!(Config::from_yaml("relay:\n  api:\n    host: not-an-ip\n").is_err());
    }

    #[test]
    fn test_test_config_is_valid() {
        let cfg = new_test_config();
        assert!(cfg.is_test());
        assert_eq!(cfg.relay().unwrap().addr.port(), 0);
        assert_eq!(cfg.listener().unwrap().addr.port(), 0);
        assert!(cfg.poller().unwrap().mac.is_some());
    }
}
