use super::*;
use std::collections::HashMap;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn defaults_when_nothing_set() {
    let config = ConsoleConfig::from_lookup(|_| None).expect("config");
    assert_eq!(config, ConsoleConfig::default());
    assert_eq!(config.backend_url(), "http://localhost:3000/api/v1");
    assert_eq!(config.ws_url(), "ws://localhost:3000/api/v1/ws");
    assert_eq!(config.live.reconnect_max, Duration::from_secs(10));
    assert_eq!(config.live.heartbeat_timeout, Duration::from_millis(7_500));
    assert_eq!(config.notification_ttl, Duration::from_secs(2));
}

#[test]
fn production_switches_to_secure_schemes() {
    let config = ConsoleConfig::from_lookup(lookup(&[
        ("DOGEPLUS_BASE_URL", "dispatch.example.org/"),
        ("DOGEPLUS_API_VERSION", "v2"),
        ("DOGEPLUS_PRODUCTION", "1"),
    ]))
    .expect("config");
    assert_eq!(config.backend_url(), "https://dispatch.example.org/api/v2");
    assert_eq!(config.ws_url(), "wss://dispatch.example.org/api/v2/ws");
}

#[test]
fn timings_parse_and_fall_back() {
    let config = ConsoleConfig::from_lookup(lookup(&[
        ("DOGEPLUS_HEARTBEAT_INTERVAL_MS", "250"),
        ("DOGEPLUS_RECONNECT_MAX_MS", "not-a-number"),
        ("DOGEPLUS_REQUEST_TIMEOUT_SECS", "3"),
    ]))
    .expect("config");
    assert_eq!(config.live.heartbeat_interval, Duration::from_millis(250));
    assert_eq!(config.live.reconnect_max, Duration::from_millis(DEFAULT_RECONNECT_MAX_MS));
    assert_eq!(config.http.request, Duration::from_secs(3));
}

#[test]
fn zero_timings_are_rejected() {
    for key in [
        "DOGEPLUS_HEARTBEAT_INTERVAL_MS",
        "DOGEPLUS_SCROLL_INTERVAL_MS",
        "DOGEPLUS_RECONNECT_INITIAL_MS",
        "DOGEPLUS_CONNECT_TIMEOUT_SECS",
    ] {
        let err = ConsoleConfig::from_lookup(lookup(&[(key, "0")])).expect_err("zero duration");
        assert_eq!(err, ConfigError::ZeroDuration { key: key.to_owned() });
    }
}

#[test]
fn mock_flag_accepts_true_and_one() {
    assert!(ConsoleConfig::from_lookup(lookup(&[("DOGEPLUS_MOCK", "true")])).expect("config").mock);
    assert!(ConsoleConfig::from_lookup(lookup(&[("DOGEPLUS_MOCK", "1")])).expect("config").mock);
    assert!(!ConsoleConfig::from_lookup(lookup(&[("DOGEPLUS_MOCK", "0")])).expect("config").mock);
}

#[test]
fn malformed_bool_is_an_error() {
    let err = ConsoleConfig::from_lookup(lookup(&[("DOGEPLUS_MOCK", "yes")])).expect_err("invalid bool");
    assert_eq!(err, ConfigError::InvalidBool { key: "DOGEPLUS_MOCK".to_owned(), value: "yes".to_owned() });
}

#[test]
fn parse_env_bool_is_strict() {
    assert_eq!(parse_env_bool("K", "false"), Ok(false));
    assert_eq!(parse_env_bool("K", " true "), Ok(true));
    assert!(parse_env_bool("K", "TRUE").is_err());
    assert!(parse_env_bool("K", "").is_err());
}

#[test]
fn session_path_override() {
    let config = ConsoleConfig::from_lookup(lookup(&[("DOGEPLUS_SESSION_PATH", "/tmp/op.json")])).expect("config");
    assert_eq!(config.session_path, PathBuf::from("/tmp/op.json"));
}
