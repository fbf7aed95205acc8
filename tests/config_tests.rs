use beacon::config::{BatchConfig, BeaconConfig, DebugConfig, ENV_BATCH_SIZE, ENV_SERVER_URL, ENV_TIMEOUT_MS};
use beacon::TrackError;
use std::time::Duration;

#[test]
fn test_batch_defaults() {
    let config = BatchConfig::new("http://localhost:8106/sa");
    assert_eq!(config.max_size, 50);
    assert_eq!(config.timeout(), Duration::from_millis(1000));
    assert!(config.response_log.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_configs_load_from_json() {
    let config: BatchConfig = serde_json::from_str(r#"{"url": "http://sa/sa", "max_size": 10}"#).unwrap();
    assert_eq!(config.max_size, 10);
    assert_eq!(config.request_timeout_ms, 1000, "missing fields fall back to defaults");

    let config: BeaconConfig = serde_json::from_str(r#"{"project": "prod", "lib_detail": true}"#).unwrap();
    assert_eq!(config.project.as_deref(), Some("prod"));
    assert!(config.lib_detail);

    let config: DebugConfig = serde_json::from_str(r#"{"url": "http://sa/sa"}"#).unwrap();
    assert!(config.write_data);
}

#[test]
fn test_batch_size_bounds() {
    for max_size in [0, 1001] {
        let config = BatchConfig {
            max_size,
            ..BatchConfig::new("http://localhost/sa")
        };
        assert!(matches!(config.validate(), Err(TrackError::Config(_))), "max_size {max_size}");
    }
}

#[test]
fn test_from_env() {
    std::env::set_var(ENV_SERVER_URL, "http://env-host:8106/sa");
    std::env::set_var(ENV_BATCH_SIZE, "20");
    std::env::set_var(ENV_TIMEOUT_MS, "3000");

    let batch = BatchConfig::from_env().unwrap();
    assert_eq!(batch.url, "http://env-host:8106/sa");
    assert_eq!(batch.max_size, 20);
    assert_eq!(batch.request_timeout_ms, 3000);

    let debug = DebugConfig::from_env().unwrap();
    assert_eq!(debug.url, "http://env-host:8106/sa");
    assert_eq!(debug.timeout(), Duration::from_secs(3));

    std::env::set_var(ENV_BATCH_SIZE, "lots");
    assert!(matches!(BatchConfig::from_env(), Err(TrackError::Config(_))));

    std::env::remove_var(ENV_SERVER_URL);
    std::env::remove_var(ENV_BATCH_SIZE);
    std::env::remove_var(ENV_TIMEOUT_MS);
    assert!(BatchConfig::from_env().is_err(), "url is required");
}
