//! Integration tests for configuration validation

#![allow(clippy::expect_used)]

use rcon_protocol::config::{ClientConfig, LoggingConfig, RconConfig, DEFAULT_PORT};
use rcon_protocol::{ProtocolError, TextEncoding};
use std::time::Duration;
use tracing::Level;

#[test]
fn test_default_config_validates() {
    let config = RconConfig::default();
    let errors = config.validate();
    assert!(
        errors.is_empty(),
        "Default config should be valid, but got errors: {:?}",
        errors
    );
}

#[test]
fn test_defaults_match_protocol_conventions() {
    let config = ClientConfig::default();
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.max_packet_size, 0);
    assert_eq!(config.encoding, TextEncoding::Ascii);
    assert_eq!(config.timeout, Duration::from_secs(5));
    assert_eq!(config.auth_timeout, Duration::from_secs(5));
    assert!(config.local_address.is_none());
}

#[test]
fn test_empty_host() {
    let mut config = RconConfig::default();
    config.client.host = String::new();

    let errors = config.validate();
    assert!(!errors.is_empty());
    assert!(errors.iter().any(|e| e.contains("Host cannot be empty")));
}

#[test]
fn test_zero_port() {
    let config = RconConfig::default_with_overrides(|c| c.client.port = 0);

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Port must be greater than 0")));
}

#[test]
fn test_invalid_local_address() {
    let mut config = RconConfig::default();
    config.client.local_address = Some("not-an-address".to_string());

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Invalid local address")));
}

#[test]
fn test_local_address_accepts_bare_ip() {
    let mut config = ClientConfig::default();
    config.local_address = Some("127.0.0.1".to_string());

    let addr = config
        .local_socket_addr()
        .expect("bare IP should parse")
        .expect("address configured");
    assert_eq!(addr.port(), 0);
    assert!(config.validate().is_empty());
}

#[test]
fn test_max_packet_size_too_small() {
    let mut config = RconConfig::default();
    config.client.max_packet_size = 8;

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Max packet size too small")));

    config.client.max_packet_size = 14;
    assert!(config.validate().is_empty());
}

#[test]
fn test_timeout_too_short() {
    let mut config = RconConfig::default();
    config.client.timeout = Duration::from_millis(5);

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Timeout too short")));
}

#[test]
fn test_auth_timeout_too_long() {
    let mut config = RconConfig::default();
    config.client.auth_timeout = Duration::from_secs(600);

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Auth timeout too long")));
}

#[test]
fn test_app_name_too_long() {
    let mut config = RconConfig::default();
    config.logging.app_name = "a".repeat(65);

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Application name too long")));
}

#[test]
fn test_multiple_validation_errors() {
    let mut config = RconConfig::default();
    config.client.host = String::new();
    config.client.port = 0;
    config.logging.app_name = String::new();

    let errors = config.validate();
    assert!(
        errors.len() >= 3,
        "Should have at least 3 errors, got {}",
        errors.len()
    );
}

#[test]
fn test_validate_strict_reports_config_error() {
    let config = RconConfig::default_with_overrides(|c| c.client.port = 0);

    match config.validate_strict() {
        Err(ProtocolError::ConfigError(msg)) => {
            assert!(msg.contains("Configuration validation failed"));
            assert!(msg.contains("Port must be greater than 0"));
        }
        other => panic!("Expected ConfigError, got {other:?}"),
    }
    assert!(RconConfig::default().validate_strict().is_ok());
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let config = RconConfig::from_toml(
        r#"
        [client]
        host = "game.example.net"
        port = 25575
        encoding = "utf8"
        auth_timeout = 2500
        "#,
    )
    .expect("partial TOML should parse");

    assert_eq!(config.client.host, "game.example.net");
    assert_eq!(config.client.port, 25575);
    assert_eq!(config.client.encoding, TextEncoding::Utf8);
    assert_eq!(config.client.auth_timeout, Duration::from_millis(2500));
    assert_eq!(config.client.timeout, Duration::from_secs(5));
    assert_eq!(config.logging.log_level, Level::INFO);
}

#[test]
fn test_malformed_toml_is_config_error() {
    let result = RconConfig::from_toml("[client\nport = ");
    assert!(matches!(result, Err(ProtocolError::ConfigError(_))));

    let result = RconConfig::from_toml("[client]\nencoding = \"latin1\"");
    assert!(matches!(result, Err(ProtocolError::ConfigError(_))));
}

#[test]
fn test_example_config_round_trips() {
    let example = RconConfig::example_config();
    assert!(example.contains("[client]"));
    assert!(example.contains("[logging]"));

    let parsed = RconConfig::from_toml(&example).expect("example config should parse");
    assert_eq!(parsed.client.port, DEFAULT_PORT);
    assert_eq!(parsed.logging.log_level, Level::INFO);
    assert!(parsed.validate().is_empty());
}

#[test]
fn test_save_and_load_file() {
    let path = std::env::temp_dir().join(format!("rcon-config-{}.toml", std::process::id()));
    let config = RconConfig::default_with_overrides(|c| {
        c.client.port = 25575;
        c.logging = LoggingConfig {
            app_name: "rcon-test".to_string(),
            log_level: Level::DEBUG,
            json_format: true,
        };
    });

    config.save_to_file(&path).expect("save config");
    let loaded = RconConfig::from_file(&path).expect("load config");
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded.client.port, 25575);
    assert_eq!(loaded.logging.app_name, "rcon-test");
    assert_eq!(loaded.logging.log_level, Level::DEBUG);
    assert!(loaded.logging.json_format);
}

#[test]
fn test_missing_file_is_config_error() {
    let result = RconConfig::from_file("/nonexistent/rcon.toml");
    assert!(matches!(result, Err(ProtocolError::ConfigError(_))));
}

#[test]
fn test_ipv6_address_is_bracketed() {
    assert_eq!(ClientConfig::new("::1", 27015).address(), "[::1]:27015");
    assert_eq!(
        ClientConfig::new("localhost", 25575).address(),
        "localhost:25575"
    );
}
