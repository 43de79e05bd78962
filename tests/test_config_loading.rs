//! Configuration file loading tests

use sensornode::config::NodeConfig;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write config");
    file
}

#[test]
fn test_load_valid_config_file() {
    let file = write_config(
        r#"
[node]
id = "garden-node"

[network]
ssid = "homelab"
secret_env = "WIFI_PSK"

[mqtt]
broker_url = "mqtt://192.168.1.10:1883"
"#,
    );

    let config = NodeConfig::load_from_file(file.path()).expect("config loads");
    assert_eq!(config.node.id, "garden-node");
    assert_eq!(config.network.interface, "wlan0");
    assert_eq!(config.telemetry.interval_ms, 2000);
    assert_eq!(config.sensors.adc_channels, [0, 3]);
}

#[test]
fn test_load_rejects_bad_node_id() {
    let file = write_config(
        r#"
[node]
id = "bad id!"

[network]
ssid = "homelab"

[mqtt]
broker_url = "mqtt://localhost:1883"
"#,
    );

    let err = NodeConfig::load_from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("Node ID"));
}

#[test]
fn test_load_rejects_zero_interval() {
    let file = write_config(
        r#"
[node]
id = "node"

[network]
ssid = "homelab"

[mqtt]
broker_url = "mqtt://localhost:1883"

[telemetry]
interval_ms = 0
"#,
    );

    assert!(NodeConfig::load_from_file(file.path()).is_err());
}

#[test]
fn test_load_rejects_malformed_toml() {
    let file = write_config("this is not toml [");
    assert!(NodeConfig::load_from_file(file.path()).is_err());
}

#[test]
fn test_load_missing_file() {
    let path = std::path::Path::new("/nonexistent/sensornode.toml");
    assert!(NodeConfig::load_from_file(path).is_err());
}
