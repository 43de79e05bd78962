//! Configuration for the sensor node
//!
//! Loaded from a TOML file. Credentials (wifi secret, broker username and
//! password) are never stored in the file; the config names environment
//! variables and the values are resolved at runtime.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Main node configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeConfig {
    pub node: NodeSection,
    pub network: NetworkSection,
    pub mqtt: MqttSection,
    #[serde(default)]
    pub telemetry: TelemetrySection,
    #[serde(default)]
    pub sensors: SensorSection,
}

/// Node identity section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeSection {
    /// Node identifier (must match [a-zA-Z0-9._-]+), used in the MQTT client id
    pub id: String,
}

/// Network (wireless link) section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkSection {
    /// Network interface carrying the wireless association
    #[serde(default = "default_interface")]
    pub interface: String,
    /// SSID of the configured network (diagnostics only; association is
    /// owned by the OS supplicant)
    pub ssid: String,
    /// Environment variable containing the shared secret
    pub secret_env: Option<String>,
}

impl NetworkSection {
    /// Wireless secret resolved from the configured environment variable
    pub fn secret(&self) -> Option<String> {
        resolve_env(self.secret_env.as_ref())
    }
}

fn default_interface() -> String {
    "wlan0".to_string()
}

/// Read the environment variable named by an optional config field
fn resolve_env(env_var_name: Option<&String>) -> Option<String> {
    env_var_name.and_then(|name| std::env::var(name).ok())
}

/// MQTT broker section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MqttSection {
    /// MQTT broker URL with protocol and port
    pub broker_url: String,
    /// Environment variable containing username
    pub username_env: Option<String>,
    /// Environment variable containing password
    pub password_env: Option<String>,
}

impl MqttSection {
    /// Broker username resolved from the configured environment variable
    pub fn username(&self) -> Option<String> {
        resolve_env(self.username_env.as_ref())
    }

    /// Broker password resolved from the configured environment variable
    pub fn password(&self) -> Option<String> {
        resolve_env(self.password_env.as_ref())
    }
}

/// Telemetry cadence section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetrySection {
    /// Publish period in milliseconds (default: 2000)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

fn default_interval_ms() -> u64 {
    2000
}

/// Sensor wiring section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorSection {
    /// BCM pin numbers of the four digital inputs, in channel order
    #[serde(default = "default_digital_pins")]
    pub digital_pins: [u8; 4],
    /// MCP3008 channel numbers of the two analog inputs, in channel order
    #[serde(default = "default_adc_channels")]
    pub adc_channels: [u8; 2],
}

impl Default for SensorSection {
    fn default() -> Self {
        Self {
            digital_pins: default_digital_pins(),
            adc_channels: default_adc_channels(),
        }
    }
}

fn default_digital_pins() -> [u8; 4] {
    [17, 27, 22, 23]
}

fn default_adc_channels() -> [u8; 2] {
    // Channels 0 and 3, matching the original wiring
    [0, 3]
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid node ID format: {0}")]
    InvalidNodeId(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl NodeConfig {
    /// Load configuration from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: NodeConfig = toml::from_str(&content)?;

        validate_node_id(&config.node.id)?;
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telemetry.interval_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "telemetry.interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.sensors.adc_channels.iter().any(|&c| c > 7) {
            return Err(ConfigError::InvalidConfig(
                "sensors.adc_channels must be MCP3008 channels 0-7".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a test configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        let toml_content = r#"
[node]
id = "test-node"

[network]
ssid = "testnet"

[mqtt]
broker_url = "mqtt://localhost:1883"
"#;
        toml::from_str(toml_content).expect("Test config should parse")
    }
}

/// Validate node ID format (used verbatim in the MQTT client id)
fn validate_node_id(node_id: &str) -> Result<(), ConfigError> {
    let valid_chars = node_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-');

    if node_id.is_empty() || !valid_chars {
        return Err(ConfigError::InvalidNodeId(format!(
            "Node ID '{node_id}' must match pattern [a-zA-Z0-9._-]+"
        )));
    }

    Ok(())
}
