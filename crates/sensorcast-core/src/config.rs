use std::collections::HashSet;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SensorcastError};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PERIOD_MS: u64 = 1000;
pub const DEFAULT_SENSOR: &str = "ExampleSensor";

/// Top-level config (sensorcast.toml + SENSORCAST_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorcastConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default = "default_streams")]
    pub streams: Vec<StreamConfig>,
}

impl Default for SensorcastConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            streams: default_streams(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// One simulated sensor feed, served at `/ws/{sensor}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Label published as the `sensor` template key; also the route segment.
    pub sensor: String,
    /// Tick cadence in milliseconds.
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,
    /// Mustache template file. The built-in JSON template is used when unset.
    pub template_path: Option<String>,
    pub initial: f64,
    pub min: f64,
    pub max: f64,
    pub max_delta_per_sec: f64,
    /// Probability per step that momentum is perturbed.
    ///
    /// Deliberately has no serde default: a stream that omits it is rejected.
    pub drift_probability: f64,
}

impl StreamConfig {
    /// The single stream used when the config file declares none.
    pub fn example() -> Self {
        Self {
            sensor: DEFAULT_SENSOR.to_string(),
            period_ms: DEFAULT_PERIOD_MS,
            template_path: None,
            initial: 21.0,
            min: 18.0,
            max: 26.0,
            max_delta_per_sec: 0.02,
            drift_probability: 0.0,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_period_ms() -> u64 {
    DEFAULT_PERIOD_MS
}
fn default_streams() -> Vec<StreamConfig> {
    vec![StreamConfig::example()]
}

impl SensorcastConfig {
    /// Load config from a TOML file with SENSORCAST_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.sensorcast/sensorcast.toml
    ///
    /// Nested env keys use a double underscore, e.g. `SENSORCAST_GATEWAY__PORT`.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);
        tracing::debug!(path = %path, "loading config");

        let figment = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("SENSORCAST_").split("__"));
        Self::from_figment(figment)
    }

    /// Extract and structurally validate a config from any figment source.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: SensorcastConfig = figment
            .extract()
            .map_err(|e| SensorcastError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Structural checks only; numeric simulator bounds are validated when
    /// each stream's simulator is constructed.
    pub fn validate(&self) -> Result<()> {
        if self.streams.is_empty() {
            return Err(SensorcastError::Config("no streams configured".into()));
        }
        let mut seen = HashSet::new();
        for stream in &self.streams {
            if stream.sensor.trim().is_empty() {
                return Err(SensorcastError::Config("stream sensor label is empty".into()));
            }
            if !is_valid_label(&stream.sensor) {
                return Err(SensorcastError::Config(format!(
                    "stream sensor label '{}' may only contain ASCII letters, digits, '_', '-' and '.'",
                    stream.sensor
                )));
            }
            if !seen.insert(stream.sensor.as_str()) {
                return Err(SensorcastError::Config(format!(
                    "duplicate stream sensor label '{}'",
                    stream.sensor
                )));
            }
        }
        Ok(())
    }
}

/// Labels are used verbatim as a URL path segment and inside JSON strings.
fn is_valid_label(label: &str) -> bool {
    label != "."
        && label != ".."
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.sensorcast/sensorcast.toml", home)
}
