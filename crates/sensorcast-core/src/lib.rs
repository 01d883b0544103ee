//! `sensorcast-core` — configuration and error types shared by every
//! sensorcast crate.

pub mod config;
pub mod error;

pub use config::{GatewayConfig, SensorcastConfig, StreamConfig};
pub use error::{Result, SensorcastError};
