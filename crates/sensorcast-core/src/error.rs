use thiserror::Error;

#[derive(Debug, Error)]
pub enum SensorcastError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template error ({path}): {reason}")]
    Template { path: String, reason: String },

    #[error("Unknown stream: {sensor}")]
    UnknownStream { sensor: String },
}

impl SensorcastError {
    /// Short error code string, used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            SensorcastError::Config(_) => "CONFIG_ERROR",
            SensorcastError::Template { .. } => "TEMPLATE_ERROR",
            SensorcastError::UnknownStream { .. } => "UNKNOWN_STREAM",
        }
    }
}

pub type Result<T> = std::result::Result<T, SensorcastError>;
