use thiserror::Error;

/// Invalid simulator parameters, reported at construction time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// `min` must be strictly below `max`.
    #[error("min ({min}) must be less than max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    /// `initial` lies outside `[min, max]`.
    #[error("initial value {initial} is outside [{min}, {max}]")]
    InitialOutOfRange { initial: f64, min: f64, max: f64 },

    /// `max_delta_per_sec` must be strictly positive.
    #[error("max_delta_per_sec must be > 0, got {0}")]
    NonPositiveDelta(f64),

    /// `drift_probability` must lie in `[0, 1]`.
    #[error("drift_probability must be within [0, 1], got {0}")]
    ProbabilityOutOfRange(f64),

    /// A parameter is NaN or infinite.
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
