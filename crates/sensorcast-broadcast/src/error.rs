use thiserror::Error;

/// Rejected broadcaster configuration.
#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("tick period must be at least 1 ms")]
    ZeroPeriod,

    #[error("source label must not be empty")]
    EmptySourceLabel,
}

/// A template could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unclosed tag starting at byte {offset}")]
    Unclosed { offset: usize },

    #[error("empty tag at byte {offset}")]
    EmptyTag { offset: usize },

    /// Sections, inverted sections, partials and delimiter changes.
    #[error("unsupported tag '{tag}' at byte {offset}")]
    Unsupported { tag: String, offset: usize },
}

/// Rendering failed for a single tick. The tick is skipped, the cadence continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("template references unknown variable '{0}'")]
    MissingVariable(String),

    #[error("render failed: {0}")]
    Failed(String),
}

/// Delivery to one subscriber failed. Only that subscriber is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("subscriber {id} is closed")]
    Closed { id: String },

    #[error("subscriber {id} is lagging, outbound queue full")]
    Lagging { id: String },

    #[error("send to {id} failed: {reason}")]
    Failed { id: String, reason: String },
}
