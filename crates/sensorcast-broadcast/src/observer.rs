use tracing::{info, warn};

use crate::{
    error::{DeliveryError, RenderError},
    event::BroadcastEvent,
};

/// Observability sink for everything a tick swallows.
///
/// None of these callbacks may fail or block; they run inside the tick.
pub trait TickObserver: Send + Sync {
    /// The subscriber snapshot was empty; `message` was generated but not sent.
    fn no_listeners(&self, event: &BroadcastEvent, message: &str);

    /// The template could not be rendered; the tick sent nothing.
    fn render_failed(&self, event: &BroadcastEvent, error: &RenderError);

    /// One subscriber could not be reached; the fan-out continued.
    fn delivery_failed(&self, event: &BroadcastEvent, error: &DeliveryError);
}

/// Default observer: everything goes to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TickObserver for TracingObserver {
    fn no_listeners(&self, event: &BroadcastEvent, message: &str) {
        info!(
            sensor = %event.source_label,
            count = event.sequence,
            "generated (no listeners)\n{message}"
        );
    }

    fn render_failed(&self, event: &BroadcastEvent, error: &RenderError) {
        warn!(
            sensor = %event.source_label,
            count = event.sequence,
            error = %error,
            "render failed, tick skipped"
        );
    }

    fn delivery_failed(&self, event: &BroadcastEvent, error: &DeliveryError) {
        warn!(
            sensor = %event.source_label,
            count = event.sequence,
            error = %error,
            "delivery failed"
        );
    }
}
