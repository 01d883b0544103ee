use axum::{routing::get, Router};
use sensorcast_broadcast::Scheduler;
use sensorcast_core::{SensorcastConfig, SensorcastError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::streams::{start_stream, StreamState};

/// Central shared state, passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: SensorcastConfig,
    /// Running streams keyed by sensor label.
    pub streams: HashMap<String, StreamState>,
}

impl AppState {
    /// Start one broadcaster per configured stream on `scheduler`.
    ///
    /// The first invalid stream aborts startup; streams started before it are
    /// stopped when their handles drop.
    pub fn build<S: Scheduler + ?Sized>(
        config: SensorcastConfig,
        scheduler: &S,
    ) -> Result<Self, SensorcastError> {
        config.validate()?;
        let mut streams = HashMap::with_capacity(config.streams.len());
        for cfg in &config.streams {
            let stream = start_stream(cfg, scheduler)?;
            streams.insert(cfg.sensor.clone(), stream);
        }
        info!(streams = streams.len(), "streams started");
        Ok(Self { config, streams })
    }

    pub fn stream(&self, sensor: &str) -> Option<&StreamState> {
        self.streams.get(sensor)
    }

    /// Streams ordered by sensor label.
    pub fn streams_sorted(&self) -> Vec<&StreamState> {
        let mut streams: Vec<&StreamState> = self.streams.values().collect();
        streams.sort_by(|a, b| a.config.sensor.cmp(&b.config.sensor));
        streams
    }

    /// Stop every broadcaster and release its subscribers, so open
    /// connections finish sending what is queued and then close.
    pub fn stop_all(&self) {
        for stream in self.streams.values() {
            stream.handle.stop();
            stream.registry.disconnect_all();
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/ws/{sensor}", get(crate::ws::connection::ws_handler))
        .route("/{sensor}/", get(crate::http::catalog::catalog_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
