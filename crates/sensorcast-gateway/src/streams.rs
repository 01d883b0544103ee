//! Turns each configured stream into a running broadcaster.

use std::sync::Arc;

use sensorcast_broadcast::{
    BroadcastConfig, BroadcastHandle, Broadcaster, Scheduler, SubscriberRegistry, Template,
    DEFAULT_QUEUE_DEPTH, DEFAULT_TEMPLATE,
};
use sensorcast_core::{SensorcastError, StreamConfig};
use sensorcast_simulator::{DriftSimulator, SimulatorConfig};
use tracing::info;

/// A live stream: its config, its subscribers, and the handle driving it.
pub struct StreamState {
    pub config: StreamConfig,
    pub registry: Arc<SubscriberRegistry>,
    pub handle: BroadcastHandle,
}

/// Read and compile a template file, or the built-in template when `path` is `None`.
pub fn load_template(path: Option<&str>) -> Result<Template, SensorcastError> {
    let Some(path) = path else {
        return Template::compile(DEFAULT_TEMPLATE).map_err(|e| SensorcastError::Template {
            path: "<built-in>".into(),
            reason: e.to_string(),
        });
    };

    let source = std::fs::read_to_string(path).map_err(|e| SensorcastError::Template {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    let template = Template::compile(&source).map_err(|e| SensorcastError::Template {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    info!(path, "loaded template");
    Ok(template)
}

fn stream_err(cfg: &StreamConfig, e: impl std::fmt::Display) -> SensorcastError {
    SensorcastError::Config(format!("stream '{}': {e}", cfg.sensor))
}

fn simulator_config(cfg: &StreamConfig) -> SimulatorConfig {
    SimulatorConfig {
        initial: cfg.initial,
        min: cfg.min,
        max: cfg.max,
        max_delta_per_sec: cfg.max_delta_per_sec,
        drift_probability: cfg.drift_probability,
    }
}

/// Validate `cfg`, load its template, and start its broadcaster on `scheduler`.
///
/// Every failure here is fatal to startup: nothing is scheduled unless the
/// whole stream is valid.
pub fn start_stream<S: Scheduler + ?Sized>(
    cfg: &StreamConfig,
    scheduler: &S,
) -> Result<StreamState, SensorcastError> {
    let simulator =
        DriftSimulator::with_entropy(simulator_config(cfg)).map_err(|e| stream_err(cfg, e))?;
    let template = load_template(cfg.template_path.as_deref())?;
    let registry = Arc::new(SubscriberRegistry::new(DEFAULT_QUEUE_DEPTH));

    let broadcaster = Broadcaster::new(
        simulator,
        Arc::new(template),
        registry.clone(),
        BroadcastConfig {
            period_ms: cfg.period_ms,
            source_label: cfg.sensor.clone(),
        },
    )
    .map_err(|e| stream_err(cfg, e))?;

    let handle = broadcaster.start(scheduler);
    Ok(StreamState {
        config: cfg.clone(),
        registry,
        handle,
    })
}
