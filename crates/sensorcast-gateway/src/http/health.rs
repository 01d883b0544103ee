use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::app::AppState;

/// GET /health — liveness probe with per-stream counters.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let streams: Vec<Value> = state
        .streams_sorted()
        .into_iter()
        .map(|s| {
            json!({
                "sensor": s.config.sensor,
                "period_ms": s.config.period_ms,
                "subscribers": s.registry.len(),
                "sequence": s.handle.sequence(),
                "running": !s.handle.is_stopped(),
            })
        })
        .collect();

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "bind": state.config.gateway.bind,
        "port": state.config.gateway.port,
        "streams": streams,
    }))
}
