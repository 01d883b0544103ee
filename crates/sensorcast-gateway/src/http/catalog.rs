use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::app::AppState;

/// GET /{sensor}/ — one-line description of where the stream is served.
pub async fn catalog_handler(
    Path(sensor): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.stream(&sensor) {
        Some(stream) => format!(
            "stream {} on /ws/{} every {} ms",
            stream.config.sensor, stream.config.sensor, stream.config.period_ms
        )
        .into_response(),
        None => super::unknown_stream(sensor),
    }
}
