pub mod catalog;
pub mod health;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sensorcast_core::SensorcastError;
use serde_json::json;

/// 404 body shared by every per-stream route.
pub fn unknown_stream(sensor: String) -> Response {
    let err = SensorcastError::UnknownStream { sensor };
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": err.to_string(), "code": err.code()})),
    )
        .into_response()
}
