//! System endpoints: liveness and version, both outside authentication.

use axum::Json;
use chrono::{SecondsFormat, Utc};

use super::types::{HealthDto, VersionDto};
use crate::constants::API_VERSION;

/// `GET /health`
///
/// Lightweight liveness probe to indicate the API process is running.
pub async fn health_check() -> Json<HealthDto> {
    Json(HealthDto {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    })
}

/// `GET /version`
pub async fn version() -> Json<VersionDto> {
    Json(VersionDto {
        version: env!("CARGO_PKG_VERSION"),
        api: API_VERSION,
    })
}
