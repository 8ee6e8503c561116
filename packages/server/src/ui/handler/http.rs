//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};
use hiroba_shared::time::{get_utc_timestamp, timestamp_to_rfc3339};

use crate::{
    infrastructure::dto::http::{HealthDto, StatusDto},
    ui::state::AppState,
};

/// Server status with room counters (`GET /`)
pub async fn server_status(State(state): State<Arc<AppState>>) -> Json<StatusDto> {
    let stats = state.broker.stats().await;

    Json(StatusDto {
        status: "OK".to_string(),
        message: "Chat server is running".to_string(),
        timestamp: timestamp_to_rfc3339(get_utc_timestamp()),
        port: state.port,
        users: stats.users,
        messages: stats.messages,
    })
}

/// Health check endpoint (`GET /health`)
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthDto> {
    Json(HealthDto {
        status: "healthy".to_string(),
        uptime: state.started_at.elapsed().as_secs_f64(),
        timestamp: timestamp_to_rfc3339(get_utc_timestamp()),
    })
}
