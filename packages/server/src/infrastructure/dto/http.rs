//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// Response of `GET /`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusDto {
    pub status: String,
    pub message: String,
    /// RFC 3339, UTC
    pub timestamp: String,
    pub port: u16,
    /// Number of joined participants
    pub users: usize,
    /// Number of messages in history
    pub messages: usize,
}

/// Response of `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
    /// Process uptime in seconds
    pub uptime: f64,
    /// RFC 3339, UTC
    pub timestamp: String,
}
