//! Infrastructure layer: wire formats and the WebSocket event publisher.

pub mod dto;
pub mod publisher;
