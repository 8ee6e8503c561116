//! Request handlers.

pub mod http;
pub mod websocket;

pub use http::{health_check, server_status};
pub use websocket::websocket_handler;
