//! Hiroba: real-time chat relay with live presence.
//!
//! Clients join a single room with a username over WebSocket, exchange short
//! messages, and receive a full participant list whenever someone joins or leaves.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
