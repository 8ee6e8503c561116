//! WebSocket and HTTP surface of the chat relay.

mod handler;
mod heartbeat;
mod server;
mod signal;
pub mod state;

pub use server::Server;
