//! Shared application state.

use std::{sync::Arc, time::Instant};

use crate::usecase::SessionBroker;

/// Shared application state
pub struct AppState {
    /// SessionBroker（全ての状態遷移の入口）
    pub broker: Arc<SessionBroker>,
    /// Port the server is listening on, reported by the status endpoint
    pub port: u16,
    /// Process start, used for uptime
    pub started_at: Instant,
}
