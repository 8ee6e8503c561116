//! Server execution logic.

use std::{sync::Arc, time::Instant};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{config::ServerConfig, usecase::SessionBroker};

use super::{
    handler::{health_check, server_status, websocket_handler},
    heartbeat::heartbeat_loop,
    signal::shutdown_signal,
    state::AppState,
};

pub type ServerError = Box<dyn std::error::Error + Send + Sync>;

/// WebSocket chat server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(broker, ServerConfig::default());
/// server.run().await?;
/// ```
pub struct Server {
    broker: Arc<SessionBroker>,
    config: ServerConfig,
}

impl Server {
    pub fn new(broker: Arc<SessionBroker>, config: ServerConfig) -> Self {
        Self { broker, config }
    }

    /// Bind to the configured address and serve until SIGINT/SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound, the CORS configuration
    /// is invalid, or serving fails.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr()?;
        let app_state = Arc::new(AppState {
            broker: self.broker.clone(),
            port: local_addr.port(),
            started_at: Instant::now(),
        });

        let app = Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/", get(server_status))
            .route("/health", get(health_check))
            .layer(self.config.cors_layer()?)
            .layer(TraceLayer::new_for_http())
            .with_state(app_state);

        let heartbeat = self
            .config
            .heartbeat_interval
            .filter(|period| !period.is_zero())
            .map(|period| tokio::spawn(heartbeat_loop(self.broker.clone(), period)));

        tracing::info!("Chat server listening on {}", local_addr);
        tracing::info!("WebSocket endpoint: ws://{}/ws", local_addr);
        tracing::info!(
            "History capacity: {} message(s)",
            self.broker.history_capacity().await
        );

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        if let Some(handle) = heartbeat {
            handle.abort();
        }
        result?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}
