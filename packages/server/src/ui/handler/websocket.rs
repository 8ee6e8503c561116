//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, SessionError},
    infrastructure::dto::websocket::ClientEvent,
    ui::state::AppState,
    usecase::SessionBroker,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that drains the connection's outbound queue into the WebSocket sink.
///
/// The queue is FIFO, so frames reach the client in the order the broker emitted them.
///
/// # Arguments
///
/// * `rx` - Outbound queue filled by the event publisher
/// * `sender` - WebSocket sink of this connection
///
/// # Returns
///
/// A `JoinHandle` for the spawned task
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

/// Parse one text frame and hand it to the broker.
async fn dispatch_client_event(broker: &SessionBroker, connection_id: &ConnectionId, text: &str) {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(
                "Failed to parse event from connection '{}': {}",
                connection_id,
                e
            );
            return;
        }
    };

    match event {
        ClientEvent::Join { username } => match broker.join(connection_id, &username).await {
            Ok(()) => {}
            Err(e @ SessionError::DuplicateConnection(_)) => {
                tracing::error!("Invariant violated on join: {}", e);
            }
            Err(e) => {
                tracing::warn!("Rejected join from connection '{}': {}", connection_id, e);
            }
        },
        ClientEvent::Message { text } => {
            broker.post_message(connection_id, text).await;
        }
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();

    // Create a channel for this connection to receive events
    let (tx, rx) = mpsc::unbounded_channel();

    let connection_id = state.broker.connect(tx).await;
    tracing::info!("Connection '{}' opened", connection_id);

    let mut send_task = pusher_loop(rx, sender);

    let broker = state.broker.clone();
    let recv_connection_id = connection_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", recv_connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    dispatch_client_event(&broker, &recv_connection_id, text.as_str()).await;
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", recv_connection_id);
                    break;
                }
                // Ping/pong is handled automatically by the WebSocket protocol
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.broker.disconnect(&connection_id).await;
    tracing::info!("Connection '{}' closed", connection_id);
}
