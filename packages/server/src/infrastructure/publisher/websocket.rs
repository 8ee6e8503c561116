//! WebSocket を使った EventPublisher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` を管理
//! - ドメインイベントを JSON にエンコードして送信（unicast, broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の生成と送信キューの受信側は UI 層（`ui/handler/websocket.rs`）が持ちます。
//! ここではキューへの push だけを行うため、遅いクライアントがいても呼び出し側は待たされません。
//! キューは FIFO なので、同じ接続に対する送信順はそのまま保たれます。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{ConnectionId, EventPublisher, PusherChannel, ServerEvent},
    infrastructure::dto::websocket::ServerEventDto,
};

/// WebSocket を使った EventPublisher 実装
#[derive(Default)]
pub struct WebSocketEventPublisher {
    /// 接続中のクライアントの送信キュー
    clients: Mutex<HashMap<ConnectionId, PusherChannel>>,
}

impl WebSocketEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登録中の接続数
    pub async fn connection_count(&self) -> usize {
        self.clients.lock().await.len()
    }

    fn encode(event: &ServerEvent) -> Option<String> {
        match serde_json::to_string(&ServerEventDto::from(event)) {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::error!("Failed to encode server event: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl EventPublisher for WebSocketEventPublisher {
    async fn attach(&self, connection_id: ConnectionId, channel: PusherChannel) {
        let mut clients = self.clients.lock().await;
        tracing::debug!("Connection '{}' attached to publisher", connection_id);
        clients.insert(connection_id, channel);
    }

    async fn detach(&self, connection_id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        if clients.remove(connection_id).is_some() {
            tracing::debug!("Connection '{}' detached from publisher", connection_id);
        }
    }

    async fn unicast(&self, connection_id: &ConnectionId, event: &ServerEvent) {
        let Some(json) = Self::encode(event) else {
            return;
        };

        let clients = self.clients.lock().await;
        match clients.get(connection_id) {
            Some(sender) => {
                if sender.send(json).is_err() {
                    tracing::debug!(
                        "Connection '{}' closed before unicast, skipping",
                        connection_id
                    );
                }
            }
            None => {
                tracing::debug!("Connection '{}' not attached, skipping unicast", connection_id);
            }
        }
    }

    async fn broadcast(&self, event: &ServerEvent) {
        let Some(json) = Self::encode(event) else {
            return;
        };

        let clients = self.clients.lock().await;
        for (connection_id, sender) in clients.iter() {
            // 一部の送信失敗は許容し、残りの接続への配信を続ける
            if sender.send(json.clone()).is_err() {
                tracing::warn!("Failed to push event to connection '{}'", connection_id);
            }
        }
        tracing::debug!("Broadcasted event to {} connection(s)", clients.len());
    }
}
