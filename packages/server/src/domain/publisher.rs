//! MessagePusher trait に相当する配信インターフェース
//!
//! ドメイン層が必要とする配信の契約を定義し、具体的な実装は Infrastructure 層が
//! 提供します（依存性の逆転）。
//!
//! ## 契約
//!
//! - 配信は fire-and-forget: 確認応答も再送もしない
//! - 切断済みの接続への送信は何もしない（エラーにしない）
//! - ある接続への送信失敗が他の接続への配信に影響しない
//! - 同じ接続に対しては、呼び出し順に届く

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{event::ServerEvent, value_object::ConnectionId};

/// Per-connection outbound queue; the receiving end is drained by the socket writer.
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// 接続の送信チャンネルを登録
    async fn attach(&self, connection_id: ConnectionId, channel: PusherChannel);

    /// 接続の送信チャンネルを登録解除
    async fn detach(&self, connection_id: &ConnectionId);

    /// 1 つの接続にだけ送信
    async fn unicast(&self, connection_id: &ConnectionId, event: &ServerEvent);

    /// 登録済みの全ての接続に送信
    async fn broadcast(&self, event: &ServerEvent);
}
