//! UseCase: セッションブローカー
//!
//! 接続・参加・発言・切断の全てのイベントはここを通ります。`ChatSession` の変更と
//! 配信キューへの投入は 1 つのロックの中で行われるため、
//!
//! - `userJoined` / `userLeft` に含まれる参加者リストは、その遷移の直後の状態と一致する
//! - 各接続に届くイベントの順序は、ブローカーが発行した順序と一致する
//!
//! 配信はキューへの push だけなので、ロックを保持したまま遅いクライアントを待つことはありません。
//!
//! 状態の変更は同期的に行い、その後の publisher への受け渡しはロックごと別タスクに移します。
//! 呼び出し側の future が途中で drop されても、遷移とその配信は必ず最後まで実行されます。

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::{
    ChatSession, ConnectionId, EventPublisher, Outbound, PusherChannel, RoomStats, SessionError,
};

/// 参加者管理とイベント配信のユースケース
pub struct SessionBroker {
    /// 状態機械（唯一の直列化ポイント）
    session: Arc<Mutex<ChatSession>>,
    /// EventPublisher（配信の抽象化）
    publisher: Arc<dyn EventPublisher>,
}

impl SessionBroker {
    pub fn new(session: ChatSession, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            publisher,
        }
    }

    /// 新しい接続を受け付ける
    ///
    /// 接続 ID を発行し、送信キューを publisher に登録します。
    ///
    /// # Returns
    ///
    /// 発行された接続 ID
    pub async fn connect(&self, channel: PusherChannel) -> ConnectionId {
        let mut session = self.lock().await;
        let connection_id = session.connect();

        let publisher = self.publisher.clone();
        let attached = connection_id.clone();
        complete_under_lock(session, async move {
            publisher.attach(attached, channel).await;
        })
        .await;

        connection_id
    }

    /// ルームに参加する
    ///
    /// 成功すると参加者に履歴を送り、全員に `userJoined` を配信します。
    /// 拒否された場合は何も配信しません。
    pub async fn join(
        &self,
        connection_id: &ConnectionId,
        username: &str,
    ) -> Result<(), SessionError> {
        let mut session = self.lock().await;
        let outbound = session.join(connection_id, username)?;
        let users = session.stats().users;
        complete_under_lock(session, deliver(self.publisher.clone(), outbound)).await;

        tracing::info!(
            "Connection '{}' joined as '{}'. Total users: {}",
            connection_id,
            username.trim(),
            users
        );
        Ok(())
    }

    /// メッセージを送信する
    ///
    /// # Returns
    ///
    /// メッセージが受理されたかどうか。未参加の接続からのメッセージは黙って破棄されます。
    pub async fn post_message(&self, connection_id: &ConnectionId, text: String) -> bool {
        let mut session = self.lock().await;
        let outbound = session.post_message(connection_id, text);
        if outbound.is_empty() {
            tracing::debug!(
                "Dropped message from connection '{}' that has not joined",
                connection_id
            );
            return false;
        }
        complete_under_lock(session, deliver(self.publisher.clone(), outbound)).await;
        true
    }

    /// 接続を閉じる
    ///
    /// どの状態からでも呼び出せます。参加済みだった場合だけ `userLeft` を配信します。
    /// 切断した本人には `userLeft` は届きません（先に detach されます）。
    pub async fn disconnect(&self, connection_id: &ConnectionId) {
        let mut session = self.lock().await;
        let outbound = session.disconnect(connection_id);
        let was_joined = !outbound.is_empty();
        let users = session.stats().users;

        let publisher = self.publisher.clone();
        let detached = connection_id.clone();
        complete_under_lock(session, async move {
            publisher.detach(&detached).await;
            deliver(publisher, outbound).await;
        })
        .await;

        if was_joined {
            tracing::info!(
                "Connection '{}' left the room. Total users: {}",
                connection_id,
                users
            );
        }
    }

    pub async fn stats(&self) -> RoomStats {
        self.session.lock().await.stats()
    }

    /// 実際に保持される履歴の件数（0 を指定した場合は 1 に丸められている）
    pub async fn history_capacity(&self) -> usize {
        self.session.lock().await.history_capacity()
    }

    async fn lock(&self) -> OwnedMutexGuard<ChatSession> {
        self.session.clone().lock_owned().await
    }
}

/// Hand events to the publisher in emission order.
async fn deliver(publisher: Arc<dyn EventPublisher>, outbound: Vec<Outbound>) {
    for item in outbound {
        match item {
            Outbound::Unicast(target, event) => publisher.unicast(&target, &event).await,
            Outbound::Broadcast(event) => publisher.broadcast(&event).await,
        }
    }
}

/// Run `work` on its own task while holding the session lock, then release it.
///
/// The spawned task owns the guard, so dropping the caller mid-way neither
/// cancels `work` nor lets another transition in before it finishes.
async fn complete_under_lock<F>(session: OwnedMutexGuard<ChatSession>, work: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    let task = tokio::spawn(async move {
        work.await;
        drop(session);
    });
    if let Err(e) = task.await {
        tracing::error!("Event delivery task failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{DEFAULT_HISTORY_CAPACITY, MockEventPublisher, ServerEvent},
        infrastructure::{
            dto::websocket::{ParticipantDto, ServerEventDto},
            publisher::WebSocketEventPublisher,
        },
    };
    use async_trait::async_trait;
    use hiroba_shared::time::{FixedClock, SystemClock};
    use mockall::Sequence;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - SessionBroker が状態遷移の結果を正しい順序・範囲で publisher に渡すこと
    // - 拒否・無視される操作では publisher が呼ばれないこと
    // - 並行して join しても参加者リストが線形化されること
    //
    // 【なぜこのテストが必要か】
    // - 参加者リストのスナップショットの一貫性はブローカーのロックだけが保証する
    // - イベントの配信範囲（unicast / broadcast）の誤りはクライアントの表示を壊す
    // ========================================

    fn create_session() -> ChatSession {
        ChatSession::new(DEFAULT_HISTORY_CAPACITY, Arc::new(FixedClock::new(1000)))
    }

    fn mock_with_attach() -> MockEventPublisher {
        let mut mock = MockEventPublisher::new();
        mock.expect_attach().returning(|_, _| ());
        mock
    }

    /// 配信のたびに何度も yield し、呼び出し側が途中で drop される余地を作る publisher
    #[derive(Default)]
    struct YieldingPublisher {
        unicasts: AtomicUsize,
        broadcasts: AtomicUsize,
    }

    #[async_trait]
    impl EventPublisher for YieldingPublisher {
        async fn attach(&self, _connection_id: ConnectionId, _channel: PusherChannel) {}

        async fn detach(&self, _connection_id: &ConnectionId) {}

        async fn unicast(&self, _connection_id: &ConnectionId, _event: &ServerEvent) {
            self.unicasts.fetch_add(1, Ordering::SeqCst);
            for _ in 0..10 {
                tokio::task::yield_now().await;
            }
        }

        async fn broadcast(&self, _event: &ServerEvent) {
            for _ in 0..10 {
                tokio::task::yield_now().await;
            }
            self.broadcasts.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn decode(json: &str) -> ServerEventDto {
        serde_json::from_str(json).unwrap()
    }

    fn names(users: &[ParticipantDto]) -> Vec<&str> {
        users.iter().map(|u| u.username.as_str()).collect()
    }

    #[tokio::test]
    async fn test_join_unicasts_history_then_broadcasts_user_joined() {
        // テスト項目: join で履歴の unicast → userJoined の broadcast の順に publisher が呼ばれる
        // given (前提条件):
        let mut mock = mock_with_attach();
        let mut seq = Sequence::new();
        mock.expect_unicast()
            .withf(|_, event| matches!(event, ServerEvent::MessageHistory(m) if m.is_empty()))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        mock.expect_broadcast()
            .withf(|event| {
                matches!(event, ServerEvent::UserJoined { user, users }
                    if user.username.as_str() == "alice" && users.len() == 1)
            })
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        let broker = SessionBroker::new(create_session(), Arc::new(mock));
        let (tx, _rx) = mpsc::unbounded_channel();
        let c1 = broker.connect(tx).await;

        // when (操作):
        let result = broker.join(&c1, "alice").await;

        // then (期待する結果): 期待回数は mock の drop 時に検証される
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_rejected_join_publishes_nothing() {
        // テスト項目: 空白のみのユーザー名での join は InvalidUsername になり、何も配信されない
        // given (前提条件):
        let mut mock = mock_with_attach();
        mock.expect_unicast().never();
        mock.expect_broadcast().never();
        let broker = SessionBroker::new(create_session(), Arc::new(mock));
        let (tx, _rx) = mpsc::unbounded_channel();
        let c1 = broker.connect(tx).await;

        // when (操作):
        let result = broker.join(&c1, "   ").await;

        // then (期待する結果):
        assert_eq!(result, Err(SessionError::InvalidUsername));
        assert_eq!(broker.stats().await.users, 0);
    }

    #[tokio::test]
    async fn test_message_from_unjoined_connection_publishes_nothing() {
        // テスト項目: 未参加の接続からのメッセージは破棄され、何も配信されない
        // given (前提条件):
        let mut mock = mock_with_attach();
        mock.expect_broadcast().never();
        let broker = SessionBroker::new(create_session(), Arc::new(mock));
        let (tx, _rx) = mpsc::unbounded_channel();
        let c1 = broker.connect(tx).await;

        // when (操作):
        let accepted = broker.post_message(&c1, "hi".to_string()).await;

        // then (期待する結果):
        assert!(!accepted);
        assert_eq!(broker.stats().await.messages, 0);
    }

    #[tokio::test]
    async fn test_disconnect_before_join_detaches_without_user_left() {
        // テスト項目: join 前の切断では detach だけが行われ、userLeft は配信されない
        // given (前提条件):
        let mut mock = mock_with_attach();
        mock.expect_detach().times(1).return_const(());
        mock.expect_broadcast().never();
        let broker = SessionBroker::new(create_session(), Arc::new(mock));
        let (tx, _rx) = mpsc::unbounded_channel();
        let c1 = broker.connect(tx).await;

        // when (操作):
        broker.disconnect(&c1).await;

        // then (期待する結果):
        assert_eq!(broker.stats().await.users, 0);
    }

    #[tokio::test]
    async fn test_history_capacity_reports_clamped_value() {
        // テスト項目: 容量 0 で作成したセッションは、実際に保持する 1 件を容量として報告する
        // given (前提条件):
        let broker = SessionBroker::new(
            ChatSession::new(0, Arc::new(FixedClock::new(1000))),
            Arc::new(WebSocketEventPublisher::new()),
        );

        // when (操作):
        let capacity = broker.history_capacity().await;

        // then (期待する結果):
        assert_eq!(capacity, 1);
    }

    #[tokio::test]
    async fn test_aborted_join_still_broadcasts_user_joined() {
        // テスト項目: join の呼び出し側が配信の途中で中断されても、参加と userJoined の配信は一体で完了する
        // given (前提条件):
        let publisher = Arc::new(YieldingPublisher::default());
        let broker = Arc::new(SessionBroker::new(create_session(), publisher.clone()));
        let (tx, _rx) = mpsc::unbounded_channel();
        let c1 = broker.connect(tx).await;

        // when (操作): 履歴の unicast が始まった時点で join のタスクを abort する
        let task = {
            let broker = broker.clone();
            let c1 = c1.clone();
            tokio::spawn(async move { broker.join(&c1, "alice").await })
        };
        while publisher.unicasts.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        task.abort();
        let _ = task.await;

        // then (期待する結果): ロックは配信完了まで解放されないので、stats は完了後の状態を見る
        assert_eq!(broker.stats().await.users, 1);
        assert_eq!(publisher.broadcasts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_aborted_post_message_still_broadcasts() {
        // テスト項目: 発言の呼び出し側が中断されても、履歴への追加と broadcast は一体で完了する
        // given (前提条件):
        let publisher = Arc::new(YieldingPublisher::default());
        let broker = Arc::new(SessionBroker::new(create_session(), publisher.clone()));
        let (tx, _rx) = mpsc::unbounded_channel();
        let c1 = broker.connect(tx).await;
        broker.join(&c1, "alice").await.unwrap();
        let before = publisher.broadcasts.load(Ordering::SeqCst);

        // when (操作): 配信タスクに処理が移った直後に abort する
        let task = {
            let broker = broker.clone();
            let c1 = c1.clone();
            tokio::spawn(async move { broker.post_message(&c1, "hi".to_string()).await })
        };
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        task.abort();
        let _ = task.await;

        // then (期待する結果): 履歴に残ったメッセージは必ず配信されている
        let stats = broker.stats().await;
        let broadcasts = publisher.broadcasts.load(Ordering::SeqCst) - before;
        assert_eq!(stats.messages, broadcasts);
    }

    #[tokio::test]
    async fn test_scenario_over_websocket_publisher() {
        // テスト項目: alice 参加 → 発言 → bob 参加 → alice 切断 で各接続に届く JSON を検証
        // given (前提条件):
        let broker = SessionBroker::new(
            create_session(),
            Arc::new(WebSocketEventPublisher::new()),
        );
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let c1 = broker.connect(tx1).await;
        let c2 = broker.connect(tx2).await;

        // when (操作):
        broker.join(&c1, "alice").await.unwrap();
        assert!(broker.post_message(&c1, "hi".to_string()).await);
        broker.join(&c2, "bob").await.unwrap();
        broker.disconnect(&c1).await;

        // then (期待する結果):
        // c1 は履歴（空）→ 自分の userJoined → 自分の message → bob の userJoined を受け取る
        assert_eq!(
            decode(&rx1.recv().await.unwrap()),
            ServerEventDto::MessageHistory { messages: vec![] }
        );
        assert!(matches!(
            decode(&rx1.recv().await.unwrap()),
            ServerEventDto::UserJoined { .. }
        ));
        assert!(matches!(
            decode(&rx1.recv().await.unwrap()),
            ServerEventDto::Message { .. }
        ));
        assert!(matches!(
            decode(&rx1.recv().await.unwrap()),
            ServerEventDto::UserJoined { .. }
        ));
        // 切断後は何も届かない（送信側は detach 済み）
        assert!(rx1.recv().await.is_none());

        // c2 は未参加の間も broadcast を受け取る
        assert!(matches!(
            decode(&rx2.recv().await.unwrap()),
            ServerEventDto::UserJoined { .. }
        ));
        assert!(matches!(
            decode(&rx2.recv().await.unwrap()),
            ServerEventDto::Message { .. }
        ));
        match decode(&rx2.recv().await.unwrap()) {
            ServerEventDto::MessageHistory { messages } => {
                assert_eq!(messages.len(), 1);
                assert_eq!(messages[0].username, "alice");
                assert_eq!(messages[0].text, "hi");
            }
            other => panic!("unexpected event: {:?}", other),
        }
        match decode(&rx2.recv().await.unwrap()) {
            ServerEventDto::UserJoined { user, users } => {
                assert_eq!(user.username, "bob");
                assert_eq!(names(&users), vec!["alice", "bob"]);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        match decode(&rx2.recv().await.unwrap()) {
            ServerEventDto::UserLeft { user, users } => {
                assert_eq!(user.username, "alice");
                assert_eq!(names(&users), vec!["bob"]);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(broker.stats().await, RoomStats { users: 1, messages: 1 });
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_joins_are_linearized() {
        // テスト項目: 並行して join しても、userJoined の参加者リストは 1 人ずつ増えていく
        // given (前提条件):
        const JOINERS: usize = 50;
        let broker = Arc::new(SessionBroker::new(
            ChatSession::new(DEFAULT_HISTORY_CAPACITY, Arc::new(SystemClock)),
            Arc::new(WebSocketEventPublisher::new()),
        ));
        // 観測用の接続（join しない）
        let (observer_tx, mut observer_rx) = mpsc::unbounded_channel();
        broker.connect(observer_tx).await;

        // when (操作):
        let mut handles = Vec::new();
        for n in 0..JOINERS {
            let broker = broker.clone();
            handles.push(tokio::spawn(async move {
                let (tx, rx) = mpsc::unbounded_channel();
                let id = broker.connect(tx).await;
                broker.join(&id, &format!("user{}", n)).await.unwrap();
                rx
            }));
        }
        let mut receivers = Vec::new();
        for handle in handles {
            receivers.push(handle.await.unwrap());
        }

        // then (期待する結果):
        let mut sizes = Vec::new();
        let mut previous: Vec<String> = Vec::new();
        for _ in 0..JOINERS {
            match decode(&observer_rx.recv().await.unwrap()) {
                ServerEventDto::UserJoined { user, users } => {
                    let current: Vec<String> = users.iter().map(|u| u.id.clone()).collect();
                    // 直前のリストに新しい参加者を 1 人足したものになる
                    assert_eq!(&current[..current.len() - 1], &previous[..]);
                    assert_eq!(current.last(), Some(&user.id));
                    sizes.push(current.len());
                    previous = current;
                }
                other => panic!("unexpected event: {:?}", other),
            }
        }
        assert_eq!(sizes, (1..=JOINERS).collect::<Vec<_>>());
        assert_eq!(broker.stats().await.users, JOINERS);
        drop(receivers);
    }
}
