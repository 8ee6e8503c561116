//! Chat room state machine.
//!
//! Per connection: `Connected` -> `Joined` -> `Closed`. A connection is
//! `Connected` while it sits in `pending`, `Joined` while it is in the registry,
//! and `Closed` once it is in neither. Every transition returns the events to
//! deliver, in emission order.

use std::{collections::HashSet, sync::Arc};

use hiroba_shared::time::Clock;

use super::{
    entity::{ChatMessage, Participant},
    error::SessionError,
    event::{Outbound, ServerEvent},
    factory::{ConnectionIdFactory, MessageIdGenerator},
    history::HistoryRing,
    registry::ConnectionRegistry,
    value_object::{ConnectionId, Timestamp, Username},
};

/// Counters exposed by the status endpoint and heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomStats {
    pub users: usize,
    pub messages: usize,
}

pub struct ChatSession {
    pending: HashSet<ConnectionId>,
    registry: ConnectionRegistry,
    history: HistoryRing,
    message_ids: MessageIdGenerator,
    clock: Arc<dyn Clock>,
}

impl ChatSession {
    pub fn new(history_capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            pending: HashSet::new(),
            registry: ConnectionRegistry::new(),
            history: HistoryRing::new(history_capacity),
            message_ids: MessageIdGenerator::new(),
            clock,
        }
    }

    /// Record a new transport connection in the `Connected` state.
    ///
    /// The id is minted here, so a closed connection can never be revived by
    /// presenting its old id.
    pub fn connect(&mut self) -> ConnectionId {
        let connection_id = loop {
            let candidate = ConnectionIdFactory::generate();
            if !self.pending.contains(&candidate) && !self.registry.contains(&candidate) {
                break candidate;
            }
        };
        self.pending.insert(connection_id.clone());
        connection_id
    }

    /// Join the room under `username`.
    ///
    /// Emits the history replay to the joiner, then `userJoined` to everyone.
    ///
    /// # Errors
    ///
    /// Rejections leave the session untouched:
    /// - [`SessionError::AlreadyJoined`] if the connection already joined
    /// - [`SessionError::NotConnected`] if the connection is unknown or closed
    /// - [`SessionError::InvalidUsername`] if `username` trims to empty
    pub fn join(
        &mut self,
        connection_id: &ConnectionId,
        username: &str,
    ) -> Result<Vec<Outbound>, SessionError> {
        if self.registry.contains(connection_id) {
            return Err(SessionError::AlreadyJoined(connection_id.to_string()));
        }
        if !self.pending.contains(connection_id) {
            return Err(SessionError::NotConnected(connection_id.to_string()));
        }
        let username = Username::new(username).map_err(|_| SessionError::InvalidUsername)?;

        let user = self.registry.register(connection_id.clone(), username)?;
        self.pending.remove(connection_id);

        Ok(vec![
            Outbound::Unicast(
                connection_id.clone(),
                ServerEvent::MessageHistory(self.history.snapshot()),
            ),
            Outbound::Broadcast(ServerEvent::UserJoined {
                user,
                users: self.registry.snapshot(),
            }),
        ])
    }

    /// Accept a message from a joined connection.
    ///
    /// Messages from connections that have not joined are dropped without an
    /// event. Empty text is accepted as-is.
    pub fn post_message(&mut self, connection_id: &ConnectionId, text: String) -> Vec<Outbound> {
        let Some(author) = self.registry.get(connection_id) else {
            return Vec::new();
        };

        let timestamp = Timestamp::new(self.clock.now_millis());
        let id = self.message_ids.next_id(timestamp);
        let message = ChatMessage::new(id, author, text, timestamp);
        self.history.append(message.clone());

        vec![Outbound::Broadcast(ServerEvent::Message(message))]
    }

    /// Close a connection. Valid from any state; only a joined connection
    /// produces `userLeft`.
    pub fn disconnect(&mut self, connection_id: &ConnectionId) -> Vec<Outbound> {
        self.pending.remove(connection_id);

        match self.registry.unregister(connection_id) {
            Some(user) => vec![Outbound::Broadcast(ServerEvent::UserLeft {
                user,
                users: self.registry.snapshot(),
            })],
            None => Vec::new(),
        }
    }

    pub fn is_joined(&self, connection_id: &ConnectionId) -> bool {
        self.registry.contains(connection_id)
    }

    pub fn participants(&self) -> Vec<Participant> {
        self.registry.snapshot()
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        self.history.snapshot()
    }

    /// Number of messages replayed to joiners, after clamping.
    pub fn history_capacity(&self) -> usize {
        self.history.capacity()
    }

    pub fn stats(&self) -> RoomStats {
        RoomStats {
            users: self.registry.len(),
            messages: self.history.len(),
        }
    }
}
