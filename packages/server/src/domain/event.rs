//! Outbound events produced by session transitions.

use super::{
    entity::{ChatMessage, Participant},
    value_object::ConnectionId,
};

/// An event sent from the room to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// Full history replay, oldest first. Sent only to the joiner.
    MessageHistory(Vec<ChatMessage>),
    /// A participant joined; `users` is the full registry after the join.
    UserJoined {
        user: Participant,
        users: Vec<Participant>,
    },
    /// A message was accepted into the room.
    Message(ChatMessage),
    /// A participant left; `users` is the full registry after the removal.
    UserLeft {
        user: Participant,
        users: Vec<Participant>,
    },
}

/// An event paired with its delivery scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Unicast(ConnectionId, ServerEvent),
    Broadcast(ServerEvent),
}
