//! Entities of the chat room.

use super::value_object::{ConnectionId, MessageId, Timestamp, Username};

/// A connection that has joined the room under a username.
///
/// Created on join, never mutated, dropped on disconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub connection_id: ConnectionId,
    pub username: Username,
}

impl Participant {
    pub fn new(connection_id: ConnectionId, username: Username) -> Self {
        Self {
            connection_id,
            username,
        }
    }
}

/// A chat message accepted by the room.
///
/// `username` is copied from the author at send time so history stays readable
/// after the author leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub username: Username,
    pub text: String,
    pub timestamp: Timestamp,
    pub author: ConnectionId,
}

impl ChatMessage {
    pub fn new(
        id: MessageId,
        author: &Participant,
        text: String,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id,
            username: author.username.clone(),
            text,
            timestamp,
            author: author.connection_id.clone(),
        }
    }
}
