//! WebSocket event DTOs.
//!
//! Every frame is a JSON object tagged by `type`:
//!
//! ```text
//! client -> server  {"type":"join","username":"alice"}
//!                   {"type":"message","text":"hi"}
//! server -> client  {"type":"messageHistory","messages":[...]}
//!                   {"type":"userJoined","user":{...},"users":[...]}
//!                   {"type":"message","message":{...}}
//!                   {"type":"userLeft","user":{...},"users":[...]}
//! ```

use serde::{Deserialize, Serialize};

/// Participant as seen by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantDto {
    /// Connection id of the participant
    pub id: String,
    pub username: String,
}

/// Chat message as seen by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: String,
    pub username: String,
    pub text: String,
    /// RFC 3339, UTC
    pub timestamp: String,
    /// Connection id of the author
    pub user_id: String,
}

/// Events sent by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientEvent {
    Join { username: String },
    Message { text: String },
}

/// Events sent by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEventDto {
    MessageHistory {
        messages: Vec<MessageDto>,
    },
    UserJoined {
        user: ParticipantDto,
        users: Vec<ParticipantDto>,
    },
    Message {
        message: MessageDto,
    },
    UserLeft {
        user: ParticipantDto,
        users: Vec<ParticipantDto>,
    },
}
