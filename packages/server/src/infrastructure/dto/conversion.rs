//! Conversion logic from domain entities to DTOs.

use hiroba_shared::time::timestamp_to_rfc3339;

use crate::domain::{ChatMessage, Participant, ServerEvent};
use crate::infrastructure::dto::websocket as dto;

fn participants(users: &[Participant]) -> Vec<dto::ParticipantDto> {
    users.iter().map(dto::ParticipantDto::from).collect()
}

impl From<&Participant> for dto::ParticipantDto {
    fn from(model: &Participant) -> Self {
        Self {
            id: model.connection_id.as_str().to_string(),
            username: model.username.as_str().to_string(),
        }
    }
}

impl From<&ChatMessage> for dto::MessageDto {
    fn from(model: &ChatMessage) -> Self {
        Self {
            id: model.id.as_str().to_string(),
            username: model.username.as_str().to_string(),
            text: model.text.clone(),
            timestamp: timestamp_to_rfc3339(model.timestamp.value()),
            user_id: model.author.as_str().to_string(),
        }
    }
}

impl From<&ServerEvent> for dto::ServerEventDto {
    fn from(event: &ServerEvent) -> Self {
        match event {
            ServerEvent::MessageHistory(messages) => Self::MessageHistory {
                messages: messages.iter().map(dto::MessageDto::from).collect(),
            },
            ServerEvent::UserJoined { user, users } => Self::UserJoined {
                user: user.into(),
                users: participants(users),
            },
            ServerEvent::Message(message) => Self::Message {
                message: message.into(),
            },
            ServerEvent::UserLeft { user, users } => Self::UserLeft {
                user: user.into(),
                users: participants(users),
            },
        }
    }
}
