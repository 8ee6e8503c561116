//! Domain errors.

use thiserror::Error;

/// Errors raised while constructing value objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    /// Connection identifiers must not be empty
    #[error("connection id must not be empty")]
    EmptyConnectionId,

    /// Usernames must contain at least one non-whitespace character
    #[error("username must not be empty or whitespace-only")]
    EmptyUsername,
}

/// Errors raised by [`crate::domain::ConnectionRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The connection id is already bound to a participant
    #[error("connection '{0}' is already registered")]
    DuplicateConnection(String),
}

/// Rejections produced by [`crate::domain::ChatSession`] transitions.
///
/// All of them leave the session untouched and emit no event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The requested username trims to an empty string
    #[error("username must not be empty or whitespace-only")]
    InvalidUsername,

    /// The connection has already joined the room
    #[error("connection '{0}' has already joined")]
    AlreadyJoined(String),

    /// The connection is unknown or already closed
    #[error("connection '{0}' is not connected")]
    NotConnected(String),

    /// Broken invariant: the connection id is already in use
    #[error("connection '{0}' is already in use")]
    DuplicateConnection(String),
}

impl From<RegistryError> for SessionError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::DuplicateConnection(id) => SessionError::DuplicateConnection(id),
        }
    }
}
