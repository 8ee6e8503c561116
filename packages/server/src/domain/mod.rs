//! Domain layer for the chat relay.
//!
//! This module contains the room state machine and its building blocks. Nothing
//! here performs I/O; outbound events are returned as values and delivered by an
//! [`EventPublisher`] implementation from the infrastructure layer.

pub mod entity;
pub mod error;
pub mod event;
pub mod factory;
pub mod history;
pub mod publisher;
pub mod registry;
pub mod session;
pub mod value_object;

pub use entity::{ChatMessage, Participant};
pub use error::{RegistryError, SessionError, ValueObjectError};
pub use event::{Outbound, ServerEvent};
pub use factory::{ConnectionIdFactory, MessageIdGenerator};
pub use history::{DEFAULT_HISTORY_CAPACITY, HistoryRing};
#[cfg(test)]
pub use publisher::MockEventPublisher;
pub use publisher::{EventPublisher, PusherChannel};
pub use registry::ConnectionRegistry;
pub use session::{ChatSession, RoomStats};
pub use value_object::{ConnectionId, MessageId, Timestamp, Username};
