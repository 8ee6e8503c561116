//! Identifier factories.

use uuid::Uuid;

use super::value_object::{ConnectionId, MessageId, Timestamp};

/// Mints a fresh [`ConnectionId`] for every accepted transport connection.
///
/// Ids are random v4 UUIDs, so a closed connection's id is never handed out again.
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    pub fn generate() -> ConnectionId {
        ConnectionId::from_generated(Uuid::new_v4().simple().to_string())
    }
}

/// Generates message ids of the form `<millis>-<sequence>-<random>`.
///
/// The sequence strictly increases for the lifetime of the generator, which alone
/// makes ids unique within the process. The timestamp and random suffix keep ids
/// from colliding with those of a previous process.
#[derive(Debug, Default)]
pub struct MessageIdGenerator {
    sequence: u64,
}

impl MessageIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self, now: Timestamp) -> MessageId {
        self.sequence += 1;
        let suffix = Uuid::new_v4().simple().to_string();
        MessageId::new(format!(
            "{}-{}-{}",
            now.value(),
            self.sequence,
            &suffix[..8]
        ))
    }
}
