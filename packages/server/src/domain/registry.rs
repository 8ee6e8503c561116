//! Connection registry: connection id -> participant.

use std::collections::HashMap;

use super::{
    entity::Participant,
    error::RegistryError,
    value_object::{ConnectionId, Username},
};

/// Map of joined connections to their participant record.
///
/// Snapshots enumerate participants in join order. The registry itself is not
/// synchronized; it is owned by [`crate::domain::ChatSession`], which sits behind
/// the broker's lock.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    participants: HashMap<ConnectionId, (u64, Participant)>,
    next_seq: u64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a participant for `connection_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateConnection`] if the id is already present.
    pub fn register(
        &mut self,
        connection_id: ConnectionId,
        username: Username,
    ) -> Result<Participant, RegistryError> {
        if self.participants.contains_key(&connection_id) {
            return Err(RegistryError::DuplicateConnection(
                connection_id.into_string(),
            ));
        }

        let participant = Participant::new(connection_id.clone(), username);
        self.participants
            .insert(connection_id, (self.next_seq, participant.clone()));
        self.next_seq += 1;

        Ok(participant)
    }

    /// Remove and return the participant; `None` if the connection never joined.
    pub fn unregister(&mut self, connection_id: &ConnectionId) -> Option<Participant> {
        self.participants
            .remove(connection_id)
            .map(|(_, participant)| participant)
    }

    pub fn get(&self, connection_id: &ConnectionId) -> Option<&Participant> {
        self.participants
            .get(connection_id)
            .map(|(_, participant)| participant)
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.participants.contains_key(connection_id)
    }

    /// Point-in-time copy of all participants, in join order.
    pub fn snapshot(&self) -> Vec<Participant> {
        let mut entries: Vec<&(u64, Participant)> = self.participants.values().collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries
            .into_iter()
            .map(|(_, participant)| participant.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
