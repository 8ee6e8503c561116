//! Bounded message history.

use std::collections::VecDeque;

use super::entity::ChatMessage;

/// Number of messages retained when no capacity is configured.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Append-only log of the most recent messages, oldest first.
///
/// Once full, every append evicts the oldest entry, so the ring always holds
/// exactly the latest `capacity` messages in arrival order.
#[derive(Debug)]
pub struct HistoryRing {
    messages: VecDeque<ChatMessage>,
    capacity: usize,
}

impl HistoryRing {
    /// Create a ring holding at most `capacity` messages (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn append(&mut self, message: ChatMessage) {
        while self.messages.len() >= self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    /// Copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
