use std::collections::VecDeque;

use crate::protocol::OutboundMessage;

/// FIFO of messages waiting for a connection
///
/// Unbounded unless a limit is given. A bounded queue evicts its oldest
/// message to make room for a new one.
#[derive(Debug, Default)]
pub struct OutboundQueue {
    messages: VecDeque<OutboundMessage>,
    limit: Option<usize>,
}

impl OutboundQueue {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            messages: VecDeque::new(),
            limit: limit.filter(|limit| *limit > 0),
        }
    }

    /// Append a message, returning the message evicted to make room, if any
    pub fn push_back(&mut self, message: OutboundMessage) -> Option<OutboundMessage> {
        let evicted = match self.limit {
            Some(limit) if self.messages.len() >= limit => self.messages.pop_front(),
            _ => None,
        };
        self.messages.push_back(message);
        evicted
    }

    /// Put a message back at the head after a failed send
    pub fn push_front(&mut self, message: OutboundMessage) {
        self.messages.push_front(message);
    }

    pub fn pop_front(&mut self) -> Option<OutboundMessage> {
        self.messages.pop_front()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutboundMessage> {
        self.messages.iter()
    }
}
