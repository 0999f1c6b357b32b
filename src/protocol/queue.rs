use std::collections::VecDeque;

use super::message::IncomingMessage;

/// Completed messages in the order their bytes arrived.
///
/// Unbounded. The size cap bounds any single message; bounding how many sit
/// here undispatched is up to whoever reads from the socket.
#[derive(Debug, Clone, Default)]
pub struct MessageQueue {
    messages: VecDeque<IncomingMessage>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: IncomingMessage) {
        self.messages.push_back(message);
    }

    pub fn pop_front(&mut self) -> Option<IncomingMessage> {
        self.messages.pop_front()
    }

    pub fn front(&self) -> Option<&IncomingMessage> {
        self.messages.front()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &IncomingMessage> {
        self.messages.iter()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = IncomingMessage> + '_ {
        self.messages.drain(..)
    }
}
