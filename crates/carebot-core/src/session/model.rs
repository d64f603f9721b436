//! Transcript and request lifecycle types.

use serde::{Deserialize, Serialize};

use super::message::Message;

/// Lifecycle of the single outstanding generation request of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    /// No request in flight; input is accepted.
    #[default]
    Idle,
    /// A request is in flight; further submissions are rejected.
    Pending,
    /// The last request failed. Sessions settle back to `Idle` once the
    /// fallback message is appended, so this is only observable to custom
    /// state consumers.
    Failed,
}

impl RequestState {
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestState::Pending)
    }
}

/// Ordered, append-only sequence of messages.
///
/// The only mutations are [`Transcript::push`] and [`Transcript::reset`];
/// existing entries are never reordered or edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Creates a transcript holding a single bot greeting.
    pub fn seeded(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::bot(greeting)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Replaces the whole transcript with a fresh greeting.
    pub fn reset(&mut self, greeting: impl Into<String>) {
        self.messages = vec![Message::bot(greeting)];
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
