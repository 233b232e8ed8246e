//! The append-only conversation log.

use ravel_model::ChatMessage;
use serde::{Deserialize, Serialize};

/// An ordered, append-only sequence of chat messages.
///
/// Turns only ever add messages; nothing reorders or removes them, so
/// after N turns the log holds exactly the submitted and generated
/// messages in chronological order. The system prompt is not part of
/// the log, it is prepended to each request by the loops.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Creates an empty conversation.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message.
    #[inline]
    pub fn push(&mut self, msg: ChatMessage) {
        self.messages.push(msg);
    }

    /// Returns the messages, oldest first.
    #[inline]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Returns the most recent message, if any.
    #[inline]
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Returns the number of messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if no message has been recorded yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_only_order() {
        let mut conversation = Conversation::new();
        conversation.push(ChatMessage::user("first"));
        conversation.push(ChatMessage::assistant("second"));
        conversation.push(ChatMessage::user("third"));

        let contents: Vec<&str> =
            conversation.messages().iter().map(|m| m.content()).collect();
        assert_eq!(contents, ["first", "second", "third"]);
        assert_eq!(conversation.last().unwrap().content(), "third");
        assert_eq!(conversation.len(), 3);
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut conversation = Conversation::new();
        conversation.push(ChatMessage::user("hello"));
        conversation.push(ChatMessage::assistant("hi"));

        let text = serde_json::to_string(&conversation).unwrap();
        let back: Conversation = serde_json::from_str(&text).unwrap();
        assert_eq!(back.messages(), conversation.messages());
    }
}
