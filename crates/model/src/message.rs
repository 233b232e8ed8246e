use serde::{Deserialize, Serialize};

use crate::tool::{ToolCallRequest, ToolSpec};

/// A single entry in a conversation history.
///
/// Tool calls are carried inside the assistant message that requested
/// them, so a serialized conversation can be replayed against the
/// provider without any side channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    /// System instructions.
    System {
        /// The instruction text.
        content: String,
    },
    /// A user input.
    User {
        /// The input text.
        content: String,
    },
    /// A model output, possibly requesting tool calls.
    Assistant(AssistantMessage),
    /// The result of one tool call, fed back to the model.
    Tool(ToolCallResult),
}

impl ChatMessage {
    /// Creates a system message.
    #[inline]
    pub fn system<S: Into<String>>(content: S) -> Self {
        ChatMessage::System {
            content: content.into(),
        }
    }

    /// Creates a user message.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        ChatMessage::User {
            content: content.into(),
        }
    }

    /// Creates a plain assistant message without tool calls.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        ChatMessage::Assistant(AssistantMessage {
            content: content.into(),
            tool_calls: Vec::new(),
        })
    }

    /// Returns the textual content of this message.
    pub fn content(&self) -> &str {
        match self {
            ChatMessage::System { content } => content,
            ChatMessage::User { content } => content,
            ChatMessage::Assistant(msg) => &msg.content,
            ChatMessage::Tool(result) => &result.content,
        }
    }
}

/// A complete assistant turn.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// The generated text, possibly empty for pure tool-call turns.
    pub content: String,
    /// Tool calls the model asked the caller to execute.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
}

/// The outcome of executing one requested tool call.
///
/// Failures are reported through `content` as well; the model only ever
/// sees a string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// Identifier of the request this result answers.
    pub id: String,
    /// The textual output of the tool.
    pub content: String,
}

/// A request to be sent to a chat model.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelRequest {
    /// The conversation so far, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Tools the model is allowed to call.
    pub tools: Vec<ToolSpec>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_roundtrip_with_tool_calls() {
        let msg = ChatMessage::Assistant(AssistantMessage {
            content: "Let me check.".to_owned(),
            tool_calls: vec![ToolCallRequest {
                id: "call:1".to_owned(),
                name: "search".to_owned(),
                arguments: json!({ "query": "GDP of the US" }),
            }],
        });
        let text = serde_json::to_string(&msg).unwrap();
        let back: ChatMessage = serde_json::from_str(&text).unwrap();
        assert_eq!(msg, back);
    }

    #[test]
    fn test_plain_assistant_omits_tool_calls() {
        let msg = ChatMessage::assistant("done");
        let text = serde_json::to_string(&msg).unwrap();
        assert!(!text.contains("tool_calls"));
    }
}
