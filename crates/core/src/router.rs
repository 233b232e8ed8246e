//! The conditional routing step shared by the chat loops.

use ravel_model::ChatMessage;

/// Where a loop goes after inspecting the newest message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// The message carries tool calls that must be executed.
    CallTools,
    /// The message signals completion, stop the loop.
    Finish,
    /// Neither, hand control to the next step.
    Continue,
}

/// Classifies the newest message of a conversation.
///
/// Tool calls always win: a message that requests tools routes to tool
/// execution no matter what its text says, and the tool-call list is
/// checked before anything dereferences it. Only then the text is
/// matched against the optional completion marker.
pub fn route(last_message: &ChatMessage, marker: Option<&str>) -> Decision {
    if let ChatMessage::Assistant(msg) = last_message {
        if !msg.tool_calls.is_empty() {
            return Decision::CallTools;
        }
        if let Some(marker) = marker {
            if msg.content.contains(marker) {
                return Decision::Finish;
            }
        }
    }
    Decision::Continue
}
