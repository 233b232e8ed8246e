use std::pin::Pin;
use std::task::{self, Poll};

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::AssistantMessage;
use crate::tool::ToolCallRequest;

/// Why a model stopped generating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FinishReason {
    /// The model wants tool results before continuing.
    ToolCalls,
    /// The model produced a final answer.
    Stop,
}

/// An event pulled from a streaming model response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseEvent {
    /// A fragment of generated text.
    MessageDelta(String),
    /// A fully assembled tool call request.
    ToolCall(ToolCallRequest),
    /// Generation finished.
    Completed(FinishReason),
}

/// A streaming response from a chat provider.
///
/// Responses are pull-based: callers poll events one at a time and the
/// implementation drives the underlying transport. Events must arrive
/// in a fixed order for each turn: any number of `MessageDelta`s, then
/// the `ToolCall`s, then a single `Completed`.
pub trait ModelResponse: Sized + Send + Unpin + 'static {
    /// The error type of the backing provider.
    type Error: ProviderError;

    /// Attempts to pull the next event out of the response.
    ///
    /// Returns `Poll::Ready(Ok(None))` once the stream is exhausted;
    /// polling after that point must keep returning `None`.
    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ResponseEvent>, Self::Error>>;

    /// Takes the assistant message this response produced.
    ///
    /// Only meaningful after the stream has been fully drained: the
    /// message is the concatenation of every delta plus the collected
    /// tool calls, in arrival order. Subsequent calls return an empty
    /// message.
    fn take_assistant_message(&mut self) -> AssistantMessage;
}
