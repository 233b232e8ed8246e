//! Local fake providers for testing the agent and RAG pipelines.

mod embedder;
mod preset;

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use ravel_model::{
    AssistantMessage, ChatProvider, ErrorKind, FinishReason, ModelRequest,
    ModelResponse, ProviderError, ResponseEvent, ToolCallRequest,
};
use tokio::time::{Sleep, sleep};

pub use embedder::FakeEmbedder;
pub use preset::*;

/// Error type for the scripted provider.
#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[derive(Clone)]
enum ScriptStep {
    UserInput,
    AssistantResponse(PresetResponse),
}

/// A fake chat model driven by a conversation script.
///
/// Each step in the script corresponds to one message in the request
/// history, so the same provider can serve a whole multi-turn exchange:
/// the number of history messages selects which preset turn to play.
/// Requests beyond the script fail with a descriptive error.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    script: Vec<ScriptStep>,
    attempts: Arc<Mutex<HashMap<usize, u64>>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    /// Appends a user-input step to the script.
    #[inline]
    pub fn add_user_turn(&mut self) {
        self.script.push(ScriptStep::UserInput);
    }

    /// Appends a preset assistant turn to the script.
    #[inline]
    pub fn add_assistant_turn(&mut self, preset: PresetResponse) {
        self.script.push(ScriptStep::AssistantResponse(preset));
    }

    /// Sets the artificial delay between streamed events.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    fn select_step(&self, history_len: usize) -> Result<&PresetResponse, Error> {
        let Some(step) = self.script.get(history_len) else {
            return Err(Error {
                message: "conversation script exhausted",
                kind: ErrorKind::RateLimitExceeded,
            });
        };
        match step {
            ScriptStep::UserInput => Err(Error {
                message: "expected a user turn at this position",
                kind: ErrorKind::Moderated,
            }),
            ScriptStep::AssistantResponse(preset) => {
                if let Some(failures) = preset.failures {
                    let mut attempts = self.attempts.lock().unwrap();
                    let n = attempts.entry(history_len).or_insert(0);
                    *n += 1;
                    if failures == 0 || *n <= failures {
                        return Err(Error {
                            message: "scripted failure",
                            kind: ErrorKind::Other,
                        });
                    }
                }
                Ok(preset)
            }
        }
    }
}

impl ChatProvider for ScriptedProvider {
    type Error = Error;
    type Response = ScriptedResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        // The system prompt does not consume a script step; demos
        // always prepend one.
        let history_len = req
            .messages
            .iter()
            .filter(|m| !matches!(m, ravel_model::ChatMessage::System { .. }))
            .count();
        let result = self.select_step(history_len).map(|preset| {
            ScriptedResponse {
                events: preset.events.clone(),
                event_idx: 0,
                delay: self.delay.unwrap_or(Duration::from_millis(1)),
                sleep: None,
            }
        });
        ready(result)
    }
}

/// The streaming response of a [`ScriptedProvider`].
pub struct ScriptedResponse {
    events: Vec<PresetEvent>,
    event_idx: usize,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ScriptedResponse {
    fn finish_reason(&self) -> FinishReason {
        let has_tool_call = self
            .events
            .iter()
            .any(|event| matches!(event, PresetEvent::ToolCall(_)));
        if has_tool_call {
            FinishReason::ToolCalls
        } else {
            FinishReason::Stop
        }
    }
}

impl ModelResponse for ScriptedResponse {
    type Error = Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };

        if let Some(sleep) = &mut this.sleep {
            ready!(sleep.as_mut().poll(cx));
            this.sleep = None;

            let event_idx = this.event_idx;
            this.event_idx += 1;
            let event = match this.events.get(event_idx) {
                Some(PresetEvent::MessageDelta(msg)) => {
                    ResponseEvent::MessageDelta(msg.clone())
                }
                Some(PresetEvent::ToolCall(req)) => {
                    ResponseEvent::ToolCall(req.clone())
                }
                None if event_idx == this.events.len() => {
                    ResponseEvent::Completed(this.finish_reason())
                }
                // Polled after completion.
                None => return Poll::Ready(Ok(None)),
            };
            return Poll::Ready(Ok(Some(event)));
        }

        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_event(cx)
    }

    fn take_assistant_message(&mut self) -> AssistantMessage {
        let mut content = String::new();
        let mut tool_calls: Vec<ToolCallRequest> = Vec::new();
        for event in self.events.drain(..) {
            match event {
                PresetEvent::MessageDelta(msg) => content.push_str(&msg),
                PresetEvent::ToolCall(req) => tool_calls.push(req),
            }
        }
        AssistantMessage {
            content,
            tool_calls,
        }
    }
}
