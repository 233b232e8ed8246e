use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use pin_project_lite::pin_project;
use ravel_model::{
    AssistantMessage, ErrorKind, FinishReason, ModelResponse, ResponseEvent,
    ToolCallRequest,
};
use serde_json::Value;

use crate::Error;
use crate::io::Sse;
use crate::proto::{ChatCompletionChunk, WireFunctionCall, WireToolCall};

/// Everything accumulated while the stream is in flight.
///
/// The state travels through the boxed per-event future and comes back
/// with each polled event, so the response struct itself stays unpinned.
struct PartialState {
    sse: Sse,
    chunk_id: Option<String>,
    content: String,
    tool_calls: Vec<WireToolCall>,
    // Indices of assembled tool calls that have not been surfaced as
    // events yet.
    pending_tool_call_idx: VecDeque<usize>,
    pending_finish_reason: Option<FinishReason>,
}

impl PartialState {
    fn finish(self) -> AssistantMessage {
        AssistantMessage {
            content: self.content,
            tool_calls: self
                .tool_calls
                .iter()
                .map(assemble_tool_call)
                .collect(),
        }
    }
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ResponseEvent>, PartialState), Error>;

pin_project! {
    /// A streaming chat-completions response.
    pub struct OpenAiResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
        finished: Option<AssistantMessage>,
    }
}

impl OpenAiResponse {
    #[inline]
    pub(crate) fn from_sse(sse: Sse) -> Self {
        let state = PartialState {
            sse,
            chunk_id: None,
            content: Default::default(),
            tool_calls: Default::default(),
            pending_tool_call_idx: Default::default(),
            pending_finish_reason: Default::default(),
        };
        Self {
            next_event_fut: Some(Box::pin(next_event(state))),
            finished: None,
        }
    }
}

impl ModelResponse for OpenAiResponse {
    type Error = Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            // Exhausted or failed earlier.
            return Poll::Ready(Ok(None));
        };
        let (event, state) = match ready!(next_event_fut.as_mut().poll(cx)) {
            Ok((Some(event), state)) => (event, state),
            Ok((None, state)) => {
                *this.next_event_fut = None;
                *this.finished = Some(state.finish());
                return Poll::Ready(Ok(None));
            }
            Err(err) => {
                *this.next_event_fut = None;
                return Poll::Ready(Err(err));
            }
        };

        *this.next_event_fut = Some(Box::pin(next_event(state)));
        Poll::Ready(Ok(Some(event)))
    }

    fn take_assistant_message(&mut self) -> AssistantMessage {
        self.finished.take().unwrap_or_default()
    }
}

async fn next_event(mut state: PartialState) -> NextEvent {
    let mut message_delta = None;

    loop {
        let sse_event = match state.sse.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(err) => {
                return Err(Error::new(format!("{err:?}"), ErrorKind::Other));
            }
        };
        trace!("got sse event: {sse_event}");
        if sse_event == "[DONE]" {
            break;
        }

        let mut chunk = serde_json::from_str::<ChatCompletionChunk>(&sse_event)
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;
        if state.chunk_id.get_or_insert_with(|| chunk.id.clone()) != &chunk.id
        {
            return Err(Error::new("chunk id mismatch", ErrorKind::Other));
        }

        let Some(choice) = chunk.choices.pop() else {
            break;
        };

        if let Some(finish_reason) = choice.finish_reason {
            state.pending_finish_reason =
                Some(if finish_reason == "tool_calls" {
                    FinishReason::ToolCalls
                } else {
                    FinishReason::Stop
                });
            break;
        }

        if let Some(content) = choice.delta.content {
            state.content.push_str(&content);
            message_delta = Some(content);
        }
        if let Some(tool_calls) = choice.delta.tool_calls {
            for fragment in tool_calls {
                merge_tool_call_fragment(&mut state, fragment);
            }
        }

        if message_delta.is_some() {
            break;
        }
    }

    // Event ordering matters: surface text first, then assembled tool
    // calls, then the finish reason.

    if let Some(delta) = message_delta {
        return Ok((Some(ResponseEvent::MessageDelta(delta)), state));
    }

    if let Some(idx) = state.pending_tool_call_idx.pop_front() {
        let request = assemble_tool_call(&state.tool_calls[idx]);
        return Ok((Some(ResponseEvent::ToolCall(request)), state));
    }

    if let Some(finish_reason) = state.pending_finish_reason.take() {
        return Ok((Some(ResponseEvent::Completed(finish_reason)), state));
    }

    Ok((None, state))
}

/// Folds one streamed fragment into the partially assembled tool calls.
/// Fragments of the same call share an index; string fields accumulate.
fn merge_tool_call_fragment(state: &mut PartialState, fragment: WireToolCall) {
    let Some(partial) = state
        .tool_calls
        .iter_mut()
        .find(|t| t.index == fragment.index)
    else {
        state.pending_tool_call_idx.push_back(state.tool_calls.len());
        state.tool_calls.push(fragment);
        return;
    };

    if let Some(id) = fragment.id {
        partial.id.get_or_insert_default().push_str(&id);
    }
    if let Some(ty) = fragment.r#type {
        partial.r#type.get_or_insert_default().push_str(&ty);
    }
    if let Some(function) = fragment.function {
        let partial_fn = partial
            .function
            .get_or_insert_with(WireFunctionCall::default);
        if let Some(name) = function.name {
            partial_fn.name.get_or_insert_default().push_str(&name);
        }
        if let Some(arguments) = function.arguments {
            partial_fn
                .arguments
                .get_or_insert_default()
                .push_str(&arguments);
        }
    }
}

fn assemble_tool_call(wire: &WireToolCall) -> ToolCallRequest {
    ToolCallRequest {
        id: wire.id.clone().unwrap_or_default(),
        name: wire
            .function
            .as_ref()
            .and_then(|f| f.name.clone())
            .unwrap_or_default(),
        arguments: wire
            .function
            .as_ref()
            .and_then(|f| f.arguments.as_deref())
            .and_then(|args| serde_json::from_str::<Value>(args).ok())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use bytes::Bytes;
    use serde_json::json;

    use super::*;
    use crate::io::ByteSource;

    fn data_event(payload: &Value) -> Bytes {
        Bytes::from(format!("data: {payload}\n\n"))
    }

    async fn collect(
        chunks: Vec<Bytes>,
    ) -> (Vec<ResponseEvent>, AssistantMessage) {
        let sse = Sse::new(ByteSource::from_chunks(chunks));
        let mut resp = pin!(OpenAiResponse::from_sse(sse));
        let mut events = Vec::new();
        while let Some(event) = poll_fn(|cx| resp.as_mut().poll_next_event(cx))
            .await
            .unwrap()
        {
            events.push(event);
        }
        let msg = resp.take_assistant_message();
        (events, msg)
    }

    #[tokio::test]
    async fn test_text_only_response() {
        let chunks = vec![
            data_event(&json!({
                "id": "c1",
                "choices": [{ "delta": { "content": "Hel" } }]
            })),
            data_event(&json!({
                "id": "c1",
                "choices": [{ "delta": { "content": "lo" } }]
            })),
            data_event(&json!({
                "id": "c1",
                "choices": [{ "delta": {}, "finish_reason": "stop" }]
            })),
            Bytes::from_static(b"data: [DONE]\n\n"),
        ];
        let (events, msg) = collect(chunks).await;
        assert_eq!(
            events,
            vec![
                ResponseEvent::MessageDelta("Hel".to_owned()),
                ResponseEvent::MessageDelta("lo".to_owned()),
                ResponseEvent::Completed(FinishReason::Stop),
            ]
        );
        assert_eq!(msg.content, "Hello");
        assert!(msg.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn test_tool_call_fragments_merge() {
        let chunks = vec![
            data_event(&json!({
                "id": "c1",
                "choices": [{ "delta": { "tool_calls": [{
                    "index": 0,
                    "id": "call:1",
                    "type": "function",
                    "function": { "name": "search", "arguments": "{\"que" }
                }] } }]
            })),
            data_event(&json!({
                "id": "c1",
                "choices": [{ "delta": { "tool_calls": [{
                    "index": 0,
                    "function": { "arguments": "ry\":\"rust\"}" }
                }] } }]
            })),
            data_event(&json!({
                "id": "c1",
                "choices": [{ "delta": {}, "finish_reason": "tool_calls" }]
            })),
            Bytes::from_static(b"data: [DONE]\n\n"),
        ];
        let (events, msg) = collect(chunks).await;
        assert_eq!(
            events,
            vec![
                ResponseEvent::ToolCall(ToolCallRequest {
                    id: "call:1".to_owned(),
                    name: "search".to_owned(),
                    arguments: json!({ "query": "rust" }),
                }),
                ResponseEvent::Completed(FinishReason::ToolCalls),
            ]
        );
        assert_eq!(msg.tool_calls.len(), 1);
    }

    #[tokio::test]
    async fn test_chunk_id_mismatch_is_an_error() {
        let chunks = vec![
            data_event(&json!({
                "id": "c1",
                "choices": [{ "delta": { "content": "a" } }]
            })),
            data_event(&json!({
                "id": "c2",
                "choices": [{ "delta": { "content": "b" } }]
            })),
        ];
        let sse = Sse::new(ByteSource::from_chunks(chunks));
        let mut resp = pin!(OpenAiResponse::from_sse(sse));
        let first = poll_fn(|cx| resp.as_mut().poll_next_event(cx))
            .await
            .unwrap();
        assert_eq!(first, Some(ResponseEvent::MessageDelta("a".to_owned())));
        let second = poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await;
        assert!(second.is_err());
    }
}
