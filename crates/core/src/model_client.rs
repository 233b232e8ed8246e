use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use ravel_model::{
    AssistantMessage, ChatProvider, FinishReason, ModelRequest, ModelResponse,
    ProviderError, ResponseEvent,
};
use tracing::Instrument;

type SendResult = Result<ClientResponse, Box<dyn ProviderError>>;
type BoxedSendFuture = Pin<Box<dyn Future<Output = SendResult> + Send>>;
#[rustfmt::skip]
type HandlerFn = Arc<
    dyn Fn(ModelRequest, Box<dyn Fn(&str) + Send>)
        -> BoxedSendFuture + Send + Sync
>;

/// A type-erased wrapper around a chat provider.
///
/// The loops in this crate don't want a generic parameter for the
/// provider, so the concrete type is erased into a handler closure at
/// construction time.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    /// Wraps a provider.
    #[inline]
    pub fn new<P: ChatProvider + 'static>(provider: P) -> Self {
        let handler_fn: HandlerFn = Arc::new(move |req, on_delta| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("sending request: {req:?}");
                    let resp_or_err = fut.await;
                    drain_response::<P>(resp_or_err, on_delta).await
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request and collects the streamed response, passing each
    /// text fragment to `on_delta` as it arrives.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. The response stops streaming further
    /// events when this operation is cancelled.
    #[inline]
    pub async fn send_request(
        &self,
        req: ModelRequest,
        on_delta: impl Fn(&str) + Send + 'static,
    ) -> SendResult {
        (self.handler_fn)(req, Box::new(on_delta)).await
    }
}

/// A fully collected response from the model client.
#[derive(Clone, Debug)]
pub struct ClientResponse {
    /// The assistant message, including any tool call requests.
    pub message: AssistantMessage,
    /// The reason the model finished generating, if it reported one.
    pub finish_reason: Option<FinishReason>,
}

async fn drain_response<P: ChatProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
    on_delta: Box<dyn Fn(&str) + Send>,
) -> SendResult {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("request failed: {err}");
            return Err(Box::new(err));
        }
    };

    let mut finish_reason = None;
    let mut pinned_resp = pin!(resp);
    loop {
        let event_or_err =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx)).await;
        let event = match event_or_err {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(err) => {
                error!("response stream failed: {err}");
                return Err(Box::new(err));
            }
        };
        trace!("got an event: {event:?}");

        match event {
            ResponseEvent::MessageDelta(delta) => on_delta(&delta),
            ResponseEvent::ToolCall(_) => {
                // Collected by the response itself; surfaced via the
                // assistant message below.
            }
            ResponseEvent::Completed(reason) => {
                finish_reason = Some(reason);
            }
        }
    }

    let message = pinned_resp.take_assistant_message();
    Ok(ClientResponse {
        message,
        finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use ravel_model::ChatMessage;
    use ravel_test_model::{PresetResponse, ScriptedProvider};

    use super::*;

    #[tokio::test]
    async fn test_send_request_streams_deltas() {
        let mut provider = ScriptedProvider::default();
        provider.add_user_turn();
        provider.add_assistant_turn(PresetResponse::with_events([
            ravel_test_model::PresetEvent::MessageDelta("How ".to_owned()),
            ravel_test_model::PresetEvent::MessageDelta("are ".to_owned()),
            ravel_test_model::PresetEvent::MessageDelta("you?".to_owned()),
        ]));

        let client = ModelClient::new(provider);
        let deltas = Arc::new(Mutex::new(Vec::<String>::new()));
        let resp = client
            .send_request(
                ModelRequest {
                    messages: vec![ChatMessage::user("Hi")],
                    tools: vec![],
                },
                {
                    let deltas = Arc::clone(&deltas);
                    move |delta| deltas.lock().unwrap().push(delta.to_owned())
                },
            )
            .await
            .unwrap();

        assert_eq!(resp.message.content, "How are you?");
        assert_eq!(resp.finish_reason, Some(FinishReason::Stop));
        assert_eq!(deltas.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let client = ModelClient::new(ScriptedProvider::default());
        let result = client
            .send_request(
                ModelRequest {
                    messages: vec![ChatMessage::user("Hi")],
                    tools: vec![],
                },
                |_| {},
            )
            .await;
        assert!(result.is_err());
    }
}
