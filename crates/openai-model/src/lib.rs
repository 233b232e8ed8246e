//! Chat and embedding providers for OpenAI-compatible APIs.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use backoff::ExponentialBackoff;
use mime::Mime;
use ravel_model::{
    ChatProvider, EmbeddingProvider, ErrorKind, ModelRequest, ProviderError,
};
use reqwest::{Client, Response, StatusCode, header};

pub use config::{OpenAiConfig, OpenAiConfigBuilder};
use io::{ByteSource, Sse};
use response::OpenAiResponse;

/// Error type for [`OpenAiProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

fn http_error(err: &reqwest::Error) -> Error {
    let kind = match err.status() {
        Some(StatusCode::TOO_MANY_REQUESTS) => ErrorKind::RateLimitExceeded,
        _ => ErrorKind::Other,
    };
    Error::new(format!("{err}"), kind)
}

/// A provider backed by an OpenAI-compatible HTTP API.
///
/// One instance serves both chat completions (streamed over SSE) and
/// the embeddings endpoint.
#[derive(Clone, Debug)]
pub struct OpenAiProvider {
    client: Client,
    config: Arc<OpenAiConfig>,
}

impl OpenAiProvider {
    /// Creates a new provider with the given configuration.
    #[inline]
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl ChatProvider for OpenAiProvider {
    type Error = Error;
    type Response = OpenAiResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let payload = proto::chat_request(req, &self.config);
        let resp_fut = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.config.api_key),
            )
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "text/event-stream")
            .json(&payload)
            .send();

        async move {
            let resp = match resp_fut.await.and_then(Response::error_for_status)
            {
                Ok(resp) => resp,
                Err(err) => return Err(http_error(&err)),
            };

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_event_stream = content_type
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| {
                    m.type_() == mime::TEXT && m.subtype() == "event-stream"
                })
                .unwrap_or(false);
            if !is_event_stream {
                return Err(Error::new(
                    format!("unexpected content type: {content_type:?}"),
                    ErrorKind::Other,
                ));
            }

            let sse = Sse::new(ByteSource::from_response(resp));
            Ok(OpenAiResponse::from_sse(sse))
        }
    }
}

impl EmbeddingProvider for OpenAiProvider {
    type Error = Error;

    fn embed(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, Self::Error>> + Send + 'static
    {
        let client = self.client.clone();
        let config = Arc::clone(&self.config);
        let payload = proto::embedding_request(texts, &config);

        async move {
            // Embedding batches are idempotent, retry the transient
            // failures with an exponential backoff.
            let resp = backoff::future::retry(
                ExponentialBackoff::default(),
                || async {
                    let result = client
                        .post(format!("{}/embeddings", config.base_url))
                        .header(
                            header::AUTHORIZATION,
                            format!("Bearer {}", config.api_key),
                        )
                        .header(header::CONTENT_TYPE, "application/json")
                        .json(&payload)
                        .send()
                        .await
                        .and_then(Response::error_for_status);
                    match result {
                        Ok(resp) => Ok(resp),
                        Err(err) => {
                            let mapped = http_error(&err);
                            if err.is_connect() || err.is_timeout() {
                                warn!("retrying embedding request: {err}");
                                Err(backoff::Error::transient(mapped))
                            } else {
                                Err(backoff::Error::permanent(mapped))
                            }
                        }
                    }
                },
            )
            .await?;

            let body: proto::EmbeddingResponse = resp
                .json()
                .await
                .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;
            Ok(proto::collect_embeddings(body))
        }
    }
}
