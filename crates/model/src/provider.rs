use crate::error::ProviderError;
use crate::message::ModelRequest;
use crate::response::ModelResponse;

/// A chat-completion backend.
///
/// Providers should behave like stateless objects: creating one is
/// cheap, and callers may drop and recreate them at any time. Any
/// connection pooling or retry logic lives behind this trait.
pub trait ChatProvider: Send + Sync {
    /// The error type that requests may fail with.
    type Error: ProviderError;

    /// The streaming response type for this provider.
    type Response: ModelResponse<Error = Self::Error>;

    /// Sends a request to the model.
    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static;
}

/// A text-embedding backend.
pub trait EmbeddingProvider: Send + Sync {
    /// The error type that requests may fail with.
    type Error: ProviderError;

    /// Embeds a batch of texts.
    ///
    /// The returned vectors are in the same order as the inputs, and
    /// all vectors produced by one provider have the same dimension.
    fn embed(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, Self::Error>> + Send + 'static;
}
