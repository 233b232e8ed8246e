use std::error::Error;

/// Broad classification of provider failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request was rejected by a content filter.
    Moderated,
    /// The provider is rate limiting us.
    RateLimitExceeded,
    /// Any other failure (network, protocol, server).
    Other,
}

/// The error type a model provider may return.
pub trait ProviderError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}
