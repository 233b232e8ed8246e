use std::error::Error as StdError;
use std::fmt::{self, Display};

use ravel_model::ProviderError;

/// Error building or running the retrieval pipeline.
#[derive(Debug)]
pub enum Error {
    /// Fetching the source document failed.
    Http(reqwest::Error),
    /// The CSS selector used to filter the document is invalid.
    InvalidSelector(String),
    /// The loaded document had no extractable text.
    EmptyDocument,
    /// The embedding or chat provider failed.
    Provider(Box<dyn ProviderError>),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(err) => write!(f, "fetch document: {err}"),
            Error::InvalidSelector(selector) => {
                write!(f, "invalid CSS selector: `{selector}`")
            }
            Error::EmptyDocument => {
                write!(f, "the document has no extractable text")
            }
            Error::Provider(err) => write!(f, "model provider: {err}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Http(err) => Some(err),
            Error::Provider(err) => {
                Some(err.as_ref() as &(dyn StdError + 'static))
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    #[inline]
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err)
    }
}

impl From<Box<dyn ProviderError>> for Error {
    #[inline]
    fn from(err: Box<dyn ProviderError>) -> Self {
        Error::Provider(err)
    }
}
