use std::error::Error as StdError;
use std::fmt::{self, Display};

use ravel_model::ProviderError;

/// Error running one of the loops.
#[derive(Debug)]
pub enum RunError {
    /// The model provider failed.
    Provider(Box<dyn ProviderError>),
    /// The loop did not terminate within its step budget.
    StepLimitExceeded {
        /// The configured budget.
        limit: usize,
    },
    /// A team was started without any workers.
    NoWorkers,
}

impl Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Provider(err) => write!(f, "model provider: {err}"),
            RunError::StepLimitExceeded { limit } => {
                write!(f, "loop did not terminate within {limit} steps")
            }
            RunError::NoWorkers => {
                write!(f, "the team has no workers")
            }
        }
    }
}

impl StdError for RunError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            RunError::Provider(err) => {
                Some(err.as_ref() as &(dyn StdError + 'static))
            }
            RunError::StepLimitExceeded { .. } | RunError::NoWorkers => None,
        }
    }
}

impl From<Box<dyn ProviderError>> for RunError {
    #[inline]
    fn from(err: Box<dyn ProviderError>) -> Self {
        RunError::Provider(err)
    }
}
