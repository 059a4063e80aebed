use crate::{ConfigError, TransportError};

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum QaError {
    /// Endpoint configuration problem, detected before any request is sent.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Question or context is blank.
    #[error("Please provide both context and question.")]
    EmptyInput,
    /// Network, timeout or body read failure. Never retried.
    #[error("Request failed: {0}")]
    Transport(TransportError),
    /// The response body could not be decoded.
    #[error("Parse error: {message}")]
    Parse { status: u16, message: String },
    /// Non-retryable HTTP status with the upstream message when available.
    #[error("{message}")]
    Remote { status: u16, message: String },
    /// Every attempt hit a retryable status.
    #[error("Max retries exceeded")]
    RetriesExhausted { attempts: usize },
}

impl QaError {
    /// HTTP status tied to the failure, if a response was received and
    /// the failure was terminal for that response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Parse { status, .. } | Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` when the transport failed because the request timed out.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport(err) => err
                .downcast_ref::<reqwest::Error>()
                .is_some_and(reqwest::Error::is_timeout),
            _ => false,
        }
    }
}
