//! Search error type

use thiserror::Error;

/// Errors raised by search providers
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("provider returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("could not parse provider response: {0}")]
    Parse(String),

    #[error("search cancelled")]
    Cancelled,
}
