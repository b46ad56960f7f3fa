//! Error types for the oracle boundary.

use thiserror::Error;

/// Failures at the language-model seam.
///
/// `Parse` is the important one: a reply that is not valid JSON of the
/// expected shape is a total extraction failure, handled exactly like a
/// validation rejection downstream (fail closed, do not guess the intended
/// structure).
#[derive(Debug, Error)]
pub enum OracleError {
    /// Configuration missing or malformed (API key, URL).
    #[error("Oracle configuration error: {0}")]
    Config(String),

    /// Transport-level failure: connect error, timeout, TLS.
    #[error("Oracle transport error: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status.
    #[error("Oracle API error (status {status}): {body}")]
    Api { status: u16, body: String },

    /// The reply had no content, or the content was not parseable as the
    /// expected extraction shape.
    #[error("Oracle reply not parseable: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for OracleError {
    fn from(err: reqwest::Error) -> Self {
        OracleError::Transport(err.to_string())
    }
}

/// Result type for oracle operations.
pub type OracleResult<T> = Result<T, OracleError>;
