//! OpenID relying-party error types.

use thiserror::Error;

/// Errors surfaced by discovery, request construction and callback
/// verification.
///
/// A rejected or replayed assertion is not an error; it is reported as
/// `Verification { ok: false, .. }`.
#[derive(Debug, Error)]
pub enum OpenIdError {
    /// Fetching or parsing the discovery document failed
    #[error("Discovery failed: {0}")]
    Discovery(String),

    /// A supplied or composed URL is malformed
    #[error("Invalid URL: {0}")]
    Url(String),

    /// The direct-verification response carried an unexpected namespace
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Network failure on an outbound call
    #[error("Transport error: {0}")]
    Transport(String),

    /// The inbound callback carried malformed form data
    #[error("Malformed form data: {0}")]
    FormParse(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<url::ParseError> for OpenIdError {
    fn from(err: url::ParseError) -> Self {
        OpenIdError::Url(err.to_string())
    }
}

/// Result type for OpenID operations
pub type Result<T> = std::result::Result<T, OpenIdError>;
