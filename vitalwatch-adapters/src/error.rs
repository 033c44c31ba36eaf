//! Error types for gateways.

use thiserror::Error;

/// Errors that can occur when querying a clinical data source.
///
/// "No observations of this kind" is not an error: observation queries
/// return an empty list for that case.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The requested practitioner or patient does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound(_))
    }
}

impl From<tokio::time::error::Elapsed> for GatewayError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        GatewayError::Timeout
    }
}

#[cfg(feature = "fhir")]
impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else if err.is_connect() {
            GatewayError::Connection(err.to_string())
        } else if err.is_decode() {
            GatewayError::Parse(err.to_string())
        } else {
            GatewayError::Http(err.to_string())
        }
    }
}
