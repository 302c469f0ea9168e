//! Global application error types.
//!
//! This module defines the error taxonomy shared by the node connection,
//! the invoice service and the LNURL-pay handler, plus the typed startup
//! error returned to the process entry point.

use thiserror::Error;

/// Represents errors that can occur while talking to the Lightning node or
/// while handling requests on its behalf.
#[derive(Debug, Error)]
pub enum LightningError {
    /// Credential material is missing or could not be read.
    #[error("Config error: {0}")]
    ConfigError(String),
    /// Certificate or macaroon bytes could not be parsed.
    #[error("Auth error: {0}")]
    AuthError(String),
    /// The transport-level dial to the node failed.
    #[error("Node connection error: {0}")]
    ConnectionError(String),
    /// Malformed client input, e.g. a payment hash that is not 32 hex bytes.
    #[error("Decode error: {0}")]
    DecodeError(String),
    /// The node rejected or failed a call.
    #[error("Remote error: {0}")]
    RemoteError(String),
    /// Input outside of the accepted bounds.
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl LightningError {
    /// Whether this error can only happen while establishing the connection.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LightningError::ConfigError(_)
                | LightningError::AuthError(_)
                | LightningError::ConnectionError(_)
        )
    }
}

/// Failures that abort process startup. `main` decides how to terminate.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to load configuration: {0:#}")]
    Config(#[from] anyhow::Error),

    #[error("Failed to initialize LND client: {0}")]
    Node(#[from] LightningError),

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(LightningError::ConfigError("missing".into()).is_fatal());
        assert!(LightningError::AuthError("bad macaroon".into()).is_fatal());
        assert!(LightningError::ConnectionError("refused".into()).is_fatal());
        assert!(!LightningError::DecodeError("odd length".into()).is_fatal());
        assert!(!LightningError::RemoteError("unavailable".into()).is_fatal());
        assert!(!LightningError::ValidationError("too small".into()).is_fatal());
    }

    #[test]
    fn test_startup_error_wraps_node_error() {
        let err: StartupError = LightningError::AuthError("not a macaroon".into()).into();
        assert_eq!(
            err.to_string(),
            "Failed to initialize LND client: Auth error: not a macaroon"
        );
    }
}
