//! Error taxonomy for the security core.
//!
//! Authentication and CSRF failures are handled entirely inside the core
//! (session mutation plus a redirect decision); only infrastructure failures
//! propagate to a generic error response.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Bad username or password. Surfaced to the user as a generic login
    /// failure; the variant never reveals which field was wrong.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The credential store could not be consulted. Kept distinct from
    /// `InvalidCredentials` so a backend outage is never misreported as a
    /// wrong password.
    #[error("credential store unavailable")]
    Store(#[source] anyhow::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CsrfError {
    /// Forged or stale state-changing request. Handled like an authorization
    /// denial, never as a form-validation error, and never retried.
    #[error("csrf token missing or mismatched")]
    TokenMismatch,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    /// Insufficient role for the requested operation.
    #[error("insufficient role for {target}")]
    Denied { target: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_credentials_message_is_generic() {
        // The message must not hint at which of the two fields failed.
        let message = AuthError::InvalidCredentials.to_string();
        assert_eq!(message, "invalid username or password");
    }

    #[test]
    fn store_error_keeps_its_cause() {
        use std::error::Error as _;
        let err = AuthError::Store(anyhow::anyhow!("connection refused"));
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "credential store unavailable");
    }
}
