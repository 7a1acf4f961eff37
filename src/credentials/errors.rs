//! Credential error types.

use thiserror::Error;

/// Errors that can occur during credential resolution and refresh.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// No credential exists for the provider, locally or in the store.
    #[error("no credential on file for '{provider}'")]
    Missing {
        provider: String,
    },

    /// The backing store failed to read or write.
    #[error("credential store error: {reason}")]
    Store {
        reason: String,
    },

    /// A refresh was required but the record carries no refresh token.
    #[error("credential for '{provider}' has no refresh token")]
    NoRefreshToken {
        provider: String,
    },

    /// The refresh call itself failed.
    #[error("refresh failed for '{provider}': {reason}")]
    RefreshFailed {
        provider: String,
        reason: String,
    },
}

impl From<rusqlite::Error> for CredentialError {
    fn from(e: rusqlite::Error) -> Self {
        CredentialError::Store {
            reason: e.to_string(),
        }
    }
}
