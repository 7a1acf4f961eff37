//! Dispatch error types.
//!
//! Every pipeline failure converges on `DispatchError`, which knows both its
//! taxonomy code and the single readable line shown to the user. Raw error
//! objects never reach the chat surface.

use thiserror::Error;

use crate::credentials::CredentialError;
use crate::executor::{ErrorCode, ExecError};

/// Errors that can occur across the dispatch pipeline.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Nothing in the input matched a rule and no default provider exists.
    #[error("no command recognized in input")]
    NoIntent,

    /// Slash-prefixed input naming a provider that isn't registered.
    #[error("unknown provider marker '/{marker}'")]
    UnknownProvider {
        marker: String,
    },

    /// A second submission arrived while one was in flight.
    #[error("another command is already in flight")]
    Busy,

    /// The input was recognized but malformed (e.g. a bare provider marker).
    #[error("invalid command: {reason}")]
    Invalid {
        reason: String,
    },

    /// No credential on file for the resolved provider.
    #[error("no credential on file for '{provider}'")]
    MissingCredential {
        provider: String,
    },

    /// The credential lapsed and could not be renewed.
    #[error("credential refresh failed for '{provider}': {reason}")]
    RefreshFailed {
        provider: String,
        reason: String,
    },

    /// The credential store itself failed.
    #[error("credential store error: {reason}")]
    CredentialStore {
        reason: String,
    },

    /// Execution failed (network, provider error, job failure, …).
    #[error(transparent)]
    Exec(#[from] ExecError),
}

impl From<CredentialError> for DispatchError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::Missing { provider } => {
                DispatchError::MissingCredential { provider }
            }
            CredentialError::NoRefreshToken { provider } => DispatchError::RefreshFailed {
                reason: "no refresh token on file".into(),
                provider,
            },
            CredentialError::RefreshFailed { provider, reason } => {
                DispatchError::RefreshFailed { provider, reason }
            }
            CredentialError::Store { reason } => DispatchError::CredentialStore { reason },
        }
    }
}

impl DispatchError {
    /// The taxonomy code this failure surfaces as.
    pub fn code(&self) -> ErrorCode {
        match self {
            DispatchError::NoIntent
            | DispatchError::UnknownProvider { .. }
            | DispatchError::Busy
            | DispatchError::MissingCredential { .. } => ErrorCode::UserInput,
            DispatchError::Invalid { .. } => ErrorCode::Validation,
            DispatchError::RefreshFailed { .. } => ErrorCode::AuthExpired,
            DispatchError::CredentialStore { .. } => ErrorCode::Server,
            DispatchError::Exec(e) => e.code(),
        }
    }

    /// The one chat-style line shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            DispatchError::NoIntent => {
                "I couldn't match that to a command. Try /<provider> <command>.".into()
            }
            DispatchError::UnknownProvider { marker } => {
                format!("I don't know a provider called '{marker}'.")
            }
            DispatchError::Busy => {
                "Hold on — the previous command is still running.".into()
            }
            DispatchError::Invalid { reason } => {
                format!("That command looks incomplete: {reason}.")
            }
            DispatchError::MissingCredential { provider } => {
                format!("No account connected for {provider} — connect it first.")
            }
            DispatchError::RefreshFailed { provider, .. } => {
                format!("Your {provider} session expired and couldn't be renewed — please reconnect the account.")
            }
            DispatchError::CredentialStore { .. } => {
                "Something went wrong reading your saved credentials.".into()
            }
            DispatchError::Exec(e) => match e {
                ExecError::Network { .. } => {
                    "Couldn't reach the service — check your connection and try again.".into()
                }
                ExecError::Remote { code, message } => match code {
                    ErrorCode::AuthExpired => {
                        "Your session has expired — please reconnect the account.".into()
                    }
                    ErrorCode::RateLimit => {
                        "The service is rate-limiting requests — wait a moment and try again."
                            .into()
                    }
                    ErrorCode::Validation => {
                        format!("The service rejected the command: {message}")
                    }
                    _ => format!("The service reported an error: {message}"),
                },
                ExecError::Server { status, .. } => {
                    format!("The service returned an unexpected error (HTTP {status}).")
                }
                ExecError::JobFailed { message, .. } => {
                    format!("The job didn't complete: {message}")
                }
                ExecError::MalformedResponse { .. } => {
                    "The service sent back something I couldn't read.".into()
                }
                ExecError::Cancelled => "The command was cancelled.".into(),
                ExecError::PollBudgetExhausted { .. } => {
                    "Gave up waiting for the job to finish.".into()
                }
            },
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
