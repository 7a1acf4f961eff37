//! Executor error types.

use thiserror::Error;

use super::types::ErrorCode;

/// Errors that can occur while executing a command against a remote endpoint.
#[derive(Debug, Error)]
pub enum ExecError {
    /// Transport failure — the request never produced a response.
    #[error("network failure: {reason}")]
    Network {
        reason: String,
    },

    /// Non-2xx response carrying a structured error envelope.
    #[error("provider error [{code}]: {message}")]
    Remote {
        code: ErrorCode,
        message: String,
    },

    /// Non-2xx response without a usable envelope.
    #[error("server error (HTTP {status}): {message}")]
    Server {
        status: u16,
        message: String,
    },

    /// A queued job reached a terminal state with an error payload.
    #[error("job '{job_id}' failed: {message}")]
    JobFailed {
        job_id: String,
        message: String,
    },

    /// The endpoint replied with a body that violates the protocol
    /// (e.g. `done:true` with neither result nor error).
    #[error("malformed response: {reason}")]
    MalformedResponse {
        reason: String,
    },

    /// The caller cancelled the command mid-flight.
    #[error("command cancelled")]
    Cancelled,

    /// Polling stopped after the configured maximum attempt count.
    #[error("job polling gave up after {attempts} attempts")]
    PollBudgetExhausted {
        attempts: u32,
    },
}

impl ExecError {
    /// The taxonomy code this error surfaces as.
    pub fn code(&self) -> ErrorCode {
        match self {
            ExecError::Network { .. } => ErrorCode::Network,
            ExecError::Remote { code, .. } => *code,
            ExecError::Server { .. }
            | ExecError::JobFailed { .. }
            | ExecError::MalformedResponse { .. }
            | ExecError::PollBudgetExhausted { .. } => ErrorCode::Server,
            ExecError::Cancelled => ErrorCode::UserInput,
        }
    }

    /// Whether the provider rejected the credential — the one failure the
    /// dispatcher recovers from locally (single refresh-and-retry).
    pub fn is_auth_expired(&self) -> bool {
        matches!(
            self,
            ExecError::Remote {
                code: ErrorCode::AuthExpired,
                ..
            }
        )
    }
}
