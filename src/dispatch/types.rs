//! Shared types for the dispatch pipeline.

use serde::Serialize;
use uuid::Uuid;

use crate::executor::ErrorCode;

// ─── CommandRequest ──────────────────────────────────────────────────────────

/// One admitted user submission, fully resolved for execution.
///
/// Immutable once it enters the executor, with a single exception: the
/// refresh-retry builds a copy with the renewed token via [`with_token`].
///
/// [`with_token`]: CommandRequest::with_token
#[derive(Debug, Clone)]
pub struct CommandRequest {
    /// The user's input, verbatim.
    pub raw_input: String,
    /// Resolved provider id.
    pub provider: String,
    /// Canonical command slug sent to the endpoint.
    pub command: String,
    /// Structured parameters (sent as the envelope's `metadata`).
    pub params: serde_json::Value,
    /// Per-submission id, carried as the `x-command-id` header.
    pub command_id: Uuid,
    /// Bearer token for the provider.
    pub token: String,
}

impl CommandRequest {
    /// Copy of this request with a substituted token — the one permitted
    /// mutation, used for the single refresh-retry.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            token,
            ..self.clone()
        }
    }
}

// ─── CommandResult ───────────────────────────────────────────────────────────

/// Terminal artifact of a dispatch: the raw payload (when the command
/// reached the provider and succeeded) plus one readable chat-style line
/// or listing. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResult {
    /// The provider's raw result payload. Absent on failure.
    pub raw: Option<serde_json::Value>,
    /// What the user sees. Never a raw error object.
    pub display_text: String,
    /// Failure classification; absent on success.
    pub error: Option<ErrorCode>,
}

impl CommandResult {
    /// Successful result with its rendered display text.
    pub fn ok(raw: serde_json::Value, display_text: String) -> Self {
        Self {
            raw: Some(raw),
            display_text,
            error: None,
        }
    }

    /// Failed result carrying a readable message.
    pub fn failure(code: ErrorCode, display_text: String) -> Self {
        Self {
            raw: None,
            display_text,
            error: Some(code),
        }
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }
}

// ─── DispatchOutcome ─────────────────────────────────────────────────────────

/// What happened to a submission.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// The submission was admitted and ran to a terminal result (success or
    /// readable failure).
    Completed(CommandResult),
    /// Identical input re-submitted within the duplicate window — silently
    /// dropped, no events fired.
    DroppedDuplicate,
}

impl DispatchOutcome {
    /// The terminal result, if the submission was not dropped.
    pub fn result(&self) -> Option<&CommandResult> {
        match self {
            DispatchOutcome::Completed(result) => Some(result),
            DispatchOutcome::DroppedDuplicate => None,
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_token_substitutes_only_the_token() {
        let request = CommandRequest {
            raw_input: "list my repos".into(),
            provider: "github".into(),
            command: "list-repos".into(),
            params: serde_json::json!({}),
            command_id: Uuid::new_v4(),
            token: "tok-old".into(),
        };

        let retried = request.with_token("tok-new".into());
        assert_eq!(retried.token, "tok-new");
        assert_eq!(retried.command_id, request.command_id);
        assert_eq!(retried.command, request.command);
        assert_eq!(retried.raw_input, request.raw_input);
    }

    #[test]
    fn test_result_constructors() {
        let ok = CommandResult::ok(serde_json::json!([1]), "1. one".into());
        assert!(!ok.is_err());
        assert!(ok.raw.is_some());

        let failed = CommandResult::failure(ErrorCode::Network, "offline".into());
        assert!(failed.is_err());
        assert!(failed.raw.is_none());
        assert_eq!(failed.error, Some(ErrorCode::Network));
    }
}
