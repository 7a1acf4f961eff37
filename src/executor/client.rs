//! Command executor — sends a normalized command to a provider's endpoint
//! and drives queued executions to completion via the job poller.

use std::sync::Arc;

use crate::dispatch::types::CommandRequest;

use super::errors::ExecError;
use super::poller::{poll_to_completion, CancelFlag, PollPolicy, Sleeper, TokioSleeper};
use super::transport::RemoteTransport;
use super::types::{CommandEnvelope, ExecOutcome};

/// Executes commands against a provider's remote endpoint.
///
/// Detects synchronous vs. queued execution from the response shape. Queued
/// commands are polled sequentially — one in-flight poll at a time — until
/// they reach a terminal state.
pub struct CommandExecutor {
    transport: Arc<dyn RemoteTransport>,
    poll: PollPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl CommandExecutor {
    /// Create an executor over the given transport with a poll policy.
    pub fn new(transport: Arc<dyn RemoteTransport>, poll: PollPolicy) -> Self {
        Self {
            transport,
            poll,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the sleep implementation (tests inject a recording sleeper).
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Execute a command request and return the raw result payload.
    ///
    /// The request is not mutated here; a refresh-retry builds a new request
    /// upstream and calls `execute` again.
    pub async fn execute(
        &self,
        endpoint: &str,
        request: &CommandRequest,
        cancel: &CancelFlag,
    ) -> Result<serde_json::Value, ExecError> {
        if cancel.is_cancelled() {
            return Err(ExecError::Cancelled);
        }

        let envelope = CommandEnvelope {
            provider: request.provider.clone(),
            api_key: request.token.clone(),
            prompt: request.raw_input.clone(),
            command: request.command.clone(),
            context: serde_json::json!({}),
            metadata: request.params.clone(),
        };

        let outcome = self
            .transport
            .dispatch(endpoint, &request.token, request.command_id, &envelope)
            .await?;

        match outcome {
            ExecOutcome::Completed(value) => {
                tracing::debug!(
                    provider = %request.provider,
                    command = %request.command,
                    "command completed synchronously"
                );
                Ok(value)
            }
            ExecOutcome::Queued(ack) => {
                poll_to_completion(
                    self.transport.as_ref(),
                    endpoint,
                    &request.token,
                    ack,
                    &self.poll,
                    self.sleeper.as_ref(),
                    cancel,
                )
                .await
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
