//! Job poller — drives a queued command to its terminal state.
//!
//! Polling is an explicit iterative loop (never recursive) with a linearly
//! increasing, capped delay between status requests. The sleep is injected
//! so tests can observe the delay schedule without waiting, and every
//! iteration checks a cancellation flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::errors::ExecError;
use super::transport::RemoteTransport;
use super::types::QueuedAck;

// ─── Poll Policy ─────────────────────────────────────────────────────────────

/// Delay schedule and attempt budget for job polling.
///
/// `delay = min(base_delay + attempt * step, max_delay)`. With the defaults
/// that is 500ms, 700ms, 900ms, … capped at 5s. `max_attempts: None` polls
/// until the job reaches a terminal state.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub base_delay: Duration,
    pub step: Duration,
    pub max_delay: Duration,
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            step: Duration::from_millis(200),
            max_delay: Duration::from_millis(5000),
            max_attempts: None,
        }
    }
}

impl PollPolicy {
    /// The delay preceding poll number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = self.base_delay + self.step * attempt;
        delay.min(self.max_delay)
    }
}

// ─── Sleeper ─────────────────────────────────────────────────────────────────

/// Injected sleep so the poll loop is testable without real waiting.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by `tokio::time::sleep`.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// ─── Cancellation ────────────────────────────────────────────────────────────

/// Cooperative cancellation flag, checked before every poll.
///
/// Cloneable — hand one clone to the caller, keep one in the pipeline.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ─── JobHandle ───────────────────────────────────────────────────────────────

/// A live queued job. Exactly one exists per in-flight command; it is
/// consumed when the job reaches a terminal state.
#[derive(Debug, Clone)]
pub struct JobHandle {
    pub job_id: String,
    pub eta: Option<f64>,
    pub attempt: u32,
}

impl JobHandle {
    fn from_ack(ack: QueuedAck) -> Self {
        Self {
            job_id: ack.job_id,
            eta: ack.eta,
            attempt: 0,
        }
    }
}

// ─── Poll Loop ───────────────────────────────────────────────────────────────

/// Poll a queued job until `done`, returning its result payload.
///
/// Terminal conditions: a `done:true` status (result or error), the
/// cancellation flag, or the optional attempt budget. A `done:true` status
/// with neither result nor error is a protocol violation and surfaces as a
/// malformed-response error.
pub async fn poll_to_completion(
    transport: &dyn RemoteTransport,
    endpoint: &str,
    token: &str,
    ack: QueuedAck,
    policy: &PollPolicy,
    sleeper: &dyn Sleeper,
    cancel: &CancelFlag,
) -> Result<serde_json::Value, ExecError> {
    let mut handle = JobHandle::from_ack(ack);

    tracing::debug!(
        job_id = %handle.job_id,
        eta = ?handle.eta,
        "command queued, polling for completion"
    );

    loop {
        if cancel.is_cancelled() {
            return Err(ExecError::Cancelled);
        }

        if let Some(max) = policy.max_attempts {
            if handle.attempt >= max {
                return Err(ExecError::PollBudgetExhausted { attempts: max });
            }
        }

        sleeper.sleep(policy.delay_for(handle.attempt)).await;
        let status = transport.poll_job(endpoint, token, &handle.job_id).await?;
        handle.attempt += 1;

        if !status.done {
            continue;
        }

        if let Some(message) = status.error {
            return Err(ExecError::JobFailed {
                job_id: handle.job_id,
                message,
            });
        }

        return status.result.ok_or_else(|| ExecError::MalformedResponse {
            reason: format!(
                "job '{}' reported done with neither result nor error",
                handle.job_id
            ),
        });
    }
}

// ─── Test Double ─────────────────────────────────────────────────────────────


// ─── Tests ───────────────────────────────────────────────────────────────────
