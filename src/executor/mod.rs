//! Command execution against provider remote endpoints.
//!
//! This module handles:
//! - The uniform bridge wire protocol (dispatch, job status, catalog, refresh)
//! - Synchronous vs. queued execution detection
//! - Iterative job polling with capped backoff, cancellation, and an
//!   optional attempt budget
//! - Mapping transport and envelope failures into the error taxonomy

pub mod client;
pub mod errors;
pub mod poller;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use client::CommandExecutor;
pub use errors::ExecError;
pub use poller::{CancelFlag, JobHandle, PollPolicy, Sleeper, TokioSleeper};
pub use transport::{HttpTransport, RemoteTransport};
pub use types::{CommandEnvelope, ErrorCode, ExecOutcome, JobStatus, QueuedAck};
