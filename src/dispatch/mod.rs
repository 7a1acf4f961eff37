//! The command dispatch pipeline.
//!
//! Submodules:
//! - `dispatcher`: the session-scoped service owning the whole pipeline
//! - `intent`: ordered rule table mapping raw text to (provider, phrase)
//! - `normalize`: phrase → canonical slug, with live-catalog variants
//! - `guard`: single-flight admission and duplicate suppression
//! - `events`: lifecycle signaling with structural start/terminal pairing
//! - `errors`: the dispatch error taxonomy and user-facing messages
//! - `types`: CommandRequest / CommandResult / DispatchOutcome

pub mod dispatcher;
pub mod errors;
pub mod events;
pub mod guard;
pub mod intent;
pub mod normalize;
pub mod types;

// Re-exports for convenience
pub use dispatcher::Dispatcher;
pub use errors::DispatchError;
pub use events::{EventSink, LifecycleSpan, NullSink, TracingSink};
pub use guard::{Admission, SubmissionGuard};
pub use intent::{classify, Intent};
pub use normalize::{canonical_slug, normalize_command, slug_variants};
pub use types::{CommandRequest, CommandResult, DispatchOutcome};
