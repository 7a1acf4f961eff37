//! CommandHub — chat command dispatch core.
//!
//! Turns free-form or slash-prefixed chat input into validated, authenticated
//! calls against third-party provider endpoints, handles synchronous and
//! job-queued execution, and renders heterogeneous responses back into one
//! readable message. The pipeline is owned by a single [`Dispatcher`] per
//! session; the UI, OAuth consent flows, and provider business logic live
//! outside this crate.

pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod executor;
pub mod providers;
pub mod render;

use std::sync::Arc;

pub use config::DispatchConfig;
pub use dispatch::{
    CommandRequest, CommandResult, Dispatcher, DispatchError, DispatchOutcome, EventSink,
    TracingSink,
};
pub use executor::{CancelFlag, ErrorCode, HttpTransport};
pub use providers::{ProviderDescriptor, ProviderRegistry};

/// Return the platform-standard data directory for CommandHub.
///
/// - macOS: `~/Library/Application Support/com.cmdhub.app/`
/// - Windows: `{FOLDERID_RoamingAppData}\cmdhub\`
/// - Linux: `$XDG_DATA_HOME/com.cmdhub.app/` (fallback `~/.local/share/...`)
///
/// Falls back to `~/.cmdhub/` only if none of the above can be resolved.
pub fn data_dir() -> std::path::PathBuf {
    if let Some(dir) = dirs::data_dir() {
        return dir.join("com.cmdhub.app");
    }
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".cmdhub")
}

/// Initialize the tracing subscriber for embedding applications.
///
/// Honors `RUST_LOG`; defaults to `cmdhub=info,warn`. Safe to call once at
/// startup, before the first dispatch.
pub fn init_tracing() {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cmdhub=info,warn"));

    fmt::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = std::process::id(),
        "=== CommandHub dispatch core initialized ==="
    );
}

/// Build a dispatcher wired to the default collaborators: HTTP transport,
/// SQLite credential store in the platform data dir, tracing event sink.
pub fn default_dispatcher(config: &DispatchConfig) -> Result<Dispatcher, DispatchError> {
    let transport = Arc::new(HttpTransport::new().map_err(DispatchError::Exec)?);
    let store = Arc::new(
        credentials::SqliteCredentialStore::open_default()
            .map_err(DispatchError::from)?,
    );
    Ok(Dispatcher::new(config, store, transport, Arc::new(TracingSink)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_dir_is_absolute() {
        assert!(data_dir().is_absolute());
    }
}
