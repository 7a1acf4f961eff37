//! Provider registry — catalog of known providers and their command lists.
//!
//! The registry is read-shared across the dispatch pipeline (classifier
//! marker checks, normalizer variant matching) and mutated only under the
//! concurrency guard: appending catalog entries and recording the
//! once-per-session catalog fetch state.

use std::collections::HashMap;
use std::sync::RwLock;

use super::types::ProviderDescriptor;

/// Default bridge gateway; per-provider endpoints hang off it as
/// `{gateway}/{provider_id}`. Overridable per provider via config.
pub const DEFAULT_GATEWAY_URL: &str = "https://gateway.cmdhub.dev";

// ─── Registry ────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct RegistryInner {
    /// Declaration-ordered provider list. Order is observable (marker
    /// checks, seeding) and preserved across mutation.
    providers: Vec<ProviderDescriptor>,
    /// Catalog fetch state per provider id: absent = never attempted this
    /// session, `true` = fetched and live, `false` = attempted and failed.
    catalog_state: HashMap<String, bool>,
}

/// Thread-safe provider catalog.
///
/// Reads are concurrent; writes are serialized by the dispatch guard, so the
/// lock is effectively uncontended.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    inner: RwLock<RegistryInner>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with the built-in provider table.
    pub fn builtin() -> Self {
        let registry = Self::new();
        for descriptor in builtin_providers() {
            registry.register(descriptor);
        }
        registry
    }

    /// Register a provider. A descriptor with an existing id replaces the
    /// previous entry in place (order preserved).
    pub fn register(&self, descriptor: ProviderDescriptor) {
        let mut inner = self.write();
        match inner.providers.iter_mut().find(|p| p.id == descriptor.id) {
            Some(existing) => *existing = descriptor,
            None => inner.providers.push(descriptor),
        }
    }

    /// Look up a provider by id.
    pub fn get(&self, id: &str) -> Option<ProviderDescriptor> {
        self.read().providers.iter().find(|p| p.id == id).cloned()
    }

    /// Whether a provider id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.read().providers.iter().any(|p| p.id == id)
    }

    /// All provider ids in declaration order.
    pub fn provider_ids(&self) -> Vec<String> {
        self.read().providers.iter().map(|p| p.id.clone()).collect()
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.read().providers.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.read().providers.is_empty()
    }

    // ─── Command Catalog ────────────────────────────────────────────────

    /// Append commands to a provider's known list, deduplicated,
    /// order-preserving. Returns how many entries were actually added.
    pub fn extend_known_commands(&self, id: &str, commands: Vec<String>) -> usize {
        let mut inner = self.write();
        let Some(provider) = inner.providers.iter_mut().find(|p| p.id == id) else {
            return 0;
        };

        let mut added = 0;
        for command in commands {
            if !provider.known_commands.contains(&command) {
                provider.known_commands.push(command);
                added += 1;
            }
        }
        if added > 0 {
            tracing::debug!(provider = id, added, "extended known command list");
        }
        added
    }

    /// Whether a catalog fetch should be attempted for this provider —
    /// true only if none has been attempted this session.
    pub fn needs_catalog_fetch(&self, id: &str) -> bool {
        !self.read().catalog_state.contains_key(id)
    }

    /// Record the outcome of a catalog fetch attempt. One attempt per
    /// provider per session, success or not.
    pub fn mark_catalog_fetched(&self, id: &str, success: bool) {
        self.write().catalog_state.insert(id.to_string(), success);
    }

    /// The provider's command list, only when a live catalog backs it.
    ///
    /// Returns `None` when no successful fetch has happened this session —
    /// the normalizer then keeps its candidate slug untouched.
    pub fn live_commands(&self, id: &str) -> Option<Vec<String>> {
        let inner = self.read();
        if inner.catalog_state.get(id) != Some(&true) {
            return None;
        }
        inner
            .providers
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.known_commands.clone())
    }

    // ─── Lock Helpers ───────────────────────────────────────────────────

    fn read(&self) -> std::sync::RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, RegistryInner> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ─── Built-in Providers ──────────────────────────────────────────────────────

/// The seed provider table: id, display name, endpoint, starter commands.
///
/// Declaration order is observable — the intent rule table and tests rely
/// on it. Starter commands are the historically stable slugs; the live
/// catalog extends them at runtime.
fn builtin_providers() -> Vec<ProviderDescriptor> {
    let gw = DEFAULT_GATEWAY_URL;
    vec![
        ProviderDescriptor::new(
            "github",
            "GitHub",
            &format!("{gw}/github"),
            &["list-repos", "list-issues", "create-issue", "list-pulls"],
        ),
        ProviderDescriptor::new(
            "gitlab",
            "GitLab",
            &format!("{gw}/gitlab"),
            &["list-projects", "list-issues"],
        ),
        ProviderDescriptor::new(
            "drive",
            "Google Drive",
            &format!("{gw}/drive"),
            &["list", "list-files", "search-files", "share-file"],
        ),
        ProviderDescriptor::new(
            "dropbox",
            "Dropbox",
            &format!("{gw}/dropbox"),
            &["list-files", "search-files"],
        ),
        ProviderDescriptor::new(
            "mail",
            "Mail",
            &format!("{gw}/mail"),
            &["list-inbox", "search-mail", "send-mail"],
        ),
        ProviderDescriptor::new(
            "calendar",
            "Calendar",
            &format!("{gw}/calendar"),
            &["list-events", "create-event"],
        ),
        ProviderDescriptor::new(
            "automate",
            "Automation",
            &format!("{gw}/automate"),
            &["run-automation", "list-automations"],
        ),
        ProviderDescriptor::new(
            "openai",
            "OpenAI",
            &format!("{gw}/openai"),
            &["prompt"],
        ),
    ]
}

// ─── Tests ───────────────────────────────────────────────────────────────────
