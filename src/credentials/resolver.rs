//! Credential resolver — finds an active token for a provider, renewing
//! OAuth-style credentials when they lapse.
//!
//! Resolution order: session cache → external store → forced refresh (only
//! for records carrying a refresh token). On an AUTH_EXPIRED rejection from
//! the executor the dispatcher asks for exactly one refresh; a second
//! rejection surfaces unchanged.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::executor::RemoteTransport;
use crate::providers::ProviderDescriptor;

use super::errors::CredentialError;
use super::store::{CredentialRecord, CredentialStore};

/// Resolves and renews provider credentials.
pub struct CredentialResolver {
    store: Arc<dyn CredentialStore>,
    /// Decrypted tokens already active this session.
    cache: Mutex<HashMap<String, CredentialRecord>>,
    /// A token is treated as expired this many seconds before its expiry.
    buffer_secs: i64,
}

impl CredentialResolver {
    pub fn new(store: Arc<dyn CredentialStore>, buffer_secs: i64) -> Self {
        Self {
            store,
            cache: Mutex::new(HashMap::new()),
            buffer_secs,
        }
    }

    /// Resolve an active credential for a provider.
    ///
    /// An expired-but-refreshable record is renewed before being returned;
    /// an expired record without a refresh token is returned as-is and left
    /// for the provider to reject.
    pub async fn resolve(
        &self,
        provider: &ProviderDescriptor,
        transport: &dyn RemoteTransport,
    ) -> Result<CredentialRecord, CredentialError> {
        if let Some(cached) = self.cached(&provider.id) {
            if !cached.is_expired(self.buffer_secs) {
                return Ok(cached);
            }
        }

        let record = self
            .store
            .load(&provider.id)?
            .ok_or_else(|| CredentialError::Missing {
                provider: provider.id.clone(),
            })?;

        if record.is_expired(self.buffer_secs) && record.is_refreshable() {
            tracing::info!(provider = %provider.id, "token expired, refreshing");
            return self.refresh(provider, transport).await;
        }

        self.remember(record.clone());
        Ok(record)
    }

    /// Perform one refresh against the provider's refresh endpoint and
    /// replace the stored record atomically (token + expiry together).
    ///
    /// The renewed record carries no expiry — it stays active until the
    /// provider rejects it.
    pub async fn refresh(
        &self,
        provider: &ProviderDescriptor,
        transport: &dyn RemoteTransport,
    ) -> Result<CredentialRecord, CredentialError> {
        let current = match self.cached(&provider.id) {
            Some(record) => record,
            None => self
                .store
                .load(&provider.id)?
                .ok_or_else(|| CredentialError::Missing {
                    provider: provider.id.clone(),
                })?,
        };

        let refresh_token =
            current
                .refresh_token
                .clone()
                .ok_or_else(|| CredentialError::NoRefreshToken {
                    provider: provider.id.clone(),
                })?;

        let access_token = transport
            .refresh_token(&provider.endpoint, &refresh_token)
            .await
            .map_err(|e| CredentialError::RefreshFailed {
                provider: provider.id.clone(),
                reason: e.to_string(),
            })?;

        let renewed = CredentialRecord {
            provider: current.provider,
            access_token,
            refresh_token: Some(refresh_token),
            expiry: None,
        };

        self.store.save(&renewed)?;
        self.remember(renewed.clone());

        tracing::info!(provider = %provider.id, "credential refreshed");
        Ok(renewed)
    }

    fn cached(&self, provider: &str) -> Option<CredentialRecord> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(provider)
            .cloned()
    }

    fn remember(&self, record: CredentialRecord) {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(record.provider.clone(), record);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use chrono::{Duration, Utc};

    use super::*;
    use crate::credentials::store::MemoryCredentialStore;
    use crate::executor::transport::testing::FakeTransport;
    use crate::executor::ExecError;

    fn github() -> ProviderDescriptor {
        ProviderDescriptor::new("github", "GitHub", "https://bridge.test/github", &[])
    }

    fn fresh_record() -> CredentialRecord {
        CredentialRecord {
            provider: "github".into(),
            access_token: "tok-live".into(),
            refresh_token: Some("ref-1".into()),
            expiry: Some(Utc::now() + Duration::hours(1)),
        }
    }

    fn expired_record(refreshable: bool) -> CredentialRecord {
        CredentialRecord {
            provider: "github".into(),
            access_token: "tok-stale".into(),
            refresh_token: refreshable.then(|| "ref-1".to_string()),
            expiry: Some(Utc::now() - Duration::minutes(5)),
        }
    }

    #[tokio::test]
    async fn test_resolve_from_store_and_then_cache() {
        let store = Arc::new(MemoryCredentialStore::new());
        store.save(&fresh_record()).unwrap();

        let resolver = CredentialResolver::new(store.clone(), 60);
        let transport = FakeTransport::new();

        let first = resolver.resolve(&github(), &transport).await.unwrap();
        assert_eq!(first.access_token, "tok-live");

        // Remove from the store; the session cache must still serve it.
        store.delete("github").unwrap();
        let second = resolver.resolve(&github(), &transport).await.unwrap();
        assert_eq!(second.access_token, "tok-live");
    }

    #[tokio::test]
    async fn test_resolve_missing_credential() {
        let resolver = CredentialResolver::new(Arc::new(MemoryCredentialStore::new()), 60);
        let transport = FakeTransport::new();

        let err = resolver.resolve(&github(), &transport).await.unwrap_err();
        assert!(matches!(err, CredentialError::Missing { .. }));
        assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolve_refreshes_expired_oauth_record() {
        let store = Arc::new(MemoryCredentialStore::new());
        store.save(&expired_record(true)).unwrap();

        let resolver = CredentialResolver::new(store.clone(), 60);
        let transport = FakeTransport::new();
        transport.push_refresh(Ok("tok-renewed".into()));

        let record = resolver.resolve(&github(), &transport).await.unwrap();
        assert_eq!(record.access_token, "tok-renewed");
        assert_eq!(record.refresh_token.as_deref(), Some("ref-1"));
        assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 1);

        // Store was updated atomically with the new token.
        let stored = store.load("github").unwrap().unwrap();
        assert_eq!(stored.access_token, "tok-renewed");
        assert!(stored.expiry.is_none());
    }

    #[tokio::test]
    async fn test_resolve_expired_without_refresh_token_returned_as_is() {
        let store = Arc::new(MemoryCredentialStore::new());
        store.save(&expired_record(false)).unwrap();

        let resolver = CredentialResolver::new(store, 60);
        let transport = FakeTransport::new();

        // Plain API key: no local refresh path, the provider decides.
        let record = resolver.resolve(&github(), &transport).await.unwrap();
        assert_eq!(record.access_token, "tok-stale");
        assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_errors() {
        let store = Arc::new(MemoryCredentialStore::new());
        let mut record = fresh_record();
        record.refresh_token = None;
        store.save(&record).unwrap();

        let resolver = CredentialResolver::new(store, 60);
        let transport = FakeTransport::new();

        let err = resolver.refresh(&github(), &transport).await.unwrap_err();
        assert!(matches!(err, CredentialError::NoRefreshToken { .. }));
    }

    #[tokio::test]
    async fn test_refresh_failure_surfaces() {
        let store = Arc::new(MemoryCredentialStore::new());
        store.save(&fresh_record()).unwrap();

        let resolver = CredentialResolver::new(store.clone(), 60);
        let transport = FakeTransport::new();
        transport.push_refresh(Err(ExecError::Server {
            status: 502,
            message: "bad gateway".into(),
        }));

        let err = resolver.refresh(&github(), &transport).await.unwrap_err();
        assert!(matches!(err, CredentialError::RefreshFailed { .. }));

        // Failed refresh must not clobber the stored record.
        let stored = store.load("github").unwrap().unwrap();
        assert_eq!(stored.access_token, "tok-live");
    }
}
