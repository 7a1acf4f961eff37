//! Credential records and the external store boundary.
//!
//! The dispatch core never owns credential persistence — it talks to a
//! `CredentialStore`. The SQLite implementation here is the default
//! collaborator; an in-memory variant serves tests and ephemeral sessions.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::errors::CredentialError;

// ─── CredentialRecord ────────────────────────────────────────────────────────

/// An access credential for one provider.
///
/// Records with a refresh token are OAuth-style and renewable; records
/// without one are plain API keys. Token and expiry are always replaced
/// together — a record is never partially updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub provider: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl CredentialRecord {
    /// Whether the token is expired (or will be within `buffer_secs`).
    ///
    /// Records without an expiry never expire locally — the provider is the
    /// judge, via an AUTH_EXPIRED rejection.
    pub fn is_expired(&self, buffer_secs: i64) -> bool {
        match self.expiry {
            Some(expiry) => Utc::now() >= expiry - Duration::seconds(buffer_secs),
            None => false,
        }
    }

    /// Whether the record can be renewed without user interaction.
    pub fn is_refreshable(&self) -> bool {
        self.refresh_token.is_some()
    }
}

// ─── CredentialStore ─────────────────────────────────────────────────────────

/// External credential persistence boundary.
pub trait CredentialStore: Send + Sync {
    /// Load the record for a provider, if one exists.
    fn load(&self, provider: &str) -> Result<Option<CredentialRecord>, CredentialError>;

    /// Persist a record, replacing any previous one for the same provider.
    fn save(&self, record: &CredentialRecord) -> Result<(), CredentialError>;

    /// Remove the record for a provider. Returns whether one existed.
    fn delete(&self, provider: &str) -> Result<bool, CredentialError>;
}

// ─── SQLite Store ────────────────────────────────────────────────────────────

/// SQLite-backed credential store — the default collaborator.
pub struct SqliteCredentialStore {
    conn: Mutex<Connection>,
}

impl SqliteCredentialStore {
    /// Open (or create) the store at the given path. `":memory:"` works for
    /// throwaway sessions.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CredentialError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS credentials (
                provider      TEXT PRIMARY KEY,
                access_token  TEXT NOT NULL,
                refresh_token TEXT,
                expiry        TEXT
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open the store at the platform-standard data directory.
    pub fn open_default() -> Result<Self, CredentialError> {
        let dir = crate::data_dir();
        std::fs::create_dir_all(&dir).map_err(|e| CredentialError::Store {
            reason: format!("failed to create data dir: {e}"),
        })?;
        Self::open(dir.join("credentials.db"))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialStore for SqliteCredentialStore {
    fn load(&self, provider: &str) -> Result<Option<CredentialRecord>, CredentialError> {
        let conn = self.lock();
        let record = conn
            .query_row(
                "SELECT provider, access_token, refresh_token, expiry
                 FROM credentials WHERE provider = ?1",
                params![provider],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((provider, access_token, refresh_token, expiry)) = record else {
            return Ok(None);
        };

        let expiry = match expiry {
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(&raw)
                    .map_err(|e| CredentialError::Store {
                        reason: format!("stored expiry unparseable: {e}"),
                    })?
                    .with_timezone(&Utc),
            ),
            None => None,
        };

        Ok(Some(CredentialRecord {
            provider,
            access_token,
            refresh_token,
            expiry,
        }))
    }

    fn save(&self, record: &CredentialRecord) -> Result<(), CredentialError> {
        let conn = self.lock();
        // Single-statement upsert keeps token + expiry consistent.
        conn.execute(
            "INSERT OR REPLACE INTO credentials
             (provider, access_token, refresh_token, expiry)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.provider,
                record.access_token,
                record.refresh_token,
                record.expiry.map(|e| e.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    fn delete(&self, provider: &str) -> Result<bool, CredentialError> {
        let conn = self.lock();
        let affected =
            conn.execute("DELETE FROM credentials WHERE provider = ?1", params![provider])?;
        Ok(affected > 0)
    }
}

// ─── In-Memory Store ─────────────────────────────────────────────────────────

/// In-memory credential store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryCredentialStore {
    records: Mutex<HashMap<String, CredentialRecord>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self, provider: &str) -> Result<Option<CredentialRecord>, CredentialError> {
        Ok(self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(provider)
            .cloned())
    }

    fn save(&self, record: &CredentialRecord) -> Result<(), CredentialError> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(record.provider.clone(), record.clone());
        Ok(())
    }

    fn delete(&self, provider: &str) -> Result<bool, CredentialError> {
        Ok(self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(provider)
            .is_some())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
