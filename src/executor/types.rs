//! Wire types for the remote command endpoint.
//!
//! These mirror the bridge protocol exactly: field names follow the wire
//! (`jobId`, `apiKey`, `refresh_token`) via serde renames, and historically
//! observed variants are absorbed with aliases.

use serde::{Deserialize, Serialize};

// ─── Error Taxonomy ──────────────────────────────────────────────────────────

/// Failure classification shared between wire error envelopes and
/// user-facing command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Transport failure, no response received.
    Network,
    /// Non-2xx response without a structured cause.
    Server,
    /// Malformed or unsupported command, or a missing required parameter.
    Validation,
    /// The provider is throttling requests.
    RateLimit,
    /// The credential was rejected by the provider.
    AuthExpired,
    /// Nothing recognized locally — short-circuited before any network call.
    UserInput,
}

impl ErrorCode {
    /// The wire representation (`"NETWORK"`, `"AUTH_EXPIRED"`, …).
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Network => "NETWORK",
            ErrorCode::Server => "SERVER",
            ErrorCode::Validation => "VALIDATION",
            ErrorCode::RateLimit => "RATE_LIMIT",
            ErrorCode::AuthExpired => "AUTH_EXPIRED",
            ErrorCode::UserInput => "USER_INPUT",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Command Dispatch ────────────────────────────────────────────────────────

/// Request body for `POST {endpoint}/command`.
#[derive(Debug, Clone, Serialize)]
pub struct CommandEnvelope {
    pub provider: String,
    #[serde(rename = "apiKey")]
    pub api_key: String,
    pub prompt: String,
    pub command: String,
    pub context: serde_json::Value,
    pub metadata: serde_json::Value,
}

/// Asynchronous acceptance body: the endpoint queued the command as a job.
#[derive(Debug, Clone, Deserialize)]
pub struct QueuedAck {
    #[serde(rename = "jobId")]
    pub job_id: String,
    #[serde(default)]
    pub eta: Option<f64>,
}

/// Outcome of a single dispatch call: either a synchronous result body or a
/// queued-job acceptance that must be polled to completion.
#[derive(Debug, Clone)]
pub enum ExecOutcome {
    /// The endpoint executed synchronously; the opaque result body.
    Completed(serde_json::Value),
    /// The endpoint queued the command.
    Queued(QueuedAck),
}

// ─── Job Polling ─────────────────────────────────────────────────────────────

/// Response body for `GET {endpoint}/job/{jobId}`.
///
/// When `done` is true exactly one of `result` / `error` is expected.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatus {
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

// ─── Error Envelope ──────────────────────────────────────────────────────────

/// Structured error body carried on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub ok: bool,
    pub code: ErrorCode,
    pub message: String,
}

// ─── Token Refresh ───────────────────────────────────────────────────────────

/// Request body for `POST {endpoint}/refresh`.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Response body from a successful refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshGrant {
    pub access_token: String,
}

// ─── Command Catalog ─────────────────────────────────────────────────────────

/// One entry of `GET {endpoint}/commands`: providers return either bare
/// slug strings or `{id}` / `{name}` objects depending on their vintage.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CatalogEntry {
    Slug(String),
    Object {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
}

impl CatalogEntry {
    /// Extract the command slug, if the entry carries one.
    pub fn into_slug(self) -> Option<String> {
        let slug = match self {
            CatalogEntry::Slug(s) => Some(s),
            CatalogEntry::Object { id, name } => id.or(name),
        };
        slug.filter(|s| !s.trim().is_empty())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
