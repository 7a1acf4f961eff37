//! Remote transport — HTTP access to a provider's command endpoint.
//!
//! The `RemoteTransport` trait is the seam between the dispatch pipeline and
//! the network. Production uses the reqwest-backed `HttpTransport`; tests
//! script a fake.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use uuid::Uuid;

use super::errors::ExecError;
use super::types::{
    CatalogEntry, CommandEnvelope, ErrorEnvelope, ExecOutcome, JobStatus, QueuedAck,
    RefreshGrant, RefreshRequest,
};

// ─── Constants ───────────────────────────────────────────────────────────────

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Total request timeout per call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum length of an unstructured error body carried into an error message.
const ERROR_BODY_LIMIT: usize = 500;

// ─── RemoteTransport ─────────────────────────────────────────────────────────

/// Access to a provider's remote command endpoint.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// `POST {endpoint}/command` — dispatch a command.
    async fn dispatch(
        &self,
        endpoint: &str,
        token: &str,
        command_id: Uuid,
        envelope: &CommandEnvelope,
    ) -> Result<ExecOutcome, ExecError>;

    /// `GET {endpoint}/job/{job_id}` — poll a queued job.
    async fn poll_job(
        &self,
        endpoint: &str,
        token: &str,
        job_id: &str,
    ) -> Result<JobStatus, ExecError>;

    /// `GET {endpoint}/commands` — fetch the provider's command catalog.
    async fn fetch_commands(
        &self,
        endpoint: &str,
        token: &str,
    ) -> Result<Vec<String>, ExecError>;

    /// `POST {endpoint}/refresh` — exchange a refresh token for a new
    /// access token.
    async fn refresh_token(
        &self,
        endpoint: &str,
        refresh_token: &str,
    ) -> Result<String, ExecError>;
}

// ─── HttpTransport ───────────────────────────────────────────────────────────

/// reqwest-backed transport for the uniform bridge protocol.
pub struct HttpTransport {
    http: HttpClient,
}

impl HttpTransport {
    /// Build the transport with connection and request timeouts applied.
    pub fn new() -> Result<Self, ExecError> {
        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ExecError::Network {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { http })
    }

    /// Consume a non-2xx response into the matching `ExecError`.
    ///
    /// A parseable error envelope surfaces its declared code; anything else
    /// defaults to a server error carrying a truncated body excerpt.
    async fn error_from_response(response: reqwest::Response) -> ExecError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        map_error_body(status, &body)
    }
}

/// Map a non-2xx status + body to an `ExecError`.
fn map_error_body(status: u16, body: &str) -> ExecError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => ExecError::Remote {
            code: envelope.code,
            message: envelope.message,
        },
        Err(_) => ExecError::Server {
            status,
            message: excerpt(body),
        },
    }
}

/// Map a reqwest transport error (no response) to `ExecError::Network`.
fn map_send_error(e: reqwest::Error) -> ExecError {
    let reason = if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    };
    ExecError::Network { reason }
}

/// Truncate an unstructured body for inclusion in an error message.
fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= ERROR_BODY_LIMIT {
        return trimmed.to_string();
    }
    let mut end = ERROR_BODY_LIMIT;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &trimmed[..end])
}

#[async_trait]
impl RemoteTransport for HttpTransport {
    async fn dispatch(
        &self,
        endpoint: &str,
        token: &str,
        command_id: Uuid,
        envelope: &CommandEnvelope,
    ) -> Result<ExecOutcome, ExecError> {
        let url = format!("{endpoint}/command");

        tracing::debug!(
            url = %url,
            provider = %envelope.provider,
            command = %envelope.command,
            command_id = %command_id,
            "dispatching command"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .header("x-command-id", command_id.to_string())
            .json(envelope)
            .send()
            .await
            .map_err(map_send_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let body: serde_json::Value =
            response.json().await.map_err(|e| ExecError::Network {
                reason: format!("failed to read response body: {e}"),
            })?;

        // A body carrying a job identifier means the command was queued.
        if body.get("jobId").and_then(|v| v.as_str()).is_some() {
            let ack: QueuedAck = serde_json::from_value(body).map_err(|e| {
                ExecError::MalformedResponse {
                    reason: format!("unparseable job acceptance: {e}"),
                }
            })?;
            return Ok(ExecOutcome::Queued(ack));
        }

        Ok(ExecOutcome::Completed(body))
    }

    async fn poll_job(
        &self,
        endpoint: &str,
        token: &str,
        job_id: &str,
    ) -> Result<JobStatus, ExecError> {
        let url = format!("{endpoint}/job/{job_id}");

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(map_send_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        response.json().await.map_err(|e| ExecError::MalformedResponse {
            reason: format!("unparseable job status: {e}"),
        })
    }

    async fn fetch_commands(
        &self,
        endpoint: &str,
        token: &str,
    ) -> Result<Vec<String>, ExecError> {
        let url = format!("{endpoint}/commands");

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(map_send_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let entries: Vec<CatalogEntry> =
            response.json().await.map_err(|e| ExecError::MalformedResponse {
                reason: format!("unparseable command catalog: {e}"),
            })?;

        Ok(entries
            .into_iter()
            .filter_map(CatalogEntry::into_slug)
            .collect())
    }

    async fn refresh_token(
        &self,
        endpoint: &str,
        refresh_token: &str,
    ) -> Result<String, ExecError> {
        let url = format!("{endpoint}/refresh");

        let response = self
            .http
            .post(&url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(map_send_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let grant: RefreshGrant =
            response.json().await.map_err(|e| ExecError::MalformedResponse {
                reason: format!("unparseable refresh grant: {e}"),
            })?;

        Ok(grant.access_token)
    }
}

// ─── Test Double ─────────────────────────────────────────────────────────────

/// Scripted transport shared by executor, credential, and dispatcher tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// A transport that replays canned responses and counts calls.
    #[derive(Default)]
    pub(crate) struct FakeTransport {
        pub dispatch_script: Mutex<VecDeque<Result<ExecOutcome, ExecError>>>,
        pub poll_script: Mutex<VecDeque<Result<JobStatus, ExecError>>>,
        pub catalog_script: Mutex<VecDeque<Result<Vec<String>, ExecError>>>,
        pub refresh_script: Mutex<VecDeque<Result<String, ExecError>>>,
        pub dispatch_calls: AtomicUsize,
        pub poll_calls: AtomicUsize,
        pub catalog_calls: AtomicUsize,
        pub refresh_calls: AtomicUsize,
        /// The most recent dispatch envelope, for slug/token assertions.
        pub last_envelope: Mutex<Option<CommandEnvelope>>,
    }

    impl FakeTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn push_dispatch(&self, r: Result<ExecOutcome, ExecError>) {
            self.dispatch_script.lock().unwrap().push_back(r);
        }

        pub(crate) fn push_poll(&self, r: Result<JobStatus, ExecError>) {
            self.poll_script.lock().unwrap().push_back(r);
        }

        pub(crate) fn push_catalog(&self, r: Result<Vec<String>, ExecError>) {
            self.catalog_script.lock().unwrap().push_back(r);
        }

        pub(crate) fn push_refresh(&self, r: Result<String, ExecError>) {
            self.refresh_script.lock().unwrap().push_back(r);
        }
    }

    #[async_trait]
    impl RemoteTransport for FakeTransport {
        async fn dispatch(
            &self,
            _endpoint: &str,
            _token: &str,
            _command_id: Uuid,
            envelope: &CommandEnvelope,
        ) -> Result<ExecOutcome, ExecError> {
            self.dispatch_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_envelope.lock().unwrap() = Some(envelope.clone());
            self.dispatch_script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("dispatch script exhausted"))
        }

        async fn poll_job(
            &self,
            _endpoint: &str,
            _token: &str,
            _job_id: &str,
        ) -> Result<JobStatus, ExecError> {
            self.poll_calls.fetch_add(1, Ordering::SeqCst);
            self.poll_script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("poll script exhausted"))
        }

        async fn fetch_commands(
            &self,
            _endpoint: &str,
            _token: &str,
        ) -> Result<Vec<String>, ExecError> {
            self.catalog_calls.fetch_add(1, Ordering::SeqCst);
            self.catalog_script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Err(ExecError::Network {
                        reason: "no catalog scripted".into(),
                    })
                })
        }

        async fn refresh_token(
            &self,
            _endpoint: &str,
            _refresh_token: &str,
        ) -> Result<String, ExecError> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            self.refresh_script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("refresh script exhausted"))
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
