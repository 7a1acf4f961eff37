//! The dispatcher — one service owning the whole pipeline.
//!
//! All session-scoped mutable state (live-command cache, duplicate tracker,
//! in-flight lock, credential cache) lives on this struct; nothing is
//! ambient module state. One instance per session, shared by reference.
//!
//! Pipeline per submission:
//! admission → classify → resolve credential → lazy catalog fetch +
//! normalize (classified phrases only; explicit `/provider` commands go
//! through verbatim) → execute (→ poll) → render, with lifecycle signals
//! around the whole admitted span.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::config::DispatchConfig;
use crate::credentials::{CredentialRecord, CredentialResolver, CredentialStore};
use crate::executor::{CancelFlag, CommandExecutor, RemoteTransport, Sleeper};
use crate::providers::{ProviderDescriptor, ProviderRegistry};
use crate::render::render_result;

use super::errors::DispatchError;
use super::events::{EventSink, LifecycleSpan};
use super::guard::{Admission, SubmissionGuard};
use super::intent::{classify, Intent};
use super::normalize::normalize_command;
use super::types::{CommandRequest, CommandResult, DispatchOutcome};

/// Routes chat commands to provider endpoints.
pub struct Dispatcher {
    registry: Arc<ProviderRegistry>,
    credentials: CredentialResolver,
    executor: CommandExecutor,
    transport: Arc<dyn RemoteTransport>,
    guard: SubmissionGuard,
    events: Arc<dyn EventSink>,
    default_provider: Option<String>,
}

impl Dispatcher {
    /// Assemble a dispatcher from its collaborators.
    pub fn new(
        config: &DispatchConfig,
        store: Arc<dyn CredentialStore>,
        transport: Arc<dyn RemoteTransport>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let registry = Arc::new(ProviderRegistry::builtin());
        for seed in &config.providers {
            registry.register(seed.descriptor());
        }

        Self {
            credentials: CredentialResolver::new(store, config.auth_buffer_secs),
            executor: CommandExecutor::new(transport.clone(), config.poll.policy()),
            transport,
            guard: SubmissionGuard::new(config.duplicate_window()),
            events,
            default_provider: config.default_provider.clone(),
            registry,
        }
    }

    /// Replace the executor's sleep implementation (tests).
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.executor = self.executor.with_sleeper(sleeper);
        self
    }

    /// The shared provider registry.
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Dispatch one submission to its terminal outcome.
    pub async fn dispatch(&self, raw_input: &str) -> DispatchOutcome {
        self.dispatch_with_cancel(raw_input, CancelFlag::new()).await
    }

    /// Dispatch with a caller-held cancellation flag.
    pub async fn dispatch_with_cancel(
        &self,
        raw_input: &str,
        cancel: CancelFlag,
    ) -> DispatchOutcome {
        let input = raw_input.trim();

        let permit = match self.guard.try_admit(input) {
            Admission::Admitted(permit) => permit,
            Admission::Duplicate => return DispatchOutcome::DroppedDuplicate,
            Admission::Busy => {
                // Rejected before admission — no lifecycle signals.
                let err = DispatchError::Busy;
                return DispatchOutcome::Completed(CommandResult::failure(
                    err.code(),
                    err.user_message(),
                ));
            }
        };

        let mut span = LifecycleSpan::begin(self.events.as_ref(), input);

        let result = match self.run(input, &cancel).await {
            Ok(result) => result,
            Err(err) => {
                let message = err.user_message();
                tracing::warn!(input, error = %err, "dispatch failed");
                span.fail(&message);
                CommandResult::failure(err.code(), message)
            }
        };

        // Span drop fires the terminal `finished` on the success path;
        // the permit drop releases the in-flight lock on every path.
        drop(span);
        drop(permit);

        DispatchOutcome::Completed(result)
    }

    /// The pipeline proper — every `?` funnels into the span/permit scope
    /// above.
    async fn run(
        &self,
        input: &str,
        cancel: &CancelFlag,
    ) -> Result<CommandResult, DispatchError> {
        let intent = classify(input, &self.registry, self.default_provider.as_deref())?;

        let provider_id = match &intent {
            Intent::Command { provider, .. }
            | Intent::Passthrough { provider, .. }
            | Intent::Prompt { provider } => provider.clone(),
        };

        // Classification only yields registered providers.
        let descriptor =
            self.registry
                .get(&provider_id)
                .ok_or_else(|| DispatchError::UnknownProvider {
                    marker: provider_id.clone(),
                })?;

        let credential = self
            .credentials
            .resolve(&descriptor, self.transport.as_ref())
            .await?;

        let command = match intent {
            // Only classified phrases are normalized; the catalog fetch is
            // a normalizer side effect, so it is also scoped here.
            Intent::Command { phrase, .. } => {
                self.ensure_catalog(&descriptor, &credential).await;
                normalize_command(
                    &phrase,
                    self.registry.live_commands(&descriptor.id).as_deref(),
                )
            }
            // An explicit `/provider` command reaches the endpoint verbatim.
            Intent::Passthrough { command, .. } => command,
            Intent::Prompt { .. } => "prompt".to_string(),
        };

        let request = CommandRequest {
            raw_input: input.to_string(),
            provider: descriptor.id.clone(),
            command,
            params: json!({}),
            command_id: Uuid::new_v4(),
            token: credential.access_token.clone(),
        };

        tracing::info!(
            provider = %request.provider,
            command = %request.command,
            command_id = %request.command_id,
            "dispatching command"
        );

        let raw = self.execute_with_refresh(&descriptor, request, cancel).await?;
        let display_text = render_result(&descriptor.id, &raw);
        Ok(CommandResult::ok(raw, display_text))
    }

    /// Execute, recovering from a single AUTH_EXPIRED rejection with one
    /// refresh and one retry. A second rejection surfaces unchanged.
    async fn execute_with_refresh(
        &self,
        descriptor: &ProviderDescriptor,
        request: CommandRequest,
        cancel: &CancelFlag,
    ) -> Result<serde_json::Value, DispatchError> {
        match self
            .executor
            .execute(&descriptor.endpoint, &request, cancel)
            .await
        {
            Ok(raw) => Ok(raw),
            Err(e) if e.is_auth_expired() => {
                tracing::info!(
                    provider = %descriptor.id,
                    "credential rejected, attempting single refresh"
                );
                let renewed = self
                    .credentials
                    .refresh(descriptor, self.transport.as_ref())
                    .await?;
                let retry = request.with_token(renewed.access_token);
                Ok(self
                    .executor
                    .execute(&descriptor.endpoint, &retry, cancel)
                    .await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Lazily fetch the provider's command catalog — at most one attempt
    /// per provider per session, failure tolerated.
    async fn ensure_catalog(&self, descriptor: &ProviderDescriptor, credential: &CredentialRecord) {
        if !self.registry.needs_catalog_fetch(&descriptor.id) {
            return;
        }

        match self
            .transport
            .fetch_commands(&descriptor.endpoint, &credential.access_token)
            .await
        {
            Ok(commands) => {
                let added = self.registry.extend_known_commands(&descriptor.id, commands);
                self.registry.mark_catalog_fetched(&descriptor.id, true);
                tracing::debug!(provider = %descriptor.id, added, "command catalog fetched");
            }
            Err(e) => {
                self.registry.mark_catalog_fetched(&descriptor.id, false);
                tracing::warn!(
                    provider = %descriptor.id,
                    error = %e,
                    "command catalog fetch failed, continuing without it"
                );
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
