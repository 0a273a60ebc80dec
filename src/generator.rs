//! The structured generation client.
//!
//! [`Generator`] is backend-agnostic: it turns a [`GenerationRequest`] into a
//! prompt and schema, runs one backend round trip per attempt under the
//! [`RetryPolicy`], and validates whatever comes back. It holds no mutable
//! state, so a single instance can serve concurrent calls.

use crate::backend::StructuredCompletion;
use crate::errors::{BackendError, ForgeError};
use crate::invention::{GenerationRequest, Invention, Mode};
use crate::prompt::completion_request;
use crate::retry::{RetryFailure, RetryPolicy};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Generates validated [`Invention`]s from any [`StructuredCompletion`] backend.
///
/// Only rate-limit failures are retried. Empty bodies and schema violations
/// are returned on the attempt where they occur.
#[derive(Debug, Clone)]
pub struct Generator<B> {
    backend: B,
    policy: RetryPolicy,
}

impl<B: StructuredCompletion> Generator<B> {
    /// Creates a generator with the default retry policy (5 attempts).
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            policy: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Generates one invention for an optional theme in the given mode.
    ///
    /// # Errors
    ///
    /// - [`ForgeError::EmptyResponse`] if the backend returned no content
    /// - [`ForgeError::SchemaViolation`] if the content is not a valid invention
    /// - [`ForgeError::TransientBackendFailure`] if every attempt was rate limited
    /// - [`ForgeError::FatalBackendFailure`] for any other backend error
    pub async fn generate(&self, theme: Option<&str>, mode: Mode) -> Result<Invention, ForgeError> {
        let mut request = GenerationRequest::new(mode);
        if let Some(theme) = theme {
            request = request.with_theme(theme);
        }
        self.generate_request(&request).await
    }

    /// Generates one invention for a prepared request.
    ///
    /// # Errors
    ///
    /// See [`generate`](Self::generate).
    pub async fn generate_request(
        &self,
        request: &GenerationRequest,
    ) -> Result<Invention, ForgeError> {
        let completion = completion_request(request);
        let backend = &self.backend;
        let completion = &completion;

        debug!(
            mode = ?request.mode(),
            has_theme = request.theme().is_some(),
            "Generating invention"
        );

        let outcome = self
            .policy
            .execute(move || backend.complete(completion))
            .await;
        finish(outcome)
    }

    /// Like [`generate_request`](Self::generate_request), but gives up with
    /// [`ForgeError::Cancelled`] once `token` is cancelled. The token is checked
    /// while waiting on the backend and during backoff waits.
    ///
    /// # Errors
    ///
    /// See [`generate`](Self::generate), plus [`ForgeError::Cancelled`].
    pub async fn generate_cancellable(
        &self,
        request: &GenerationRequest,
        token: &CancellationToken,
    ) -> Result<Invention, ForgeError> {
        let completion = completion_request(request);
        let backend = &self.backend;
        let completion = &completion;

        debug!(
            mode = ?request.mode(),
            has_theme = request.theme().is_some(),
            "Generating invention (cancellable)"
        );

        let outcome = self
            .policy
            .execute_cancellable(move || backend.complete(completion), token)
            .await;
        finish(outcome)
    }
}

/// Maps the retry outcome onto the caller-facing error taxonomy and validates
/// the body.
fn finish(
    outcome: Result<Option<String>, RetryFailure<BackendError>>,
) -> Result<Invention, ForgeError> {
    let body = match outcome {
        Ok(Some(body)) => body,
        Ok(None) => {
            warn!("Backend returned no content");
            return Err(ForgeError::EmptyResponse);
        }
        Err(RetryFailure::Fatal(source)) => return Err(ForgeError::FatalBackendFailure(source)),
        Err(RetryFailure::Exhausted { attempts, last }) => {
            return Err(ForgeError::TransientBackendFailure {
                attempts,
                source: last,
            });
        }
        Err(RetryFailure::Cancelled) => return Err(ForgeError::Cancelled),
    };

    match Invention::from_json(&body) {
        Ok(invention) => {
            debug!(
                name = invention.name(),
                hazard_level = %invention.hazard_level(),
                "Invention generated"
            );
            Ok(invention)
        }
        Err(e) => {
            warn!(error = %e, "Backend output rejected");
            Err(e)
        }
    }
}
