use crate::retry::RateLimitSignal;
use std::time::Duration;
use thiserror::Error;

/// Fixed diagnostic shown to end users when a generation attempt fails.
pub const USER_RETRY_MESSAGE: &str = "The workshop jammed. Please try again.";

/// Fixed diagnostic shown to end users when retrying is unlikely to help.
pub const USER_FAILURE_MESSAGE: &str =
    "The workshop is out of order. Check the configuration and report the failure.";

/// Errors produced by a [`StructuredCompletion`](crate::StructuredCompletion) backend.
///
/// Backends map their transport and API failures onto these variants so that
/// the retry policy can classify them without knowing which vendor SDK or
/// HTTP stack produced them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    /// API error with structured context for debugging and automated handling.
    #[error("API error (HTTP {status_code}): {message}")]
    Api {
        /// HTTP status code (e.g., 400, 429, 500)
        status_code: u16,
        /// Numeric `code` from the error envelope, which proxies may set to 429
        /// while answering with a different HTTP status
        code: Option<u16>,
        /// Backend status string from the error envelope (e.g., `RESOURCE_EXHAUSTED`)
        status: Option<String>,
        /// Error message from the API response body
        message: String,
        /// Request ID from `x-goog-request-id` header, if available
        request_id: Option<String>,
    },
    /// The backend answered 2xx but the envelope itself could not be decoded.
    #[error("Failed to decode backend envelope: {0}")]
    Decode(String),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Free-form failure from backends that only expose a message.
    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// Returns the HTTP-style status code carried by this error, if any.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            BackendError::Api { status_code, .. } => Some(*status_code),
            BackendError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

const RESOURCE_EXHAUSTED: &str = "RESOURCE_EXHAUSTED";

impl RateLimitSignal for BackendError {
    fn is_rate_limited(&self) -> bool {
        if self.status_code() == Some(429) {
            return true;
        }

        if let BackendError::Api { code, status, .. } = self
            && (*code == Some(429) || status.as_deref() == Some(RESOURCE_EXHAUSTED))
        {
            return true;
        }

        let message = self.to_string();
        message.contains("429") || message.contains(RESOURCE_EXHAUSTED)
    }
}

/// Errors surfaced by [`Generator`](crate::Generator) and [`Client`](crate::Client).
///
/// # Example: Handling Generation Errors
///
/// ```ignore
/// match client.generate(Some("breakfast"), false).await {
///     Ok(invention) => println!("{}", invention.name()),
///     Err(e) if e.is_user_retryable() => println!("{}", e.user_message()),
///     Err(e) => tracing::error!("Persistent failure: {e}"),
/// }
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ForgeError {
    /// The backend round trip succeeded but carried no content body.
    #[error("Empty response from backend")]
    EmptyResponse,
    /// A body was present but did not match the invention schema.
    #[error("Response violates the invention schema: {0}")]
    SchemaViolation(String),
    /// Rate-limit retries were exhausted; `source` is the error from the last attempt.
    #[error("Backend still rate limited after {attempts} attempt(s): {source}")]
    TransientBackendFailure {
        attempts: u32,
        #[source]
        source: BackendError,
    },
    /// Any non rate-limit backend failure, propagated unchanged.
    #[error(transparent)]
    FatalBackendFailure(BackendError),
    /// The caller's cancellation token fired while the call was suspended.
    #[error("Generation cancelled")]
    Cancelled,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Failed to build the HTTP client.
    ///
    /// This typically only occurs in exceptional circumstances such as
    /// TLS backend initialization failures.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl ForgeError {
    /// Returns `true` if asking the user to try again is reasonable.
    ///
    /// Generation output is non-deterministic and rate limits clear with time,
    /// so empty or malformed responses and exhausted retries are worth a manual
    /// retry. Network-level failures and timeouts are too. Fatal API errors
    /// (bad key, unknown model) and configuration problems are not.
    ///
    /// ```rust
    /// use contraption_rs::{BackendError, ForgeError};
    ///
    /// assert!(ForgeError::EmptyResponse.is_user_retryable());
    ///
    /// let bad_key = ForgeError::FatalBackendFailure(BackendError::Api {
    ///     status_code: 403,
    ///     code: None,
    ///     status: Some("PERMISSION_DENIED".to_string()),
    ///     message: "API key not valid".to_string(),
    ///     request_id: None,
    /// });
    /// assert!(!bad_key.is_user_retryable());
    /// ```
    #[must_use]
    pub fn is_user_retryable(&self) -> bool {
        match self {
            ForgeError::EmptyResponse
            | ForgeError::SchemaViolation(_)
            | ForgeError::TransientBackendFailure { .. }
            | ForgeError::Cancelled => true,

            ForgeError::FatalBackendFailure(source) => match source {
                BackendError::Http(_) | BackendError::Timeout(_) => true,
                BackendError::Api { status_code, .. } => *status_code >= 500,
                BackendError::Decode(_) | BackendError::Other(_) => false,
            },

            ForgeError::InvalidInput(_) | ForgeError::ClientBuild(_) => false,
        }
    }

    /// The fixed, short diagnostic a presentation layer should display.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        if self.is_user_retryable() {
            USER_RETRY_MESSAGE
        } else {
            USER_FAILURE_MESSAGE
        }
    }
}
