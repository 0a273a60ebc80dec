//! [`StructuredCompletion`] over Gemini's `generateContent` endpoint.

use super::common::{API_KEY_HEADER, ApiVersion, DEFAULT_BASE_URL, generate_content_url};
use super::error_helpers::{check_response, format_json_parse_error};
use super::loud_wire;
use crate::backend::{CompletionRequest, ResponseSchema, StructuredCompletion};
use crate::errors::BackendError;
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

const JSON_MIME_TYPE: &str = "application/json";

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize, Debug)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize, Debug)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a ResponseSchema,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(request: &'a CompletionRequest) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: JSON_MIME_TYPE,
                response_schema: &request.schema,
            },
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: Option<bool>,
}

impl GenerateContentResponse {
    /// Concatenated non-thought text of the first candidate, if it has any.
    fn into_text(self) -> Option<String> {
        let candidate = self.candidates.into_iter().next()?;
        if let Some(reason) = &candidate.finish_reason
            && reason != "STOP"
        {
            warn!(finish_reason = %reason, "Candidate finished abnormally");
        }

        let texts: Vec<String> = candidate
            .content?
            .parts
            .into_iter()
            .filter(|part| part.thought != Some(true))
            .filter_map(|part| part.text)
            .collect();

        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }
}

/// Gemini `generateContent` backend.
///
/// Each [`complete`](StructuredCompletion::complete) call is exactly one HTTP
/// round trip: the prompt goes in as a single user turn and the schema as
/// `generationConfig.responseSchema` with a JSON response MIME type.
///
/// # Example
///
/// ```
/// use contraption_rs::GeminiBackend;
///
/// let backend = GeminiBackend::new("api_key")
///     .with_model("gemini-2.5-flash")
///     .with_base_url("http://localhost:8080");
/// assert_eq!(backend.model(), "gemini-2.5-flash");
/// ```
#[derive(Clone)]
pub struct GeminiBackend {
    http_client: ReqwestClient,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Option<Duration>,
}

impl fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl GeminiBackend {
    /// Creates a backend with a default HTTP client, model and endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_parts(ReqwestClient::new(), api_key.into(), None)
    }

    pub(crate) fn from_parts(
        http_client: ReqwestClient,
        api_key: String,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            http_client,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Points the backend at another host (a proxy or a mock server).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn transport_error(&self, error: reqwest::Error) -> BackendError {
        match self.timeout {
            Some(timeout) if error.is_timeout() => BackendError::Timeout(timeout),
            _ => BackendError::Http(error),
        }
    }
}

#[async_trait]
impl StructuredCompletion for GeminiBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>, BackendError> {
        let url = generate_content_url(&self.base_url, &self.model, ApiVersion::V1Beta);
        let body = GenerateContentRequest::new(request);

        // LOUD_WIRE: Log outgoing request
        let request_id = loud_wire::next_request_id();
        if loud_wire::is_enabled() {
            match serde_json::to_string(&body) {
                Ok(json) => loud_wire::log_request(request_id, "POST", &url, Some(&json)),
                Err(e) => warn!("LOUD_WIRE: Failed to serialize request body: {}", e),
            }
        }

        debug!(model = %self.model, request_id, "Sending generateContent request");

        let response = self
            .http_client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        loud_wire::log_response_status(request_id, response.status().as_u16());

        let response = check_response(response).await?;
        let response_text = response.text().await.map_err(|e| self.transport_error(e))?;

        loud_wire::log_response_body(request_id, &response_text);

        let envelope: GenerateContentResponse = serde_json::from_str(&response_text)
            .map_err(|e| BackendError::Decode(format_json_parse_error(&response_text, e)))?;

        let text = envelope.into_text();
        debug!(
            request_id,
            has_text = text.is_some(),
            "generateContent response received"
        );
        Ok(text)
    }
}
