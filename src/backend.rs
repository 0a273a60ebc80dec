//! The structured-completion seam between the generator and a text backend.

use crate::errors::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Declarative JSON-schema contract handed to a backend alongside the prompt.
///
/// The schema uses the OpenAPI subset understood by Gemini's `responseSchema`
/// (`OBJECT`, `STRING`, `ARRAY` type names). Backends that speak another
/// dialect translate it; the generator validates the response itself either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseSchema(Value);

impl ResponseSchema {
    #[must_use]
    pub const fn new(schema: Value) -> Self {
        Self(schema)
    }

    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Names listed under the schema's top-level `required` key.
    #[must_use]
    pub fn required_fields(&self) -> Vec<&str> {
        self.0
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// One structured-completion round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    pub schema: ResponseSchema,
}

/// A text-generation backend that can constrain output to a schema.
///
/// Implementations perform exactly one round trip per call and return the raw
/// text body, or `None` when the backend answered without content. They must
/// not retry on their own; retrying is the caller's job.
#[async_trait]
pub trait StructuredCompletion: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>, BackendError>;
}

#[async_trait]
impl<T: StructuredCompletion + ?Sized> StructuredCompletion for Arc<T> {
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>, BackendError> {
        (**self).complete(request).await
    }
}

#[async_trait]
impl<T: StructuredCompletion + ?Sized> StructuredCompletion for Box<T> {
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>, BackendError> {
        (**self).complete(request).await
    }
}
