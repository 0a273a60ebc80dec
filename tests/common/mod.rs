//! Common test utilities shared across integration test files.
//!
//! Usage in test files:
//! ```ignore
//! mod common;
//! use common::*;
//! ```

use async_trait::async_trait;
use contraption_rs::{BackendError, Client, CompletionRequest, StructuredCompletion};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::env;
use std::sync::Mutex;
use tokio::time::Instant;

/// Creates a client from the GEMINI_API_KEY environment variable.
/// Returns None if the API key is not set.
#[allow(dead_code)]
pub fn get_client() -> Option<Client> {
    env::var("GEMINI_API_KEY")
        .ok()
        .and_then(|key| Client::builder(key).build().ok())
}

/// A complete, schema-valid invention body.
#[allow(dead_code)]
pub fn valid_invention() -> Value {
    json!({
        "name": "The Hog-Powered Toaster Cannon",
        "description": "Converts pig sprints into perfectly browned, airborne toast.",
        "components": ["hamster wheel (pig-sized)", "copper boiler", "bread catapult"],
        "hazardLevel": "Extreme",
        "blueprintCode": "OINK-42-B",
        "rarity": "Standard"
    })
}

/// A Google-style 429 error.
#[allow(dead_code)]
pub fn rate_limited() -> BackendError {
    BackendError::Api {
        status_code: 429,
        code: None,
        status: Some("RESOURCE_EXHAUSTED".to_string()),
        message: "Resource has been exhausted (e.g. check quota).".to_string(),
        request_id: None,
    }
}

/// One scripted backend answer.
pub type Reply = Result<Option<String>, BackendError>;

#[allow(dead_code)]
pub fn body(value: &Value) -> Reply {
    Ok(Some(value.to_string()))
}

/// Backend that replays a fixed script of replies, one per call.
///
/// Records the (tokio) instant of each call so tests running with a paused
/// clock can assert on the backoff schedule.
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<(Instant, CompletionRequest)>>,
}

#[allow(dead_code)]
impl ScriptedBackend {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_instants(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(at, _)| *at).collect()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }
}

#[async_trait]
impl StructuredCompletion for ScriptedBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>, BackendError> {
        self.calls
            .lock()
            .unwrap()
            .push((Instant::now(), request.clone()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Other("script exhausted".to_string())))
    }
}
