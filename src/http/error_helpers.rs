//! Error handling utilities for HTTP responses and error context formatting.

use crate::errors::BackendError;
use reqwest::Response;
use serde::Deserialize;

/// Maximum characters to include from error body in context messages
const ERROR_BODY_PREVIEW_LENGTH: usize = 200;

/// Google's request ID header name.
///
/// Uniquely identifies each request; useful when correlating with server logs
/// or contacting support.
const REQUEST_ID_HEADER: &str = "x-goog-request-id";

/// Google's standard error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Checks if an HTTP response is successful, returning it if so or an error otherwise.
///
/// # Errors
///
/// Returns [`BackendError::Api`] with status code, message and request ID on
/// non-success status.
pub async fn check_response(response: Response) -> Result<Response, BackendError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(read_error_with_context(response).await)
    }
}

/// Reads an error response and creates a [`BackendError::Api`] with context.
///
/// Extracts:
/// - HTTP status code for programmatic error handling
/// - The envelope's numeric `code`, when present
/// - The envelope's `status` string (e.g. `RESOURCE_EXHAUSTED`), when present
/// - The envelope's message, or a truncated body preview if it is not JSON
/// - Request ID from `x-goog-request-id` header for debugging/support
pub async fn read_error_with_context(response: Response) -> BackendError {
    let status_code = response.status().as_u16();

    // Extract request ID from response headers before consuming the body
    let request_id = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let error_body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("Failed to read error body: {}", e));

    let details = parse_error_body(&error_body);

    BackendError::Api {
        status_code,
        code: details.code,
        status: details.status,
        message: details.message,
        request_id,
    }
}

/// What could be recovered from an error body.
#[derive(Debug, PartialEq)]
struct ErrorDetails {
    code: Option<u16>,
    status: Option<String>,
    message: String,
}

/// Splits an error body into the envelope's code, status string and message.
fn parse_error_body(body: &str) -> ErrorDetails {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope { error }) => ErrorDetails {
            code: error.code,
            status: error.status,
            message: error
                .message
                .unwrap_or_else(|| truncate_for_context(body, ERROR_BODY_PREVIEW_LENGTH)),
        },
        Err(_) => ErrorDetails {
            code: None,
            status: None,
            message: truncate_for_context(body, ERROR_BODY_PREVIEW_LENGTH),
        },
    }
}

/// Formats JSON parsing context by including a preview of the raw JSON.
///
/// # Returns
///
/// A formatted error message with JSON preview (first 200 chars)
pub fn format_json_parse_error(json_str: &str, error: serde_json::Error) -> String {
    let preview = truncate_for_context(json_str, ERROR_BODY_PREVIEW_LENGTH);
    format!("JSON parse error: {} | Context: {}", error, preview)
}

/// Truncates a string to specified length, adding "..." if truncated.
///
/// Uses character-boundary-aware slicing to prevent panics on multi-byte UTF-8 characters.
pub fn truncate_for_context(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        // The last character kept must END at or before max_len
        let truncate_at = s
            .char_indices()
            .take_while(|(i, c)| i + c.len_utf8() <= max_len)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &s[..truncate_at])
    }
}
