//! Wire-level debugging via the `LOUD_WIRE` environment variable.
//!
//! When `LOUD_WIRE` is set to any value, raw JSON of backend requests and
//! responses is printed to stderr with pretty formatting and colors:
//!
//! ```bash
//! LOUD_WIRE=1 cargo run --example generate_invention -- "kitchen"
//! ```
//!
//! - Green `>>>` for outgoing requests
//! - Red `<<<` for incoming responses
//! - Timestamps and request IDs for correlation across retries

use super::error_helpers::truncate_for_context;
use colored::Colorize;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Request ID counter for correlating requests with responses
static REQUEST_COUNTER: AtomicUsize = AtomicUsize::new(1);

/// Cached check for whether LOUD_WIRE is enabled
static ENABLED: OnceLock<bool> = OnceLock::new();

/// Strings longer than this are shortened in dumps.
const TRUNCATE_THRESHOLD: usize = 400;

/// Non-JSON bodies are cut at this length.
const RAW_BODY_LIMIT: usize = 1000;

/// Check if LOUD_WIRE debugging is enabled.
///
/// The result is cached after the first check, so `LOUD_WIRE` must be set
/// before the first backend call.
#[must_use]
pub fn is_enabled() -> bool {
    *ENABLED.get_or_init(|| std::env::var("LOUD_WIRE").is_ok())
}

/// Get the next request ID for correlation.
#[must_use]
pub fn next_request_id() -> usize {
    REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Shortens every string value in `value` longer than the threshold.
fn truncate_long_strings(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::String(s) if s.len() > TRUNCATE_THRESHOLD => {
            *s = truncate_for_context(s, TRUNCATE_THRESHOLD);
        }
        serde_json::Value::Object(map) => map.values_mut().for_each(truncate_long_strings),
        serde_json::Value::Array(items) => items.iter_mut().for_each(truncate_long_strings),
        _ => {}
    }
}

fn timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Log prefix with timestamp and request ID.
fn prefix(request_id: usize) -> String {
    format!(
        "{} {} {}",
        "[LOUD_WIRE]".bold(),
        timestamp().dimmed(),
        format!("[REQ#{}]", request_id).cyan()
    )
}

/// Prints `body` as colored JSON if it parses, raw (truncated) otherwise.
fn dump_body(prefix: &str, label: &str, body: &str) {
    let Ok(mut parsed) = serde_json::from_str::<serde_json::Value>(body) else {
        let raw = truncate_for_context(body, RAW_BODY_LIMIT);
        eprintln!("{prefix} {label}: {raw}");
        return;
    };

    truncate_long_strings(&mut parsed);
    eprintln!("{prefix} {label}:");
    let rendered = colored_json::to_colored_json_auto(&parsed)
        .ok()
        .or_else(|| serde_json::to_string_pretty(&parsed).ok());
    if let Some(rendered) = rendered {
        for line in rendered.lines() {
            eprintln!("{prefix} {line}");
        }
    }
}

/// Log an outgoing HTTP request.
pub fn log_request(request_id: usize, method: &str, url: &str, body: Option<&str>) {
    if !is_enabled() {
        return;
    }

    let prefix = prefix(request_id);
    eprintln!("{prefix} {} {method} {url}", ">>>".green().bold());

    if let Some(body) = body {
        dump_body(&prefix, &"Body".green().to_string(), body);
    }
}

/// Log an incoming HTTP response status.
pub fn log_response_status(request_id: usize, status: u16) {
    if !is_enabled() {
        return;
    }

    let status_text = if status < 300 {
        format!("{status} OK").green()
    } else {
        format!("{status} ERROR").red()
    };
    eprintln!("{} {} {status_text}", prefix(request_id), "<<<".red().bold());
}

/// Log an incoming HTTP response body.
pub fn log_response_body(request_id: usize, body: &str) {
    if !is_enabled() {
        return;
    }

    dump_body(&prefix(request_id), &"Response".red().to_string(), body);
}
