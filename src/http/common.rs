/// Represents the API version to target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    /// V1 Beta API version (current)
    V1Beta,
}

impl ApiVersion {
    const fn as_str(self) -> &'static str {
        match self {
            Self::V1Beta => "v1beta",
        }
    }
}

/// Production endpoint of the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Header name for API key authentication.
///
/// Keys travel in a header rather than the `key=` query parameter so they do
/// not show up in URLs, proxy logs or error messages.
pub const API_KEY_HEADER: &str = "X-Goog-Api-Key";

/// Constructs the `generateContent` URL for `model` under `base_url`.
///
/// A trailing slash on `base_url` is ignored and the model name is
/// percent-encoded so that it cannot alter the path.
#[must_use]
pub fn generate_content_url(base_url: &str, model: &str, version: ApiVersion) -> String {
    format!(
        "{}/{}/models/{}:generateContent",
        base_url.trim_end_matches('/'),
        version.as_str(),
        urlencoding::encode(model)
    )
}
