use crate::errors::ForgeError;
use crate::generator::Generator;
use crate::http::gemini::GeminiBackend;
use crate::invention::{GenerationRequest, Invention, Mode};
use crate::retry::RetryPolicy;
use reqwest::Client as ReqwestClient;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Gemini-backed invention client.
///
/// All configuration is supplied through [`Client::builder`]; nothing is read
/// from the environment. Cloning is cheap and clones share the connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    generator: Generator<GeminiBackend>,
}

/// Builder for `Client` instances.
///
/// # Example
///
/// ```
/// use contraption_rs::{Client, RetryPolicy};
/// use std::time::Duration;
///
/// let client = Client::builder("api_key".to_string())
///     .model("gemini-2.5-flash")
///     .timeout(Duration::from_secs(60))
///     .connect_timeout(Duration::from_secs(10))
///     .retry_policy(RetryPolicy::default().with_max_attempts(3))
///     .build()
///     .unwrap();
/// assert_eq!(client.model(), "gemini-2.5-flash");
/// ```
#[derive(Debug)]
pub struct ClientBuilder {
    api_key: String,
    model: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    retry_policy: RetryPolicy,
}

impl ClientBuilder {
    /// Sets the Gemini model. Defaults to
    /// [`DEFAULT_MODEL`](crate::http::gemini::DEFAULT_MODEL).
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Overrides the API host, e.g. for a proxy or a mock server.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the total request timeout for each backend round trip.
    ///
    /// This covers connecting, sending the request and receiving the response
    /// of a single attempt; backoff waits are not included.
    ///
    /// If not set, uses reqwest's default (no timeout).
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// If not set, uses reqwest's default.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Builds the `Client`.
    ///
    /// # Errors
    ///
    /// - [`ForgeError::InvalidInput`] if the API key is blank
    /// - [`ForgeError::ClientBuild`] if the HTTP client cannot be created
    pub fn build(self) -> Result<Client, ForgeError> {
        if self.api_key.trim().is_empty() {
            return Err(ForgeError::InvalidInput(
                "API key must not be empty".to_string(),
            ));
        }

        let mut builder = ReqwestClient::builder();

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        let http_client = builder
            .build()
            .map_err(|e| ForgeError::ClientBuild(e.to_string()))?;

        let mut backend = GeminiBackend::from_parts(http_client, self.api_key, self.timeout);
        if let Some(model) = self.model {
            backend = backend.with_model(model);
        }
        if let Some(base_url) = self.base_url {
            backend = backend.with_base_url(base_url);
        }

        Ok(Client {
            generator: Generator::new(backend).with_retry_policy(self.retry_policy),
        })
    }
}

impl Client {
    /// Creates a new builder for `Client` instances.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Your Google AI API key.
    #[must_use]
    pub fn builder(api_key: String) -> ClientBuilder {
        ClientBuilder {
            api_key,
            model: None,
            base_url: None,
            timeout: None,
            connect_timeout: None,
            retry_policy: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn model(&self) -> &str {
        self.generator.backend().model()
    }

    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        self.generator.retry_policy()
    }

    /// The underlying backend-agnostic generator.
    #[must_use]
    pub const fn generator(&self) -> &Generator<GeminiBackend> {
        &self.generator
    }

    /// Generates one invention.
    ///
    /// `theme` is an optional free-text hint; `is_premium_mode` switches to the
    /// luxury palette.
    ///
    /// # Errors
    ///
    /// See [`Generator::generate`].
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use contraption_rs::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = Client::builder("api_key".to_string()).build()?;
    ///
    /// let invention = client.generate(Some("breakfast"), false).await?;
    /// println!("{} ({})", invention.name(), invention.hazard_level());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn generate(
        &self,
        theme: Option<&str>,
        is_premium_mode: bool,
    ) -> Result<Invention, ForgeError> {
        self.generator
            .generate(theme, Mode::from_premium_flag(is_premium_mode))
            .await
    }

    /// Generates one invention for a prepared request.
    ///
    /// # Errors
    ///
    /// See [`Generator::generate`].
    pub async fn generate_request(
        &self,
        request: &GenerationRequest,
    ) -> Result<Invention, ForgeError> {
        self.generator.generate_request(request).await
    }

    /// Generates one invention, abandoning the call when `token` is cancelled.
    ///
    /// # Errors
    ///
    /// See [`Generator::generate_cancellable`].
    pub async fn generate_cancellable(
        &self,
        request: &GenerationRequest,
        token: &CancellationToken,
    ) -> Result<Invention, ForgeError> {
        self.generator.generate_cancellable(request, token).await
    }
}
