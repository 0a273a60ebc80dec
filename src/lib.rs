//! # contraption-rs
//!
//! A resilient structured-generation client. It asks a generative text backend
//! (Gemini by default) for a short, absurd, over-engineered invention, retries
//! rate-limited calls with exponential backoff and jitter, and validates the
//! JSON it gets back before handing it to the caller.
//!
//! ## Quick Start
//!
//! ```no_run
//! use contraption_rs::Client;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::builder("your-api-key".to_string()).build()?;
//!
//! let invention = client.generate(Some("breakfast"), false).await?;
//! println!("{}: {}", invention.name(), invention.description());
//! for component in invention.components() {
//!     println!("  - {component}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Other Backends
//!
//! [`Generator`] works with anything implementing [`StructuredCompletion`].
//! Map your backend's failures onto [`BackendError`] so the retry policy can
//! recognise rate limits.
//!
//! ## Error Handling
//!
//! | Error | Retried automatically | Ask the user to retry |
//! |-------|-----------------------|-----------------------|
//! | [`ForgeError::TransientBackendFailure`] | yes, until the budget is spent | yes |
//! | [`ForgeError::EmptyResponse`] | no | yes |
//! | [`ForgeError::SchemaViolation`] | no | yes |
//! | [`ForgeError::FatalBackendFailure`] | no | only for network/5xx |
//!
//! See [`ForgeError::is_user_retryable`].
//!
//! ## Debugging
//!
//! Set `LOUD_WIRE=1` to dump every request and response to stderr.

pub mod backend;
pub mod client;
pub mod errors;
pub mod generator;
pub mod http;
pub mod invention;
pub mod prompt;
pub mod retry;

pub use backend::{CompletionRequest, ResponseSchema, StructuredCompletion};
pub use client::{Client, ClientBuilder};
pub use errors::{BackendError, ForgeError};
pub use generator::Generator;
pub use http::gemini::{DEFAULT_MODEL, GeminiBackend};
pub use invention::{GenerationRequest, HazardLevel, Invention, Mode, Rarity};
pub use retry::{RateLimitSignal, RetryFailure, RetryPolicy};

// Token type taken by the `*_cancellable` methods
pub use tokio_util::sync::CancellationToken;
