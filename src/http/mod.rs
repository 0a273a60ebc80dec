//! HTTP layer for the Gemini `generateContent` backend.
//!
//! Only [`GeminiBackend`](gemini::GeminiBackend) is public; URL construction,
//! error extraction and wire logging are implementation details.

pub(crate) mod common;
pub(crate) mod error_helpers;
pub mod gemini;
pub(crate) mod loud_wire;
