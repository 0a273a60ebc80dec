//! Request and result types for invention generation.
//!
//! [`Invention`] can only be obtained through [`Invention::from_json`], which
//! validates the whole body up front. There is no way to observe a partially
//! valid invention.

use crate::errors::ForgeError;
use crate::http::error_helpers::format_json_parse_error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generation palette. Changes the prompt and requested rarity, never the
/// transport or retry behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Standard,
    /// Luxury palette ("Royal Gold" blueprints).
    Premium,
}

impl Mode {
    #[must_use]
    pub const fn from_premium_flag(is_premium_mode: bool) -> Self {
        if is_premium_mode {
            Self::Premium
        } else {
            Self::Standard
        }
    }

    #[must_use]
    pub const fn is_premium(self) -> bool {
        matches!(self, Self::Premium)
    }
}

/// How dangerous the invention is to operate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HazardLevel {
    Low,
    Medium,
    Extreme,
    #[serde(rename = "Literal Explosion")]
    CriticalFailure,
}

impl HazardLevel {
    pub const ALL: [HazardLevel; 4] = [
        HazardLevel::Low,
        HazardLevel::Medium,
        HazardLevel::Extreme,
        HazardLevel::CriticalFailure,
    ];

    /// Wire representation, as requested from and returned by the backend.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::Extreme => "Extreme",
            Self::CriticalFailure => "Literal Explosion",
        }
    }
}

impl fmt::Display for HazardLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Blueprint rarity.
///
/// The backend is asked for a mode-specific subset but is not trusted to
/// comply, and the value is not restricted client-side: strings outside the
/// known set are kept verbatim in [`Rarity::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Rarity {
    Standard,
    /// Wire value `"Royal Gold"`; `"Premium"` is accepted on input.
    Premium,
    Legendary,
    Unknown(String),
}

impl Rarity {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Standard => "Standard",
            Self::Premium => "Royal Gold",
            Self::Legendary => "Legendary",
            Self::Unknown(other) => other,
        }
    }

    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

impl From<String> for Rarity {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Standard" => Self::Standard,
            "Royal Gold" | "Premium" => Self::Premium,
            "Legendary" => Self::Legendary,
            _ => Self::Unknown(value),
        }
    }
}

impl From<Rarity> for String {
    fn from(value: Rarity) -> Self {
        match value {
            Rarity::Unknown(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input of a single `generate` call.
///
/// ```
/// use contraption_rs::{GenerationRequest, Mode};
///
/// let request = GenerationRequest::new(Mode::Premium).with_theme("  breakfast ");
/// assert_eq!(request.theme(), Some("breakfast"));
///
/// // Blank themes mean "no theme constraint"
/// let request = GenerationRequest::new(Mode::Standard).with_theme("   ");
/// assert_eq!(request.theme(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationRequest {
    theme: Option<String>,
    mode: Mode,
}

impl GenerationRequest {
    #[must_use]
    pub const fn new(mode: Mode) -> Self {
        Self { theme: None, mode }
    }

    /// Builds a request from the caller-facing `(theme, is_premium_mode)` pair.
    #[must_use]
    pub fn from_parts(theme: Option<&str>, is_premium_mode: bool) -> Self {
        let request = Self::new(Mode::from_premium_flag(is_premium_mode));
        match theme {
            Some(theme) => request.with_theme(theme),
            None => request,
        }
    }

    /// Sets the theme hint. Leading and trailing whitespace is trimmed and a
    /// blank theme clears it.
    #[must_use]
    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        let theme = theme.into();
        let trimmed = theme.trim();
        self.theme = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    #[must_use]
    pub fn theme(&self) -> Option<&str> {
        self.theme.as_deref()
    }

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }
}

/// Wire shape of the backend's JSON body.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InventionBody {
    name: String,
    description: String,
    components: Vec<String>,
    hazard_level: HazardLevel,
    #[serde(default)]
    blueprint_code: Option<String>,
    // Accepted spelling of `blueprintCode`, which wins when both are present
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    rarity: Option<Rarity>,
}

/// A validated invention. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invention {
    name: String,
    description: String,
    components: Vec<String>,
    hazard_level: HazardLevel,
    #[serde(rename = "blueprintCode")]
    code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    rarity: Option<Rarity>,
}

impl Invention {
    /// Parses and validates a backend body.
    ///
    /// # Errors
    ///
    /// - [`ForgeError::EmptyResponse`] if the body is empty or blank
    /// - [`ForgeError::SchemaViolation`] if the body is not JSON, misses a
    ///   required field, has a field of the wrong type, has a `hazardLevel`
    ///   outside its enum, has no components, or has an empty blueprint code
    ///
    /// ```
    /// use contraption_rs::{ForgeError, HazardLevel, Invention};
    ///
    /// let invention = Invention::from_json(r#"{
    ///     "name": "Toast-o-Tron",
    ///     "description": "Launches bread into orbit.",
    ///     "components": ["spring", "TNT"],
    ///     "hazardLevel": "Extreme",
    ///     "blueprintCode": "PIG-001"
    /// }"#).unwrap();
    /// assert_eq!(invention.hazard_level(), HazardLevel::Extreme);
    /// assert!(invention.rarity().is_none());
    ///
    /// let err = Invention::from_json(r#"{"name": "half a machine"}"#).unwrap_err();
    /// assert!(matches!(err, ForgeError::SchemaViolation(_)));
    /// ```
    pub fn from_json(body: &str) -> Result<Self, ForgeError> {
        if body.trim().is_empty() {
            return Err(ForgeError::EmptyResponse);
        }

        let parsed: InventionBody = serde_json::from_str(body)
            .map_err(|e| ForgeError::SchemaViolation(format_json_parse_error(body, e)))?;

        if parsed.components.is_empty() {
            return Err(ForgeError::SchemaViolation(
                "components must contain at least one entry".to_string(),
            ));
        }

        let Some(code) = parsed.blueprint_code.or(parsed.code) else {
            return Err(ForgeError::SchemaViolation(
                "missing field `blueprintCode`".to_string(),
            ));
        };

        if code.trim().is_empty() {
            return Err(ForgeError::SchemaViolation(
                "blueprintCode must be a non-empty string".to_string(),
            ));
        }

        Ok(Self {
            name: parsed.name,
            description: parsed.description,
            components: parsed.components,
            hazard_level: parsed.hazard_level,
            code,
            rarity: parsed.rarity,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Components in the order the backend listed them. Never empty.
    #[must_use]
    pub fn components(&self) -> &[String] {
        &self.components
    }

    #[must_use]
    pub const fn hazard_level(&self) -> HazardLevel {
        self.hazard_level
    }

    /// Opaque blueprint identifier. Never empty.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub const fn rarity(&self) -> Option<&Rarity> {
        self.rarity.as_ref()
    }
}
