//! Prompt and response-schema construction.
//!
//! Both are pure functions of the [`GenerationRequest`]: the same theme and
//! mode always produce the same prompt text and schema.

use crate::backend::{CompletionRequest, ResponseSchema};
use crate::invention::{GenerationRequest, HazardLevel, Mode};
use serde_json::json;

const STYLE_LINE: &str = "Generate a wacky, over-engineered machine idea strictly following the \
'Pigs at Work' workshop style: clumsy pig engineers, absurd contraptions, and \
far too many moving parts for a simple job.";

const WORKSHOP_PALETTE: &str =
    "Workshop materials: polished wood, metal rivets, pressurized pipes, and unstable TNT.";

const PREMIUM_PALETTE: &str = "This is a PREMIUM ROYAL GOLD blueprint. Make it exceptionally \
fancy, using gold plating, royal velvet, and excessive luxury components while remaining \
absurd and clumsy.";

/// Rarity values the backend is asked to choose from in `mode`.
#[must_use]
pub const fn requested_rarities(mode: Mode) -> &'static [&'static str] {
    match mode {
        Mode::Standard => &["Standard"],
        Mode::Premium => &["Royal Gold", "Legendary"],
    }
}

fn rarity_instruction(mode: Mode) -> String {
    match requested_rarities(mode) {
        [only] => format!("Set rarity to '{only}'."),
        choices => {
            let quoted: Vec<String> = choices.iter().map(|c| format!("'{c}'")).collect();
            format!("Set rarity to one of {}.", quoted.join(" or "))
        }
    }
}

fn hazard_names() -> Vec<&'static str> {
    HazardLevel::ALL.iter().map(|h| h.as_str()).collect()
}

/// Builds the prompt text for `request`.
///
/// ```
/// use contraption_rs::{GenerationRequest, Mode};
/// use contraption_rs::prompt::build_prompt;
///
/// let prompt = build_prompt(&GenerationRequest::new(Mode::Premium).with_theme("tea party"));
/// assert!(prompt.contains("gold plating"));
/// assert!(prompt.contains("Specific Theme: tea party"));
/// ```
#[must_use]
pub fn build_prompt(request: &GenerationRequest) -> String {
    let mode = request.mode();
    let mut lines = vec![STYLE_LINE.to_string()];

    if mode.is_premium() {
        lines.push(PREMIUM_PALETTE.to_string());
    }
    lines.push(WORKSHOP_PALETTE.to_string());

    if let Some(theme) = request.theme() {
        lines.push(format!("Specific Theme: {theme}"));
    }

    lines.push(format!(
        "Set hazardLevel to one of: {}.",
        hazard_names().join(", ")
    ));
    lines.push(rarity_instruction(mode));
    lines.push("Return as JSON.".to_string());

    lines.join("\n")
}

/// Builds the response schema for `mode`.
///
/// `rarity` is declared but not required; its description and enum follow the
/// mode. Everything else is required.
#[must_use]
pub fn invention_schema(mode: Mode) -> ResponseSchema {
    let rarities = requested_rarities(mode);

    ResponseSchema::new(json!({
        "type": "OBJECT",
        "properties": {
            "name": { "type": "STRING" },
            "description": { "type": "STRING" },
            "components": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            },
            "hazardLevel": {
                "type": "STRING",
                "format": "enum",
                "enum": hazard_names(),
                "description": format!("One of: {}", hazard_names().join(", "))
            },
            "blueprintCode": { "type": "STRING" },
            "rarity": {
                "type": "STRING",
                "format": "enum",
                "enum": rarities,
                "description": format!("Must be {}", rarities.join(" or "))
            }
        },
        "required": ["name", "description", "components", "hazardLevel", "blueprintCode"]
    }))
}

/// Assembles the full backend request for `request`.
#[must_use]
pub fn completion_request(request: &GenerationRequest) -> CompletionRequest {
    CompletionRequest {
        prompt: build_prompt(request),
        schema: invention_schema(request.mode()),
    }
}
