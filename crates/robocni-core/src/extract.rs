//! Extraction of the configuration payload from a free-text model reply.
//!
//! The first fence marker opens the block and the *last* one closes it, so
//! fences the model repeats in explanatory prose before the real block do
//! not truncate the payload. An info string directly after the opening
//! fence (```` ```json ````) is skipped.

use serde_json::{Map, Value};

use crate::error::ExtractError;

const FENCE: &str = "```";

/// A payload accepted by [`extract`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedConfig {
    /// The JSON text between the fences, trimmed.
    pub config_text: String,
    /// Value of the top-level `name` field.
    pub name: String,
}

/// Extract and validate the fenced JSON object in `reply`.
pub fn extract(reply: &str) -> Result<ExtractedConfig, ExtractError> {
    let open = reply.find(FENCE).ok_or(ExtractError::NoCodeBlock)?;
    let close = reply.rfind(FENCE).ok_or(ExtractError::NoCodeBlock)?;

    // Overlapping markers ("````") collapse to a single fence.
    if close < open + FENCE.len() {
        return Err(ExtractError::NoCodeBlock);
    }

    let body_start = skip_info_string(reply, open + FENCE.len(), close);
    let span = reply[body_start..close].trim();

    let object: Map<String, Value> =
        serde_json::from_str(span).map_err(|e| ExtractError::InvalidPayload(e.to_string()))?;

    let name = object
        .get("name")
        .and_then(Value::as_str)
        .ok_or(ExtractError::MissingName)?;

    Ok(ExtractedConfig {
        config_text: span.to_string(),
        name: name.to_string(),
    })
}

/// Position after a language tag that immediately follows the opening fence.
fn skip_info_string(reply: &str, from: usize, limit: usize) -> usize {
    let tag_len = reply[from..limit]
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(limit - from);
    from + tag_len
}
