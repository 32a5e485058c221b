//! Tolerant JSON extraction from model replies
//!
//! Models like to wrap their JSON in chatter ("Sure! Here you go: ...") or
//! markdown fences. We take everything from the first opening bracket to the
//! last closing one and hand that span to serde_json. Nothing smarter: a reply
//! with two separate JSON values in it fails to parse, and that is fine.

use crate::error::ExtractError;
use serde_json::{Map, Value};

/// Slice `text` from the first `open` to the last `close`, inclusive
fn bracketed(text: &str, open: char, close: char) -> Result<&str, ExtractError> {
    let start = text.find(open).ok_or(ExtractError::MissingOpen(open))?;
    let end = text.rfind(close).ok_or(ExtractError::MissingClose(close))?;
    if end < start {
        return Err(ExtractError::Inverted { open, close });
    }
    Ok(&text[start..=end])
}

/// Extract the JSON array embedded in `text`
pub fn extract_json_array(text: &str) -> Result<Vec<Value>, ExtractError> {
    let span = bracketed(text, '[', ']')?;
    Ok(serde_json::from_str(span)?)
}

/// Extract the JSON object embedded in `text`
pub fn extract_json_object(text: &str) -> Result<Map<String, Value>, ExtractError> {
    let span = bracketed(text, '{', '}')?;
    Ok(serde_json::from_str(span)?)
}
