//! Pull a validated `(category, priority)` pair out of raw model text.
//!
//! Accepted shapes, tried in order:
//! 1. the whole text is the JSON object
//! 2. the object sits inside a fenced code block
//! 3. the object follows free-form reasoning and is located by scanning

use super::prompt::CATEGORY_FIELD;
use super::{Category, Priority};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No usable JSON object, malformed JSON, or a missing field.
    #[error("Malformed model response: {0}")]
    Malformed(String),
    /// Well-formed JSON carrying a value outside the closed label sets.
    #[error("Invalid label in model response: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
struct ModelVerdict {
    suggested_category: String,
    suggested_priority: String,
}

/// Single-level object mentioning the category field.
static INLINE_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r#"\{{[^{{}}]*"{CATEGORY_FIELD}"[^{{}}]*\}}"#))
        .expect("inline object pattern is a valid regex")
});

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n?(.*?)```").expect("fence pattern is a valid regex")
});

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn deserialize(candidate: &str) -> Result<ModelVerdict, ParseError> {
    serde_json::from_str(candidate).map_err(|e| {
        ParseError::Malformed(format!(
            "JSON parse error: {e}. Input: {}",
            truncate(candidate, 200)
        ))
    })
}

/// Try the text as a whole object, then scan it for an inline one.
fn locate_in(text: &str) -> Result<ModelVerdict, ParseError> {
    let trimmed = text.trim();
    let whole = if trimmed.starts_with('{') {
        deserialize(trimmed)
    } else {
        Err(ParseError::Malformed(format!(
            "No JSON object at start of: {}",
            truncate(trimmed, 200)
        )))
    };

    whole.or_else(|first_err| match INLINE_OBJECT.find(trimmed) {
        Some(m) => deserialize(m.as_str()),
        None => Err(first_err),
    })
}

fn locate_verdict(raw: &str) -> Result<ModelVerdict, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Malformed("Empty response".to_owned()));
    }

    // Shape 1
    if trimmed.starts_with('{') {
        if let Ok(verdict) = deserialize(trimmed) {
            return Ok(verdict);
        }
    }

    // Shape 2
    if let Some(inner) = FENCED_BLOCK
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
    {
        if let Ok(verdict) = locate_in(inner.as_str()) {
            return Ok(verdict);
        }
    }

    // Shape 3
    locate_in(trimmed)
}

/// Extract and validate the model's answer.
pub fn parse_response(raw: &str) -> Result<(Category, Priority), ParseError> {
    let verdict = locate_verdict(raw)?;

    let category = verdict
        .suggested_category
        .parse::<Category>()
        .map_err(|e| ParseError::Invalid(e.to_string()))?;
    let priority = verdict
        .suggested_priority
        .parse::<Priority>()
        .map_err(|e| ParseError::Invalid(e.to_string()))?;

    Ok((category, priority))
}
