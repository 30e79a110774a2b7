//! Tolerant JSON decoding for model output.
//!
//! Models wrap JSON in prose or code fences often enough that a plain
//! `serde_json::from_str` is not good enough. Strategies run in order and the
//! first one that yields a value wins.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
#[error("no decoding strategy produced valid JSON")]
pub struct DecodeError;

type Strategy = fn(&str) -> Option<Value>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("direct", parse_direct),
    ("strip_fences", parse_without_fences),
    ("brace_span", parse_brace_span),
    ("bracket_span", parse_bracket_span),
];

/// Decodes the first JSON value recoverable from `text`.
pub fn decode_json(text: &str) -> Result<Value, DecodeError> {
    for (name, strategy) in STRATEGIES {
        if let Some(value) = strategy(text) {
            debug!("Decoded completion output with strategy '{name}'");
            return Ok(value);
        }
    }
    Err(DecodeError)
}

/// Like [`decode_json`], but only accepts a JSON object.
pub fn decode_object(text: &str) -> Result<serde_json::Map<String, Value>, DecodeError> {
    match decode_json(text)? {
        Value::Object(map) => Ok(map),
        _ => Err(DecodeError),
    }
}

fn parse_direct(text: &str) -> Option<Value> {
    serde_json::from_str(text.trim()).ok()
}

fn parse_without_fences(text: &str) -> Option<Value> {
    serde_json::from_str(strip_json_fences(text)).ok()
}

fn parse_brace_span(text: &str) -> Option<Value> {
    static BRACE_SPAN: OnceLock<Regex> = OnceLock::new();
    let re = BRACE_SPAN.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("static regex"));
    re.find(text)
        .and_then(|m| serde_json::from_str(m.as_str()).ok())
}

fn parse_bracket_span(text: &str) -> Option<Value> {
    static BRACKET_SPAN: OnceLock<Regex> = OnceLock::new();
    let re = BRACKET_SPAN.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("static regex"));
    re.find(text)
        .and_then(|m| serde_json::from_str(m.as_str()).ok())
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = if let Some(stripped) = text.strip_prefix("```json") {
        stripped
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
    } else {
        text
    };
    let inner = inner.trim();
    inner.strip_suffix("```").map(str::trim).unwrap_or(inner)
}
