//! Structured-response decoder.
//!
//! Recovers a single JSON object from free-form model output. Strategies run in
//! order and the first one that yields an object wins:
//!
//! 1. the whole (trimmed) text parses as an object
//! 2. the first fenced code block (```` ``` ```` or ```` ```json ````) parses as an object
//! 3. the span from the first `{` to the last `}` parses as an object
//!
//! Arrays and scalars are failures. Nothing here ever returns an error: the
//! caller gets either a record or an explicit "use your default" signal.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::llm_client::{ModelReply, TextGenerator};

/// A decoded model record. Key-level validation is the caller's job.
pub type Record = Map<String, Value>;

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)```(?:json)?\s*([\s\S]*?)```").expect("valid fence regex"));

type Strategy = fn(&str) -> Option<Record>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("direct", parse_object),
    ("fenced", fenced_block),
    ("brace_span", brace_span),
];

/// Outcome of a decode attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Record(Record),
    UseDefault,
}

impl Decoded {
    pub fn or(self, default: Record) -> Record {
        match self {
            Decoded::Record(record) => record,
            Decoded::UseDefault => default,
        }
    }

    pub fn into_record(self) -> Option<Record> {
        match self {
            Decoded::Record(record) => Some(record),
            Decoded::UseDefault => None,
        }
    }
}

/// Parses `text` (trimmed) and accepts it only if the top-level value is an object.
pub fn parse_object(text: &str) -> Option<Record> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Parses the contents of the first fenced code block.
pub fn fenced_block(text: &str) -> Option<Record> {
    let captures = FENCED_BLOCK.captures(text)?;
    parse_object(captures.get(1)?.as_str())
}

/// Parses the substring between the first `{` and the last `}`.
pub fn brace_span(text: &str) -> Option<Record> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start >= end {
        return None;
    }
    parse_object(&text[start..=end])
}

pub fn try_decode(raw: &str) -> Decoded {
    let raw = raw.trim();
    if raw.is_empty() {
        return Decoded::UseDefault;
    }
    for (name, strategy) in STRATEGIES {
        if let Some(record) = strategy(raw) {
            debug!(strategy = name, keys = record.len(), "decoded model record");
            return Decoded::Record(record);
        }
    }
    Decoded::UseDefault
}

/// Decodes `raw`, handing back `default` untouched when no object can be recovered.
pub fn decode(raw: &str, default: Record) -> Record {
    try_decode(raw).or(default)
}

/// Runs one model call and decodes the reply.
///
/// Transport errors, blocked or empty replies, and unparseable text all come
/// back as `Decoded::UseDefault`; each is logged with `purpose` for context.
pub async fn request_record(
    generator: &dyn TextGenerator,
    instruction: Option<&str>,
    prompt: &str,
    purpose: &str,
) -> Decoded {
    let text = match generator.generate(instruction, prompt).await {
        Ok(ModelReply::Text(text)) => text,
        Ok(ModelReply::Blocked { reason }) => {
            warn!(purpose, reason = %reason, "model reply blocked or empty");
            return Decoded::UseDefault;
        }
        Err(e) => {
            warn!(purpose, error = %e, "model call failed");
            return Decoded::UseDefault;
        }
    };

    let decoded = try_decode(&text);
    if decoded == Decoded::UseDefault {
        warn!(
            purpose,
            preview = %text.chars().take(120).collect::<String>(),
            "model reply contained no JSON object"
        );
    }
    decoded
}

/// `request_record` resolved against a caller-supplied default.
pub async fn generate_record(
    generator: &dyn TextGenerator,
    instruction: Option<&str>,
    prompt: &str,
    purpose: &str,
    default: Record,
) -> Record {
    request_record(generator, instruction, prompt, purpose)
        .await
        .or(default)
}
