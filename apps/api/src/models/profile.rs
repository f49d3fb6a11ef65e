use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm_client::decoder::Record;

pub const DEFAULT_EXPERIENCE: &str = "0-1";
pub const DEFAULT_SUMMARY: &str = "Resume parsed";

/// Normalized résumé data. Every field is always present: scalars may be
/// `None`, lists are empty at worst.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub experience_years: String,
    pub skills: Vec<String>,
    pub education: Option<String>,
    pub previous_roles: Vec<String>,
    pub key_projects: Vec<String>,
    pub summary: String,
}

impl Default for CandidateProfile {
    fn default() -> Self {
        Self {
            name: None,
            email: None,
            phone: None,
            experience_years: DEFAULT_EXPERIENCE.to_string(),
            skills: vec![],
            education: None,
            previous_roles: vec![],
            key_projects: vec![],
            summary: DEFAULT_SUMMARY.to_string(),
        }
    }
}

impl CandidateProfile {
    /// Builds a profile from an untrusted record, backfilling absent keys and
    /// coercing values of the wrong JSON type instead of rejecting them.
    pub fn from_record(record: &Record) -> Self {
        let field = |key: &str| record.get(key).unwrap_or(&Value::Null);

        Self {
            name: optional_text(field("name")),
            email: optional_text(field("email")),
            phone: optional_text(field("phone")),
            experience_years: optional_text(field("experience_years"))
                .unwrap_or_else(|| DEFAULT_EXPERIENCE.to_string()),
            skills: dedup_preserving_order(text_list(field("skills"))),
            education: optional_text(field("education")),
            previous_roles: text_list(field("previous_roles")),
            key_projects: text_list(field("key_projects")),
            summary: optional_text(field("summary")).unwrap_or_else(|| DEFAULT_SUMMARY.to_string()),
        }
    }

    /// Same as `from_record` for an arbitrary JSON value; non-objects yield the default.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(record) => Self::from_record(record),
            _ => Self::default(),
        }
    }
}

/// Non-blank strings and numbers become text; everything else is absent.
fn optional_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Arrays keep their textual items; a bare string is split like a skills line.
fn text_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(optional_text).collect(),
        Value::String(s) => split_list(s),
        _ => vec![],
    }
}

/// Splits on commas, semicolons and newlines, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split([',', ';', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
