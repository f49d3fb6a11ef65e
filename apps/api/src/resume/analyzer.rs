//! Résumé Analyzer: turns extracted document text into a `CandidateProfile`.
//!
//! Flow: truncate → model prompt → decode → (heuristics if nothing decoded) → backfill.
//! Always returns a complete profile; model failures never reach the caller.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use crate::llm_client::decoder::{request_record, Decoded};
use crate::llm_client::TextGenerator;
use crate::models::profile::{
    dedup_preserving_order, split_list, CandidateProfile, DEFAULT_EXPERIENCE, DEFAULT_SUMMARY,
};
use crate::resume::prompts::{RESUME_ANALYSIS_PROMPT_TEMPLATE, RESUME_ANALYSIS_SYSTEM};

/// Only this many characters of the résumé are sent to the model.
pub const MAX_PROMPT_CHARS: usize = 6000;
const SUMMARY_LINES: usize = 3;
const SUMMARY_MAX_CHARS: usize = 300;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid email regex")
});
static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+?\d[\d\s\-()]{8,}").expect("valid phone regex"));
static SKILLS_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)skills\s*[:\-]?\s*(.+)").expect("valid skills regex"));

pub async fn analyze_resume(
    generator: &dyn TextGenerator,
    document_text: &str,
) -> CandidateProfile {
    let prompt = build_analysis_prompt(document_text);

    match request_record(
        generator,
        Some(RESUME_ANALYSIS_SYSTEM),
        &prompt,
        "resume analysis",
    )
    .await
    {
        Decoded::Record(record) => CandidateProfile::from_record(&record),
        Decoded::UseDefault => {
            info!("model produced no usable profile; using heuristic extraction");
            heuristic_profile(document_text)
        }
    }
}

fn build_analysis_prompt(document_text: &str) -> String {
    let truncated: String = document_text.chars().take(MAX_PROMPT_CHARS).collect();
    RESUME_ANALYSIS_PROMPT_TEMPLATE.replace("{resume_text}", &truncated)
}

/// Deterministic extraction straight from the document text.
pub fn heuristic_profile(text: &str) -> CandidateProfile {
    let email = EMAIL.find(text).map(|m| m.as_str().to_string());
    let phone = PHONE.find(text).map(|m| m.as_str().trim().to_string());
    let skills = SKILLS_LINE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| dedup_preserving_order(split_list(m.as_str())))
        .unwrap_or_default();

    CandidateProfile {
        name: None,
        email,
        phone,
        experience_years: DEFAULT_EXPERIENCE.to_string(),
        skills,
        education: None,
        previous_roles: vec![],
        key_projects: vec![],
        summary: heuristic_summary(text),
    }
}

fn heuristic_summary(text: &str) -> String {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(SUMMARY_LINES)
        .collect();

    if lines.is_empty() {
        return DEFAULT_SUMMARY.to_string();
    }
    lines.join(" ").chars().take(SUMMARY_MAX_CHARS).collect()
}
