//! Session aggregation: final score and the coaching summary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::interview::prompts::{
    fill_template, IMPROVEMENT_PROMPT_TEMPLATE, INTERVIEWER_SYSTEM,
};
use crate::llm_client::decoder::generate_record;
use crate::llm_client::TextGenerator;
use crate::models::interview::InterviewSession;

pub const DEFAULT_OVERALL_ADVICE: &str =
    "Keep practicing and provide more specific, structured answers with measurable outcomes.";

/// One answered question, as fed to the coaching prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub question: String,
    pub answer: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementSummary {
    pub suggestions: Vec<String>,
    pub overall_advice: String,
}

impl Default for ImprovementSummary {
    fn default() -> Self {
        Self {
            suggestions: vec![],
            overall_advice: DEFAULT_OVERALL_ADVICE.to_string(),
        }
    }
}

/// Mean of `scores` rounded to 2 decimals; 0.0 when there are none.
pub fn final_score(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    (mean * 100.0).round() / 100.0
}

pub async fn improvement_summary(
    generator: &dyn TextGenerator,
    session: &InterviewSession,
    transcript: &[TranscriptEntry],
) -> ImprovementSummary {
    let skills_text = if session.skills.is_empty() {
        "general technical skills".to_string()
    } else {
        session.skills.join(", ")
    };
    let transcript_json = serde_json::to_string_pretty(transcript).unwrap_or_default();

    let prompt = fill_template(
        IMPROVEMENT_PROMPT_TEMPLATE,
        &[
            ("position", session.position.as_str()),
            ("difficulty", session.difficulty.as_str()),
            ("skills_text", skills_text.as_str()),
            ("transcript_json", transcript_json.as_str()),
        ],
    );

    let record = generate_record(
        generator,
        Some(INTERVIEWER_SYSTEM),
        &prompt,
        "improvement summary",
        Default::default(),
    )
    .await;

    let suggestions = match record.get("suggestions") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        _ => vec![],
    };

    let overall_advice = record
        .get("overall_advice")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(DEFAULT_OVERALL_ADVICE)
        .to_string();

    ImprovementSummary {
        suggestions,
        overall_advice,
    }
}
