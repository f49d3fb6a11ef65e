//! Answer evaluation: rubric prompt → decoded `{score, feedback}`.

use serde::Serialize;
use serde_json::Value;

use crate::interview::prompts::{
    fill_template, EVALUATION_PROMPT_TEMPLATE, EVALUATION_SKILLS_CONTEXT, INTERVIEWER_SYSTEM,
};
use crate::llm_client::decoder::generate_record;
use crate::llm_client::TextGenerator;

pub const FALLBACK_SCORE: f64 = 7.0;
pub const FALLBACK_FEEDBACK: &str = "Thank you for your answer. Consider providing more specific examples to strengthen your response.";
const MIN_SCORE: f64 = 1.0;
const MAX_SCORE: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// Always within [1, 10].
    pub score: f64,
    pub feedback: String,
}

pub async fn evaluate_answer(
    generator: &dyn TextGenerator,
    question: &str,
    answer: &str,
    position: &str,
    skills: &[String],
) -> Evaluation {
    let skills_context = if skills.is_empty() {
        String::new()
    } else {
        EVALUATION_SKILLS_CONTEXT.replace("{skills_text}", &skills.join(", "))
    };

    let prompt = fill_template(
        EVALUATION_PROMPT_TEMPLATE,
        &[
            ("skills_context", skills_context.as_str()),
            ("position", position),
            ("question", question),
            ("answer", answer),
        ],
    );

    let record = generate_record(
        generator,
        Some(INTERVIEWER_SYSTEM),
        &prompt,
        "answer evaluation",
        Default::default(),
    )
    .await;

    let feedback = record
        .get("feedback")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .unwrap_or(FALLBACK_FEEDBACK)
        .to_string();

    Evaluation {
        score: coerce_score(record.get("score")),
        feedback,
    }
}

/// Numbers and numeric strings are accepted and clamped to [1, 10];
/// anything else is the fallback score.
pub fn coerce_score(value: Option<&Value>) -> f64 {
    let score = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match score {
        Some(score) if score.is_finite() => score.clamp(MIN_SCORE, MAX_SCORE),
        _ => FALLBACK_SCORE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::scripted::ScriptedGenerator;
    use serde_json::json;

    #[test]
    fn test_coerce_score() {
        assert_eq!(coerce_score(Some(&json!(8.5))), 8.5);
        assert_eq!(coerce_score(Some(&json!(" 6 "))), 6.0);
        assert_eq!(coerce_score(Some(&json!(42))), 10.0);
        assert_eq!(coerce_score(Some(&json!(0))), 1.0);
        assert_eq!(coerce_score(Some(&json!("great"))), FALLBACK_SCORE);
        assert_eq!(coerce_score(Some(&json!("NaN"))), FALLBACK_SCORE);
        assert_eq!(coerce_score(Some(&json!(null))), FALLBACK_SCORE);
        assert_eq!(coerce_score(Some(&json!([9]))), FALLBACK_SCORE);
        assert_eq!(coerce_score(None), FALLBACK_SCORE);
    }

    #[tokio::test]
    async fn test_evaluation_decodes_model_reply() {
        let generator = ScriptedGenerator::replying([
            "```json\n{\"score\": 9, \"feedback\": \"Clear and concrete.\"}\n```",
        ]);
        let skills = vec!["Rust".to_string()];
        let eval = evaluate_answer(&generator, "Q?", "A.", "Backend Engineer", &skills).await;
        assert_eq!(
            eval,
            Evaluation {
                score: 9.0,
                feedback: "Clear and concrete.".to_string()
            }
        );
        let prompt = generator.prompt(0);
        assert!(prompt.contains("Focus Areas"));
        assert!(prompt.contains("Question: Q?"));
    }

    #[tokio::test]
    async fn test_placeholders_in_inputs_stay_literal() {
        let generator = ScriptedGenerator::failing();
        evaluate_answer(
            &generator,
            "What does {answer} mean here?",
            "It is a template slot.",
            "{question} Engineer",
            &[],
        )
        .await;
        let prompt = generator.prompt(0);
        assert!(prompt.contains("for a {question} Engineer position"));
        assert!(prompt.contains("Question: What does {answer} mean here?"));
        assert!(prompt.contains("Answer: It is a template slot."));
    }

    #[tokio::test]
    async fn test_unavailable_model_uses_fallbacks() {
        let generator = ScriptedGenerator::failing();
        let eval = evaluate_answer(&generator, "Q?", "A.", "Backend Engineer", &[]).await;
        assert_eq!(eval.score, FALLBACK_SCORE);
        assert_eq!(eval.feedback, FALLBACK_FEEDBACK);
        assert!(!generator.prompt(0).contains("Focus Areas"));
    }

    #[tokio::test]
    async fn test_non_numeric_score_keeps_feedback() {
        let generator =
            ScriptedGenerator::replying([r#"{"score": "eight", "feedback": "Solid."}"#]);
        let eval = evaluate_answer(&generator, "Q?", "A.", "Backend Engineer", &[]).await;
        assert_eq!(eval.score, FALLBACK_SCORE);
        assert_eq!(eval.feedback, "Solid.");
    }
}
