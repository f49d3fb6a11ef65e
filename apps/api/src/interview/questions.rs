//! Question generation with deterministic fallbacks.
//!
//! The category comes from the round-robin; the model only supplies wording
//! (and, for skill-scoped technical questions, which skills it chose). When
//! the model gives nothing usable a templated question is used instead, so an
//! interview can never stall on generation.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::interview::categories::{category_for, CategoryCycle};
use crate::interview::prompts::{
    fill_template, BEHAVIORAL_INSTRUCTION, FIRST_QUESTION_PROMPT_TEMPLATE,
    FOCUSED_QUESTION_RESPONSE_SHAPE, GENERAL_TECHNICAL_INSTRUCTION, INDUSTRY_INSTRUCTION,
    INTERVIEWER_SYSTEM, NEXT_QUESTION_PROMPT_TEMPLATE, QUESTION_RESPONSE_SHAPE,
    TECHNICAL_FOCUS_INSTRUCTION,
};
use crate::llm_client::decoder::{request_record, Record};
use crate::llm_client::TextGenerator;
use crate::models::interview::{Category, Difficulty, TOTAL_QUESTIONS};
use crate::models::profile::CandidateProfile;

/// At most this many selected skills are attached to one technical question.
const MAX_FOCUSED_SKILLS: usize = 2;

/// Everything about the session that shapes a question.
#[derive(Debug, Clone, Copy)]
pub struct QuestionContext<'a> {
    pub position: &'a str,
    pub difficulty: Difficulty,
    pub skills: &'a [String],
    pub profile: &'a CandidateProfile,
    pub cycle: CategoryCycle,
}

/// The answer that preceded the question being generated.
#[derive(Debug, Clone, Copy)]
pub struct PreviousExchange<'a> {
    pub answer: &'a str,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedQuestion {
    pub text: String,
    pub category: Category,
    pub focused_skills: Vec<String>,
}

/// Generates question `number` (1-based). Never fails.
pub async fn generate_question(
    generator: &dyn TextGenerator,
    ctx: &QuestionContext<'_>,
    number: u32,
    previous: Option<PreviousExchange<'_>>,
) -> GeneratedQuestion {
    let category = category_for(number, ctx.cycle);
    let skill_scoped = category == Category::Technical && !ctx.skills.is_empty();

    let prompt = build_question_prompt(ctx, number, category, skill_scoped, previous);
    let record = request_record(generator, Some(INTERVIEWER_SYSTEM), &prompt, "question generation")
        .await
        .into_record()
        .unwrap_or_default();

    let text = match question_text(&record) {
        Some(text) => text,
        None => {
            info!(number, %category, "using fallback question");
            fallback_question(ctx, number, category)
        }
    };

    let focused_skills = if skill_scoped {
        focused_skills(&record, ctx.skills)
    } else {
        vec![]
    };

    debug!(number, %category, ?focused_skills, "question ready");

    GeneratedQuestion {
        text,
        category,
        focused_skills,
    }
}

/// The templated question used when generation produced nothing usable.
pub fn fallback_question(ctx: &QuestionContext<'_>, number: u32, category: Category) -> String {
    match category {
        Category::Technical => match skill_for(ctx.skills, number) {
            Some(skill) if number <= 1 => format!(
                "Can you explain your experience with {skill} and how you've used it in your projects?"
            ),
            Some(skill) => {
                format!("Can you describe a challenging technical problem you solved using {skill}?")
            }
            None if number <= 1 => {
                "Tell me about your technical background and what interests you about this position."
                    .to_string()
            }
            None => format!(
                "What are the key technical skills required for a {}?",
                ctx.position
            ),
        },
        Category::Behavioral => {
            "Describe a challenging situation you faced and how you handled it.".to_string()
        }
        Category::Industry => format!(
            "What recent developments in the industry do you think will most affect the work of a {}?",
            ctx.position
        ),
    }
}

/// `skills[(number - 1) mod len]`, or `None` without skills.
fn skill_for(skills: &[String], number: u32) -> Option<&str> {
    if skills.is_empty() {
        return None;
    }
    let index = number.saturating_sub(1) as usize % skills.len();
    Some(skills[index].as_str())
}

fn question_text(record: &Record) -> Option<String> {
    record
        .get("text")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
}

/// Skills the model says it targeted, limited to the candidate's selection.
/// Falls back to the first two selected skills.
fn focused_skills(record: &Record, selected: &[String]) -> Vec<String> {
    let chosen: Vec<String> = record
        .get("focused_skills")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|s| {
                    selected
                        .iter()
                        .find(|skill| skill.eq_ignore_ascii_case(s.trim()))
                        .cloned()
                })
                .collect()
        })
        .unwrap_or_default();

    let mut chosen = crate::models::profile::dedup_preserving_order(chosen);
    if chosen.is_empty() {
        chosen = selected.iter().take(MAX_FOCUSED_SKILLS).cloned().collect();
    }
    chosen.truncate(MAX_FOCUSED_SKILLS);
    chosen
}

fn skills_text(skills: &[String]) -> String {
    if skills.is_empty() {
        "general technical skills".to_string()
    } else {
        skills.join(", ")
    }
}

fn build_question_prompt(
    ctx: &QuestionContext<'_>,
    number: u32,
    category: Category,
    skill_scoped: bool,
    previous: Option<PreviousExchange<'_>>,
) -> String {
    let skills_text = skills_text(ctx.skills);

    let focus_instruction = match category {
        Category::Technical if skill_scoped => {
            TECHNICAL_FOCUS_INSTRUCTION.replace("{skills_text}", &skills_text)
        }
        Category::Technical => GENERAL_TECHNICAL_INSTRUCTION.to_string(),
        Category::Behavioral => BEHAVIORAL_INSTRUCTION.to_string(),
        Category::Industry => INDUSTRY_INSTRUCTION.to_string(),
    };

    let response_shape = if skill_scoped {
        FOCUSED_QUESTION_RESPONSE_SHAPE.to_string()
    } else {
        QUESTION_RESPONSE_SHAPE.replace("{category}", category.as_str())
    };

    match previous {
        None => {
            let resume_json = serde_json::to_string_pretty(ctx.profile).unwrap_or_default();
            fill_template(
                FIRST_QUESTION_PROMPT_TEMPLATE,
                &[
                    ("focus_instruction", focus_instruction.as_str()),
                    ("response_shape", response_shape.as_str()),
                    ("category", category.as_str()),
                    ("difficulty", ctx.difficulty.as_str()),
                    ("skills_text", skills_text.as_str()),
                    ("position", ctx.position),
                    ("resume_json", resume_json.as_str()),
                ],
            )
        }
        Some(previous) => fill_template(
            NEXT_QUESTION_PROMPT_TEMPLATE,
            &[
                ("focus_instruction", focus_instruction.as_str()),
                ("response_shape", response_shape.as_str()),
                ("category", category.as_str()),
                ("difficulty", ctx.difficulty.as_str()),
                ("question_number", number.to_string().as_str()),
                ("total_questions", TOTAL_QUESTIONS.to_string().as_str()),
                ("previous_score", format!("{:.1}", previous.score).as_str()),
                ("position", ctx.position),
                ("previous_answer", previous.answer),
            ],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::scripted::ScriptedGenerator;

    fn skills(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn ctx<'a>(skills: &'a [String], profile: &'a CandidateProfile) -> QuestionContext<'a> {
        QuestionContext {
            position: "Backend Engineer",
            difficulty: Difficulty::Mid,
            skills,
            profile,
            cycle: CategoryCycle::Alternating,
        }
    }

    #[tokio::test]
    async fn test_category_ignores_model_type_field() {
        let selected = skills(&["Rust"]);
        let profile = CandidateProfile::default();
        let generator = ScriptedGenerator::replying([
            r#"{"text": "Tell me about a conflict.", "type": "technical"}"#,
        ]);
        let previous = PreviousExchange {
            answer: "I used Rust",
            score: 8.0,
        };
        let q = generate_question(&generator, &ctx(&selected, &profile), 2, Some(previous)).await;
        assert_eq!(q.category, Category::Behavioral);
        assert_eq!(q.text, "Tell me about a conflict.");
        assert!(q.focused_skills.is_empty());
    }

    #[tokio::test]
    async fn test_technical_question_keeps_selected_focus() {
        let selected = skills(&["Rust", "PostgreSQL", "Kafka"]);
        let profile = CandidateProfile::default();
        let generator = ScriptedGenerator::replying([
            r#"Here: {"text": "How do you model ownership across threads?", "type": "technical", "focused_skills": ["rust", "Haskell"]}"#,
        ]);
        let q = generate_question(&generator, &ctx(&selected, &profile), 1, None).await;
        assert_eq!(q.category, Category::Technical);
        assert_eq!(q.focused_skills, vec!["Rust"]);

        let prompt = generator.prompt(0);
        assert!(prompt.contains("Rust, PostgreSQL, Kafka"));
        assert!(prompt.contains("focused_skills"));
        assert!(prompt.contains("\"experience_years\""));
    }

    #[tokio::test]
    async fn test_missing_focused_skills_default_to_first_two() {
        let selected = skills(&["Rust", "PostgreSQL", "Kafka"]);
        let profile = CandidateProfile::default();
        let generator = ScriptedGenerator::replying([r#"{"text": "Explain MVCC."}"#]);
        let previous = PreviousExchange {
            answer: "a",
            score: 3.0,
        };
        let q = generate_question(&generator, &ctx(&selected, &profile), 3, Some(previous)).await;
        assert_eq!(q.focused_skills, vec!["Rust", "PostgreSQL"]);
        assert!(generator.prompt(0).contains("Previous answer score: 3.0/10"));
    }

    #[tokio::test]
    async fn test_fallback_uses_indexed_skill() {
        let selected = skills(&["Rust", "Go"]);
        let profile = CandidateProfile::default();
        let generator = ScriptedGenerator::failing();
        let previous = PreviousExchange {
            answer: "",
            score: 7.0,
        };
        let q = generate_question(&generator, &ctx(&selected, &profile), 3, Some(previous)).await;
        // (3 - 1) % 2 == 0
        assert_eq!(
            q.text,
            "Can you describe a challenging technical problem you solved using Rust?"
        );
        assert_eq!(q.focused_skills, vec!["Rust", "Go"]);
    }

    #[tokio::test]
    async fn test_blank_text_triggers_fallback() {
        let none: Vec<String> = vec![];
        let profile = CandidateProfile::default();
        let generator = ScriptedGenerator::replying([r#"{"text": "   "}"#]);
        let q = generate_question(&generator, &ctx(&none, &profile), 1, None).await;
        assert_eq!(
            q.text,
            "Tell me about your technical background and what interests you about this position."
        );
    }

    #[test]
    fn test_fallback_templates_per_category() {
        let none: Vec<String> = vec![];
        let selected = skills(&["Rust"]);
        let profile = CandidateProfile::default();

        assert_eq!(
            fallback_question(&ctx(&selected, &profile), 1, Category::Technical),
            "Can you explain your experience with Rust and how you've used it in your projects?"
        );
        assert_eq!(
            fallback_question(&ctx(&none, &profile), 5, Category::Technical),
            "What are the key technical skills required for a Backend Engineer?"
        );
        assert_eq!(
            fallback_question(&ctx(&none, &profile), 2, Category::Behavioral),
            "Describe a challenging situation you faced and how you handled it."
        );
        assert!(fallback_question(&ctx(&none, &profile), 3, Category::Industry)
            .contains("Backend Engineer"));
    }

    #[test]
    fn test_answer_text_cannot_inject_placeholders() {
        let none: Vec<String> = vec![];
        let profile = CandidateProfile::default();
        let prompt = build_question_prompt(
            &ctx(&none, &profile),
            2,
            Category::Behavioral,
            false,
            Some(PreviousExchange {
                answer: "my answer mentions {position}",
                score: 6.0,
            }),
        );
        assert!(prompt.contains("my answer mentions {position}"));
    }
}
