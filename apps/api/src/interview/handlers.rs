use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::interview::aggregate::ImprovementSummary;
use crate::interview::engine::{AnswerOutcome, InterviewResults, StartInterview, StartedInterview};
use crate::models::interview::Difficulty;
use crate::models::profile::CandidateProfile;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StartInterviewRequest {
    pub position: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    /// Output of `/api/analyze-resume`, passed back as-is.
    #[serde(default)]
    pub resume_data: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub session_id: String,
    pub question_number: Value,
    pub answer: String,
}

/// `{"success": true, ...body}`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Envelope<T> {
    fn ok(body: T) -> Json<Self> {
        Json(Self {
            success: true,
            body,
        })
    }
}

/// POST /api/start-interview
pub async fn handle_start_interview(
    State(state): State<AppState>,
    Json(req): Json<StartInterviewRequest>,
) -> Result<Json<Envelope<StartedInterview>>, AppError> {
    let difficulty = match req.difficulty.as_deref().map(str::trim) {
        None | Some("") => Difficulty::Mid,
        Some(raw) => raw.parse::<Difficulty>().map_err(AppError::Validation)?,
    };
    let resume = req
        .resume_data
        .as_ref()
        .map(CandidateProfile::from_value)
        .unwrap_or_default();

    let started = state
        .engine
        .start(StartInterview {
            position: req.position,
            difficulty,
            skills: req.skills.unwrap_or_default(),
            resume,
        })
        .await?;

    Ok(Envelope::ok(started))
}

/// POST /api/submit-answer
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<Json<Envelope<AnswerOutcome>>, AppError> {
    let question_number = parse_question_number(&req.question_number)?;
    if req.answer.trim().is_empty() {
        return Err(AppError::Validation("answer cannot be empty".to_string()));
    }

    let outcome = state
        .engine
        .submit_answer(&req.session_id, question_number, &req.answer)
        .await?;

    Ok(Envelope::ok(outcome))
}

/// GET /api/interview-results/:session_id
pub async fn handle_interview_results(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Envelope<InterviewResults>>, AppError> {
    Ok(Envelope::ok(state.engine.results(&session_id).await?))
}

/// GET /api/interview-results/:session_id/suggestions
pub async fn handle_suggestions(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Envelope<ImprovementSummary>>, AppError> {
    Ok(Envelope::ok(state.engine.suggestions(&session_id).await?))
}

/// Accepts `3` or `"3"`. Range is checked against the session.
fn parse_question_number(value: &Value) -> Result<u32, AppError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| AppError::Validation("Invalid question_number".to_string()))
}
