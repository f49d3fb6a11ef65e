use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::interview::{Answer, InterviewSession, Question};
use crate::models::profile::CandidateProfile;
use crate::store::{Advance, InterviewStore};

/// Postgres-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgInterviewStore {
    pool: PgPool,
}

impl PgInterviewStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SessionRow {
    session_id: String,
    position: String,
    difficulty: String,
    skills: Vec<String>,
    resume_analysis: Value,
    total_questions: i32,
    is_complete: bool,
    final_score: Option<f64>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct QuestionRow {
    id: Uuid,
    session_id: String,
    question_number: i32,
    question_text: String,
    question_type: String,
    focused_skills: Vec<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct AnswerRow {
    id: Uuid,
    question_id: Uuid,
    answer_text: String,
    ai_feedback: String,
    score: f64,
    created_at: DateTime<Utc>,
}

impl TryFrom<SessionRow> for InterviewSession {
    type Error = AppError;

    fn try_from(row: SessionRow) -> Result<Self, AppError> {
        Ok(InterviewSession {
            difficulty: row
                .difficulty
                .parse()
                .map_err(|e: String| AppError::Internal(anyhow!(e)))?,
            resume_analysis: CandidateProfile::from_value(&row.resume_analysis),
            total_questions: u32::try_from(row.total_questions)
                .map_err(|e| AppError::Internal(anyhow!(e)))?,
            session_id: row.session_id,
            position: row.position,
            skills: row.skills,
            is_complete: row.is_complete,
            final_score: row.final_score,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<QuestionRow> for Question {
    type Error = AppError;

    fn try_from(row: QuestionRow) -> Result<Self, AppError> {
        Ok(Question {
            question_number: u32::try_from(row.question_number)
                .map_err(|e| AppError::Internal(anyhow!(e)))?,
            question_type: row
                .question_type
                .parse()
                .map_err(|e: String| AppError::Internal(anyhow!(e)))?,
            id: row.id,
            session_id: row.session_id,
            question_text: row.question_text,
            focused_skills: row.focused_skills,
            created_at: row.created_at,
        })
    }
}

impl From<AnswerRow> for Answer {
    fn from(row: AnswerRow) -> Self {
        Answer {
            id: row.id,
            question_id: row.question_id,
            answer_text: row.answer_text,
            ai_feedback: row.ai_feedback,
            score: row.score,
            created_at: row.created_at,
        }
    }
}

/// Maps a unique-constraint violation to `Conflict`, everything else to `Database`.
fn conflict_on_unique(e: sqlx::Error, message: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(e),
    }
}

const INSERT_QUESTION: &str = r#"
    INSERT INTO interview_questions
        (id, session_id, question_number, question_text, question_type,
         focused_skills, created_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
"#;

async fn insert_question(
    tx: &mut Transaction<'_, Postgres>,
    question: &Question,
) -> Result<(), AppError> {
    sqlx::query(INSERT_QUESTION)
        .bind(question.id)
        .bind(&question.session_id)
        .bind(question.question_number as i32)
        .bind(&question.question_text)
        .bind(question.question_type.as_str())
        .bind(&question.focused_skills)
        .bind(question.created_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            conflict_on_unique(
                e,
                &format!("Question {} already exists", question.question_number),
            )
        })?;
    Ok(())
}

#[async_trait]
impl InterviewStore for PgInterviewStore {
    async fn create_session(
        &self,
        session: &InterviewSession,
        first_question: &Question,
    ) -> Result<(), AppError> {
        let resume_analysis = serde_json::to_value(&session.resume_analysis)
            .map_err(|e| AppError::Internal(anyhow!("Failed to serialize profile: {e}")))?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO interview_sessions
                (session_id, position, difficulty, skills, resume_analysis,
                 total_questions, is_complete, final_score, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&session.session_id)
        .bind(&session.position)
        .bind(session.difficulty.as_str())
        .bind(&session.skills)
        .bind(&resume_analysis)
        .bind(session.total_questions as i32)
        .bind(session.is_complete)
        .bind(session.final_score)
        .bind(session.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "Session already exists"))?;

        insert_question(&mut tx, first_question).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<InterviewSession>, AppError> {
        let row: Option<SessionRow> =
            sqlx::query_as("SELECT * FROM interview_sessions WHERE session_id = $1")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(InterviewSession::try_from).transpose()
    }

    async fn questions_for_session(&self, session_id: &str) -> Result<Vec<Question>, AppError> {
        let rows: Vec<QuestionRow> = sqlx::query_as(
            "SELECT * FROM interview_questions WHERE session_id = $1 ORDER BY question_number",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Question::try_from).collect()
    }

    async fn answer_for_question(&self, question_id: Uuid) -> Result<Option<Answer>, AppError> {
        let row: Option<AnswerRow> =
            sqlx::query_as("SELECT * FROM interview_answers WHERE question_id = $1")
                .bind(question_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Answer::from))
    }

    async fn record_answer(
        &self,
        session_id: &str,
        answer: &Answer,
        advance: Advance<'_>,
    ) -> Result<(), AppError> {
        // Dropping `tx` without commit rolls everything back.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO interview_answers
                (id, question_id, answer_text, ai_feedback, score, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(answer.id)
        .bind(answer.question_id)
        .bind(&answer.answer_text)
        .bind(&answer.ai_feedback)
        .bind(answer.score)
        .bind(answer.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "This question has already been answered"))?;

        match advance {
            Advance::Next(next) => insert_question(&mut tx, next).await?,
            Advance::Complete { final_score } => {
                let result = sqlx::query(
                    "UPDATE interview_sessions SET is_complete = TRUE, final_score = $1 \
                     WHERE session_id = $2",
                )
                .bind(final_score)
                .bind(session_id)
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(AppError::NotFound(format!("Session {session_id} not found")));
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }
}
