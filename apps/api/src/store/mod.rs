//! Interview persistence boundary.
//!
//! The engine only needs the operations on `InterviewStore`; how records are
//! kept is up to the backend. `PgInterviewStore` is used when a database is
//! configured, `MemoryInterviewStore` otherwise (and in tests).

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::interview::{Answer, InterviewSession, Question};

pub mod memory;
pub mod postgres;

pub use memory::MemoryInterviewStore;
pub use postgres::PgInterviewStore;

/// What recording an answer moves the session to.
#[derive(Debug, Clone, Copy)]
pub enum Advance<'a> {
    /// Store the next question alongside the answer.
    Next(&'a Question),
    /// The answer was the last one; close the session with this score.
    Complete { final_score: f64 },
}

#[async_trait]
pub trait InterviewStore: Send + Sync {
    /// Stores a new session together with its first question, all or nothing.
    async fn create_session(
        &self,
        session: &InterviewSession,
        first_question: &Question,
    ) -> Result<(), AppError>;

    async fn get_session(&self, session_id: &str) -> Result<Option<InterviewSession>, AppError>;

    /// Ordered by `question_number`.
    async fn questions_for_session(&self, session_id: &str) -> Result<Vec<Question>, AppError>;

    /// `None` means the question has not been answered yet.
    async fn answer_for_question(&self, question_id: Uuid) -> Result<Option<Answer>, AppError>;

    /// Stores `answer` and applies `advance` as one unit: either both land or
    /// neither does. Fails with `Conflict` if the question already has an
    /// answer or the next question number is taken.
    async fn record_answer(
        &self,
        session_id: &str,
        answer: &Answer,
        advance: Advance<'_>,
    ) -> Result<(), AppError>;
}
