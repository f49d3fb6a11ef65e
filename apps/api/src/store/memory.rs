use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::interview::{Answer, InterviewSession, Question};
use crate::store::{Advance, InterviewStore};

/// Process-local store. Sessions live until the process exits.
#[derive(Default)]
pub struct MemoryInterviewStore {
    inner: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    sessions: HashMap<String, InterviewSession>,
    questions: HashMap<String, Vec<Question>>,
    answers: HashMap<Uuid, Answer>,
}

impl MemoryInterviewStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InterviewStore for MemoryInterviewStore {
    async fn create_session(
        &self,
        session: &InterviewSession,
        first_question: &Question,
    ) -> Result<(), AppError> {
        let mut state = self.inner.write().await;
        if state.sessions.contains_key(&session.session_id) {
            return Err(AppError::Conflict(format!(
                "Session {} already exists",
                session.session_id
            )));
        }
        state
            .sessions
            .insert(session.session_id.clone(), session.clone());
        state
            .questions
            .insert(session.session_id.clone(), vec![first_question.clone()]);
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<InterviewSession>, AppError> {
        Ok(self.inner.read().await.sessions.get(session_id).cloned())
    }

    async fn questions_for_session(&self, session_id: &str) -> Result<Vec<Question>, AppError> {
        Ok(self
            .inner
            .read()
            .await
            .questions
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn answer_for_question(&self, question_id: Uuid) -> Result<Option<Answer>, AppError> {
        Ok(self.inner.read().await.answers.get(&question_id).cloned())
    }

    async fn record_answer(
        &self,
        session_id: &str,
        answer: &Answer,
        advance: Advance<'_>,
    ) -> Result<(), AppError> {
        let mut state = self.inner.write().await;

        // Every check runs before the first mutation.
        if !state.sessions.contains_key(session_id) {
            return Err(AppError::NotFound(format!("Session {session_id} not found")));
        }
        if state.answers.contains_key(&answer.question_id) {
            return Err(AppError::Conflict(
                "This question has already been answered".to_string(),
            ));
        }
        if let Advance::Next(next) = advance {
            let taken = state
                .questions
                .get(session_id)
                .is_some_and(|qs| qs.iter().any(|q| q.question_number == next.question_number));
            if taken {
                return Err(AppError::Conflict(format!(
                    "Question {} already exists",
                    next.question_number
                )));
            }
        }

        state.answers.insert(answer.question_id, answer.clone());
        match advance {
            Advance::Next(next) => {
                let questions = state.questions.entry(session_id.to_string()).or_default();
                questions.push(next.clone());
                questions.sort_by_key(|q| q.question_number);
            }
            Advance::Complete { final_score } => {
                if let Some(session) = state.sessions.get_mut(session_id) {
                    session.is_complete = true;
                    session.final_score = Some(final_score);
                }
            }
        }
        Ok(())
    }
}
