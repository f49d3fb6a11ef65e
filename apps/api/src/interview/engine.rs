//! Interview Engine: drives one session through its fixed question loop.
//!
//! States: awaiting_answer(1) … awaiting_answer(5), then complete.
//! start → question 1 stored → each submitted answer is evaluated, then either
//! the next question is generated or the final score is computed. Model calls
//! always finish before anything is written, and each turn is written in one
//! `record_answer` call, so a dropped request leaves the turn retryable.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::aggregate::{
    final_score, improvement_summary, ImprovementSummary, TranscriptEntry,
};
use crate::interview::categories::CategoryCycle;
use crate::interview::evaluation::evaluate_answer;
use crate::interview::questions::{generate_question, PreviousExchange, QuestionContext};
use crate::llm_client::TextGenerator;
use crate::models::interview::{
    Answer, Category, Difficulty, InterviewSession, Question, TOTAL_QUESTIONS,
};
use crate::models::profile::{dedup_preserving_order, CandidateProfile};
use crate::store::{Advance, InterviewStore};

/// Validated input for a new session.
#[derive(Debug, Clone)]
pub struct StartInterview {
    pub position: String,
    pub difficulty: Difficulty,
    pub skills: Vec<String>,
    pub resume: CandidateProfile,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartedInterview {
    pub session_id: String,
    pub question: String,
    pub question_type: Category,
    pub focused_skills: Vec<String>,
    pub question_number: u32,
    pub total_questions: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerOutcome {
    pub feedback: String,
    pub score: f64,
    /// Number of the question that is now awaiting an answer.
    pub question_number: u32,
    pub is_complete: bool,
    pub next_question: Option<String>,
    pub next_question_type: Option<Category>,
    pub focused_skills: Vec<String>,
    pub final_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionResult {
    pub question_number: u32,
    pub question: String,
    pub question_type: Category,
    pub focused_skills: Vec<String>,
    pub answer: Option<String>,
    pub feedback: Option<String>,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterviewResults {
    pub session_id: String,
    pub position: String,
    pub difficulty: Difficulty,
    pub skills: Vec<String>,
    pub final_score: Option<f64>,
    pub is_complete: bool,
    pub created_at: DateTime<Utc>,
    pub questions_and_answers: Vec<QuestionResult>,
}

#[derive(Clone)]
pub struct InterviewEngine {
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn InterviewStore>,
    cycle: CategoryCycle,
}

impl InterviewEngine {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn InterviewStore>,
        cycle: CategoryCycle,
    ) -> Self {
        Self {
            generator,
            store,
            cycle,
        }
    }

    /// Creates a session and its first question.
    pub async fn start(&self, request: StartInterview) -> Result<StartedInterview, AppError> {
        let position = request.position.trim().to_string();
        if position.is_empty() {
            return Err(AppError::Validation("position cannot be empty".to_string()));
        }
        let skills = dedup_preserving_order(
            request
                .skills
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        );

        let ctx = QuestionContext {
            position: &position,
            difficulty: request.difficulty,
            skills: &skills,
            profile: &request.resume,
            cycle: self.cycle,
        };
        let first = generate_question(self.generator.as_ref(), &ctx, 1, None).await;

        let session = InterviewSession {
            session_id: Uuid::new_v4().to_string(),
            position: position.clone(),
            difficulty: request.difficulty,
            skills: skills.clone(),
            resume_analysis: request.resume.clone(),
            total_questions: TOTAL_QUESTIONS,
            is_complete: false,
            final_score: None,
            created_at: Utc::now(),
        };
        let question = Question {
            id: Uuid::new_v4(),
            session_id: session.session_id.clone(),
            question_number: 1,
            question_text: first.text,
            question_type: first.category,
            focused_skills: first.focused_skills,
            created_at: Utc::now(),
        };
        self.store.create_session(&session, &question).await?;

        info!(
            "Started interview {} for '{}' ({})",
            session.session_id, session.position, session.difficulty
        );

        Ok(StartedInterview {
            session_id: session.session_id,
            question: question.question_text,
            question_type: question.question_type,
            focused_skills: question.focused_skills,
            question_number: 1,
            total_questions: session.total_questions,
        })
    }

    /// Records the answer to `question_number` and advances the session.
    pub async fn submit_answer(
        &self,
        session_id: &str,
        question_number: u32,
        answer_text: &str,
    ) -> Result<AnswerOutcome, AppError> {
        let session = self.load_session(session_id).await?;

        if question_number == 0 || question_number > session.total_questions {
            return Err(AppError::Validation(format!(
                "question_number must be between 1 and {}",
                session.total_questions
            )));
        }
        if session.is_complete {
            return Err(AppError::Conflict(
                "This interview is already complete".to_string(),
            ));
        }

        let questions = self.store.questions_for_session(session_id).await?;
        let current = questions
            .iter()
            .find(|q| q.question_number == question_number)
            .ok_or_else(|| {
                AppError::Conflict(format!(
                    "Question {question_number} is not awaiting an answer"
                ))
            })?;

        if self.store.answer_for_question(current.id).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Question {question_number} has already been answered"
            )));
        }

        let evaluation_skills = if current.focused_skills.is_empty() {
            &session.skills
        } else {
            &current.focused_skills
        };
        let evaluation = evaluate_answer(
            self.generator.as_ref(),
            &current.question_text,
            answer_text,
            &session.position,
            evaluation_skills,
        )
        .await;

        let answer = Answer {
            id: Uuid::new_v4(),
            question_id: current.id,
            answer_text: answer_text.to_string(),
            ai_feedback: evaluation.feedback.clone(),
            score: evaluation.score,
            created_at: Utc::now(),
        };

        if question_number < session.total_questions {
            let next_number = question_number + 1;
            let ctx = QuestionContext {
                position: &session.position,
                difficulty: session.difficulty,
                skills: &session.skills,
                profile: &session.resume_analysis,
                cycle: self.cycle,
            };
            let previous = PreviousExchange {
                answer: answer_text,
                score: evaluation.score,
            };
            let next =
                generate_question(self.generator.as_ref(), &ctx, next_number, Some(previous))
                    .await;

            let next_question = Question {
                id: Uuid::new_v4(),
                session_id: session_id.to_string(),
                question_number: next_number,
                question_text: next.text,
                question_type: next.category,
                focused_skills: next.focused_skills,
                created_at: Utc::now(),
            };
            self.store
                .record_answer(session_id, &answer, Advance::Next(&next_question))
                .await?;

            info!(
                "Session {}: question {} scored {:.1}",
                session_id, question_number, evaluation.score
            );

            return Ok(AnswerOutcome {
                feedback: evaluation.feedback,
                score: evaluation.score,
                question_number: next_number,
                is_complete: false,
                next_question: Some(next_question.question_text),
                next_question_type: Some(next_question.question_type),
                focused_skills: next_question.focused_skills,
                final_score: None,
            });
        }

        let mut scores = self.answered_scores(&questions).await?;
        scores.push(evaluation.score);
        let score = final_score(&scores);
        self.store
            .record_answer(session_id, &answer, Advance::Complete { final_score: score })
            .await?;
        info!("Session {} complete: final score {:.2}", session_id, score);

        Ok(AnswerOutcome {
            feedback: evaluation.feedback,
            score: evaluation.score,
            question_number: question_number + 1,
            is_complete: true,
            next_question: None,
            next_question_type: None,
            focused_skills: vec![],
            final_score: Some(score),
        })
    }

    /// Full transcript of a session, unanswered questions included.
    pub async fn results(&self, session_id: &str) -> Result<InterviewResults, AppError> {
        let session = self.load_session(session_id).await?;
        let questions = self.store.questions_for_session(session_id).await?;

        let mut questions_and_answers = Vec::with_capacity(questions.len());
        for question in questions {
            let answer = self.store.answer_for_question(question.id).await?;
            questions_and_answers.push(QuestionResult {
                question_number: question.question_number,
                question: question.question_text,
                question_type: question.question_type,
                focused_skills: question.focused_skills,
                answer: answer.as_ref().map(|a| a.answer_text.clone()),
                feedback: answer.as_ref().map(|a| a.ai_feedback.clone()),
                score: answer.map(|a| a.score),
            });
        }

        Ok(InterviewResults {
            session_id: session.session_id,
            position: session.position,
            difficulty: session.difficulty,
            skills: session.skills,
            final_score: session.final_score,
            is_complete: session.is_complete,
            created_at: session.created_at,
            questions_and_answers,
        })
    }

    /// Coaching summary over every answered question so far.
    pub async fn suggestions(&self, session_id: &str) -> Result<ImprovementSummary, AppError> {
        let session = self.load_session(session_id).await?;
        let questions = self.store.questions_for_session(session_id).await?;

        let mut transcript = Vec::with_capacity(questions.len());
        for question in questions {
            if let Some(answer) = self.store.answer_for_question(question.id).await? {
                transcript.push(TranscriptEntry {
                    question: question.question_text,
                    answer: answer.answer_text,
                    score: answer.score,
                });
            }
        }

        Ok(improvement_summary(self.generator.as_ref(), &session, &transcript).await)
    }

    async fn load_session(&self, session_id: &str) -> Result<InterviewSession, AppError> {
        self.store
            .get_session(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))
    }

    async fn answered_scores(&self, questions: &[Question]) -> Result<Vec<f64>, AppError> {
        let mut scores = Vec::with_capacity(questions.len());
        for question in questions {
            if let Some(answer) = self.store.answer_for_question(question.id).await? {
                scores.push(answer.score);
            }
        }
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::evaluation::FALLBACK_SCORE;
    use crate::llm_client::scripted::ScriptedGenerator;
    use crate::store::MemoryInterviewStore;

    fn engine(
        generator: ScriptedGenerator,
    ) -> (InterviewEngine, Arc<ScriptedGenerator>, Arc<MemoryInterviewStore>) {
        let generator = Arc::new(generator);
        let store = Arc::new(MemoryInterviewStore::new());
        let engine = InterviewEngine::new(
            generator.clone(),
            store.clone(),
            CategoryCycle::Alternating,
        );
        (engine, generator, store)
    }

    fn request(skills: &[&str]) -> StartInterview {
        StartInterview {
            position: "Backend Engineer".to_string(),
            difficulty: Difficulty::Mid,
            skills: skills.iter().map(|s| s.to_string()).collect(),
            resume: CandidateProfile::default(),
        }
    }

    async fn answer_count(store: &MemoryInterviewStore, session_id: &str) -> usize {
        let mut count = 0;
        for q in store.questions_for_session(session_id).await.unwrap() {
            if store.answer_for_question(q.id).await.unwrap().is_some() {
                count += 1;
            }
        }
        count
    }

    #[tokio::test]
    async fn test_full_session_with_working_model() {
        let mut script = Vec::new();
        for n in 1..=5 {
            script.push(format!(r#"{{"text": "Question {n}?", "focused_skills": ["Rust"]}}"#));
            script.push(format!(
                r#"{{"score": {}, "feedback": "Feedback {n}"}}"#,
                n + 5
            ));
        }
        let (engine, generator, store) = engine(ScriptedGenerator::replying(script));

        let started = engine.start(request(&["Rust", "SQL"])).await.unwrap();
        assert_eq!(started.question, "Question 1?");
        assert_eq!(started.question_type, Category::Technical);
        assert_eq!(started.total_questions, 5);

        let id = started.session_id.clone();
        for n in 1..=5u32 {
            let session = store.get_session(&id).await.unwrap().unwrap();
            assert!(!session.is_complete, "complete before answer {n}");

            let outcome = engine
                .submit_answer(&id, n, &format!("Answer {n}"))
                .await
                .unwrap();
            assert_eq!(outcome.score, (n + 5) as f64);
            assert_eq!(outcome.feedback, format!("Feedback {n}"));
            assert_eq!(outcome.question_number, n + 1);
            assert_eq!(outcome.is_complete, n == 5);
            if n < 5 {
                assert_eq!(outcome.next_question, Some(format!("Question {}?", n + 1)));
            }
        }

        assert_eq!(generator.calls(), 10);
        assert_eq!(store.questions_for_session(&id).await.unwrap().len(), 5);
        assert_eq!(answer_count(&store, &id).await, 5);

        let session = store.get_session(&id).await.unwrap().unwrap();
        assert!(session.is_complete);
        // mean of 6, 7, 8, 9, 10
        assert_eq!(session.final_score, Some(8.0));
    }

    #[tokio::test]
    async fn test_full_session_with_model_down() {
        let (engine, _generator, store) = engine(ScriptedGenerator::failing());

        let started = engine.start(request(&["Go", "Kubernetes"])).await.unwrap();
        assert_eq!(
            started.question,
            "Can you explain your experience with Go and how you've used it in your projects?"
        );

        let id = started.session_id;
        let mut last = None;
        for n in 1..=5u32 {
            let outcome = engine.submit_answer(&id, n, "I don't know").await.unwrap();
            assert_eq!(outcome.score, FALLBACK_SCORE);
            last = Some(outcome);
        }
        let last = last.unwrap();
        assert!(last.is_complete);
        assert_eq!(last.final_score, Some(7.0));

        let questions = store.questions_for_session(&id).await.unwrap();
        let categories: Vec<Category> = questions.iter().map(|q| q.question_type).collect();
        assert_eq!(
            categories,
            vec![
                Category::Technical,
                Category::Behavioral,
                Category::Technical,
                Category::Behavioral,
                Category::Technical,
            ]
        );
        assert_eq!(
            questions[2].question_text,
            "Can you describe a challenging technical problem you solved using Go?"
        );
        assert_eq!(
            questions[1].question_text,
            "Describe a challenging situation you faced and how you handled it."
        );
        assert_eq!(questions[1].focused_skills, Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_caller_errors_are_distinguishable() {
        let (engine, _generator, _store) = engine(ScriptedGenerator::failing());

        assert!(matches!(
            engine.submit_answer("nope", 1, "a").await,
            Err(AppError::NotFound(_))
        ));

        let id = engine.start(request(&[])).await.unwrap().session_id;
        assert!(matches!(
            engine.submit_answer(&id, 0, "a").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            engine.submit_answer(&id, 6, "a").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            engine.submit_answer(&id, 3, "a").await,
            Err(AppError::Conflict(_))
        ));

        engine.submit_answer(&id, 1, "a").await.unwrap();
        assert!(matches!(
            engine.submit_answer(&id, 1, "again").await,
            Err(AppError::Conflict(_))
        ));

        for n in 2..=5 {
            engine.submit_answer(&id, n, "a").await.unwrap();
        }
        assert!(matches!(
            engine.submit_answer(&id, 5, "late").await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_interrupted_submission_can_be_retried() {
        // call 0: question 1, call 1: evaluation, call 2: question 2 (never returns)
        let (engine, _generator, store) = engine(ScriptedGenerator::failing().stalling_at(2));
        let id = engine.start(request(&["Rust"])).await.unwrap().session_id;

        let interrupted = tokio::time::timeout(
            std::time::Duration::from_millis(200),
            engine.submit_answer(&id, 1, "first try"),
        )
        .await;
        assert!(interrupted.is_err());
        assert_eq!(answer_count(&store, &id).await, 0);
        assert_eq!(store.questions_for_session(&id).await.unwrap().len(), 1);

        let retried = engine.submit_answer(&id, 1, "second try").await.unwrap();
        assert_eq!(retried.question_number, 2);
        assert!(!retried.is_complete);

        let results = engine.results(&id).await.unwrap();
        assert_eq!(
            results.questions_and_answers[0].answer.as_deref(),
            Some("second try")
        );

        for n in 2..=5 {
            engine.submit_answer(&id, n, "a").await.unwrap();
        }
        let session = store.get_session(&id).await.unwrap().unwrap();
        assert!(session.is_complete);
        assert_eq!(session.final_score, Some(FALLBACK_SCORE));
    }

    #[tokio::test]
    async fn test_blank_position_is_rejected() {
        let (engine, generator, _store) = engine(ScriptedGenerator::failing());
        let mut req = request(&[]);
        req.position = "   ".to_string();
        assert!(matches!(
            engine.start(req).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_results_include_unanswered_question() {
        let (engine, _generator, _store) = engine(ScriptedGenerator::failing());
        let id = engine.start(request(&["Rust"])).await.unwrap().session_id;
        engine.submit_answer(&id, 1, "ownership").await.unwrap();

        let results = engine.results(&id).await.unwrap();
        assert!(!results.is_complete);
        assert_eq!(results.final_score, None);
        assert_eq!(results.questions_and_answers.len(), 2);
        assert_eq!(
            results.questions_and_answers[0].answer.as_deref(),
            Some("ownership")
        );
        assert_eq!(results.questions_and_answers[0].score, Some(FALLBACK_SCORE));
        assert_eq!(results.questions_and_answers[1].answer, None);
        assert_eq!(results.questions_and_answers[1].score, None);
    }

    #[tokio::test]
    async fn test_suggestions_use_answered_transcript() {
        let (engine, generator, _store) = engine(ScriptedGenerator::failing());
        let id = engine.start(request(&[])).await.unwrap().session_id;
        engine.submit_answer(&id, 1, "my first answer").await.unwrap();

        let summary = engine.suggestions(&id).await.unwrap();
        assert!(summary.suggestions.is_empty());
        assert!(!summary.overall_advice.is_empty());

        let last_prompt = generator.prompt(generator.calls() - 1);
        assert!(last_prompt.contains("my first answer"));
    }

    #[tokio::test]
    async fn test_skills_are_trimmed_and_deduplicated() {
        let (engine, _generator, store) = engine(ScriptedGenerator::failing());
        let id = engine
            .start(request(&[" Rust ", "Rust", "", "Go"]))
            .await
            .unwrap()
            .session_id;
        let session = store.get_session(&id).await.unwrap().unwrap();
        assert_eq!(session.skills, vec!["Rust", "Go"]);
    }
}
