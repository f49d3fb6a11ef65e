use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::profile::CandidateProfile;

/// Every interview runs exactly this many questions.
pub const TOTAL_QUESTIONS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Junior,
    Mid,
    Senior,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Junior => "junior",
            Difficulty::Mid => "mid",
            Difficulty::Senior => "senior",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    /// Accepts the common synonyms a client might send.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "junior" | "entry" | "entry-level" | "beginner" | "easy" => Ok(Difficulty::Junior),
            "mid" | "mid-level" | "intermediate" | "medium" => Ok(Difficulty::Mid),
            "senior" | "advanced" | "expert" | "hard" => Ok(Difficulty::Senior),
            other => Err(format!("unknown difficulty '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Technical,
    Behavioral,
    Industry,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Technical => "technical",
            Category::Behavioral => "behavioral",
            Category::Industry => "industry",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "technical" => Ok(Category::Technical),
            "behavioral" => Ok(Category::Behavioral),
            "industry" => Ok(Category::Industry),
            other => Err(format!("unknown question category '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSession {
    pub session_id: String,
    pub position: String,
    pub difficulty: Difficulty,
    pub skills: Vec<String>,
    pub resume_analysis: CandidateProfile,
    pub total_questions: u32,
    pub is_complete: bool,
    pub final_score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub session_id: String,
    pub question_number: u32,
    pub question_text: String,
    pub question_type: Category,
    pub focused_skills: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub id: Uuid,
    pub question_id: Uuid,
    pub answer_text: String,
    pub ai_feedback: String,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}
