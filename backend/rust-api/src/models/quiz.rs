use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Quiz attached to a lesson. Authored externally; read-only here.
///
/// `pass_score` is the minimum number of correct answers required to pass.
/// When unset, a perfect score is required. `max_attempts` is carried for
/// display; attempt limiting is not enforced by this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizDefinition {
    #[serde(rename = "_id")]
    pub id: String,
    pub lesson_id: String,
    pub title: Option<String>,
    pub pass_score: Option<u32>,
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    #[serde(rename = "_id")]
    pub id: String,
    pub quiz_id: String,
    pub question_text: String,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizOption {
    #[serde(rename = "_id")]
    pub id: String,
    pub question_id: String,
    pub option_text: String,
    pub is_correct: bool,
    pub sort_order: Option<i32>,
}

/// Outcome of grading one submission. Computed synchronously, handed back to
/// the caller; attempt history is persisted separately as [`QuizAttempt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreResult {
    pub correct: u32,
    pub total: u32,
    pub pass_score: u32,
    pub passed: bool,
}

/// One learner submission, stored verbatim alongside the verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub quiz_id: String,
    pub score: u32,
    pub passed: bool,
    pub started_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
    pub raw_answers: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    /// question id -> selected option id
    pub answers: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitQuizResponse {
    pub correct: u32,
    pub total: u32,
    pub pass_score: u32,
    pub passed: bool,
    pub message: String,
}

// Read-side DTOs. Correctness flags stay server-side; the client only ever
// sees option ids and text.

#[derive(Debug, Serialize)]
pub struct LessonQuizResponse {
    pub quiz: QuizSummary,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Serialize)]
pub struct QuizSummary {
    pub id: String,
    pub title: Option<String>,
    pub pass_score: Option<u32>,
    pub max_attempts: Option<u32>,
    pub total_questions: usize,
}

#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub question_text: String,
    pub options: Vec<OptionView>,
}

#[derive(Debug, Serialize)]
pub struct OptionView {
    pub id: String,
    pub option_text: String,
}
