use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod certificate;
pub mod quiz;

/// Completion marker for a lesson, upserted keyed on (user_id, lesson_id).
/// Passing the lesson quiz again only refreshes `completed_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonProgress {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub lesson_id: String,
    pub completed_at: DateTime<Utc>,
}

impl LessonProgress {
    /// Deterministic document id so repeated passes land on the same row.
    pub fn document_id(user_id: &str, lesson_id: &str) -> String {
        format!("{}:{}", user_id, lesson_id)
    }
}
