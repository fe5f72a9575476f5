use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Operator-confirmed text to draw onto the certificate template.
///
/// The three strings are taken as-is: the service checks only that none is
/// empty, not that the name or date are factually right.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IssueCertificateRequest {
    #[validate(length(min = 1, message = "course_id must not be empty"))]
    pub course_id: String,
    /// Large bold line under the heading, e.g. "Lauren Burrell".
    #[validate(length(min = 1, message = "name_text must not be empty"))]
    pub name_text: String,
    /// Sentence describing the achievement, e.g.
    /// "for completing Fastener Selection for Commercial Rooftop Equipment".
    #[validate(length(min = 1, message = "completion_line must not be empty"))]
    pub completion_line: String,
    /// Already-formatted date string, e.g. "December 9, 2025".
    #[validate(length(min = 1, message = "completion_date must not be empty"))]
    pub completion_date: String,
}

/// Metadata row persisted after a certificate PDF is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub certificate_url: String,
    /// Display serial. Random decimal digits, not checked for collisions.
    pub certificate_number: String,
    pub issued_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}
