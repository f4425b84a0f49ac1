// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'user_assessments' table in the database.
/// Append-only: one row per submission, never updated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub user_id: i64,
    pub assessment_id: i64,

    /// Score on the 0-100 scale.
    pub score: f64,

    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// An attempt joined with its assessment's title and description.
/// This is the input of the report generator.
#[derive(Debug, Clone, FromRow)]
pub struct AttemptDetail {
    pub user_assessment_id: i64,
    pub user_id: i64,
    pub assessment_id: i64,
    pub score: f64,
    pub completed_at: chrono::DateTime<chrono::Utc>,
    pub title: String,
    pub description: String,
}

/// Row of a user's attempt history.
#[derive(Debug, Clone, FromRow)]
pub struct AttemptSummary {
    pub id: i64,
    pub report_id: Option<i64>,
    pub title: String,
    pub completed_at: chrono::DateTime<chrono::Utc>,
    pub score: f64,
}

/// History entry as sent to the client.
#[derive(Debug, Serialize)]
pub struct AttemptHistoryEntry {
    pub id: i64,
    pub report_id: Option<i64>,
    pub title: String,
    pub completed_at: chrono::DateTime<chrono::Utc>,
    pub score: f64,
    pub passed: bool,
}

/// DTO for submitting an assessment result.
/// The user is taken from the verified token, never from the body.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAttemptRequest {
    #[validate(range(min = 0.0, max = 100.0, message = "Score must be between 0 and 100."))]
    pub score: f64,
}

/// Insert payload for an attempt.
#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub user_id: i64,
    pub assessment_id: i64,
    pub score: f64,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// Outcome of a submission: the attempt and the report generated for it.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Submission {
    pub user_assessment_id: i64,
    pub report_id: i64,
}
