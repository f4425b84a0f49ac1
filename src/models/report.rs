// src/models/report.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'assessment_reports' table in the database.
/// Title, description, score and completion time are copied from the attempt
/// when the report is generated, so later edits to the assessment don't change it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub user_assessment_id: i64,
    pub user_id: i64,
    pub assessment_id: i64,
    pub score: f64,
    pub completed_at: chrono::DateTime<chrono::Utc>,
    pub title: String,
    pub description: String,
    pub feedback: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Insert payload for a report.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub user_assessment_id: i64,
    pub user_id: i64,
    pub assessment_id: i64,
    pub score: f64,
    pub completed_at: chrono::DateTime<chrono::Utc>,
    pub title: String,
    pub description: String,
    pub feedback: String,
}

/// Report as sent to the client, with the derived pass flag.
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    #[serde(flatten)]
    pub report: Report,
    pub passed: bool,
}

/// Result of generating a report.
#[derive(Debug, Serialize)]
pub struct GeneratedReport {
    pub success: bool,
    pub message: String,
    pub report_id: i64,
}
