// src/models/assessment.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::validate_not_blank;

/// Represents the 'assessments' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Assessment {
    pub id: i64,
    pub title: String,
    pub description: String,

    /// Skill this assessment measures. Attempts on assessments without one
    /// never show up in recommendations.
    pub skill_id: Option<i64>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a new assessment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAssessmentRequest {
    #[validate(length(min = 1, max = 200), custom(function = validate_not_blank))]
    pub title: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
    pub skill_id: Option<i64>,
}

/// Insert payload for an assessment, after sanitization.
#[derive(Debug, Clone)]
pub struct NewAssessment {
    pub title: String,
    pub description: String,
    pub skill_id: Option<i64>,
}
