// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use super::validate_not_blank;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// Parent assessment.
    pub assessment_id: i64,

    /// The text content of the question.
    pub question_text: String,

    /// The correct answer; always one of `options`.
    pub correct_answer: String,

    /// List of options (e.g., ["Option A", "Option B"]).
    /// Stored as a JSON array in the database.
    pub options: Json<Vec<String>>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for sending question to client (excludes the correct answer).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub assessment_id: i64,
    pub question_text: String,
    pub options: Json<Vec<String>>,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            assessment_id: q.assessment_id,
            question_text: q.question_text,
            options: q.options,
        }
    }
}

/// DTO for adding a question to an assessment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000), custom(function = validate_not_blank))]
    pub question_text: String,
    #[validate(length(min = 1, max = 500))]
    pub correct_answer: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.is_empty() {
        return Err(validator::ValidationError::new("options_cannot_be_empty"));
    }
    for opt in options {
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

/// Insert payload for a question.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub assessment_id: i64,
    pub question_text: String,
    pub correct_answer: String,
    pub options: Vec<String>,
}
