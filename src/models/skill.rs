// src/models/skill.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::validate_not_blank;
use crate::config::SKILL_CATEGORIES;

/// Skill difficulty level. Stored as text in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents the 'skills' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Skill {
    pub id: i64,
    pub name: String,

    /// One of `SKILL_CATEGORIES`.
    pub category: String,

    pub description: String,

    /// 'Beginner', 'Intermediate' or 'Advanced'.
    pub difficulty: String,

    /// Number of attempts recorded against assessments of this skill.
    pub assessment_count: i64,

    /// Mean attempt score, 0 when nothing has been recorded.
    pub average_score: f64,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a new skill.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSkillRequest {
    #[validate(length(min = 1, max = 100), custom(function = validate_not_blank))]
    pub name: String,
    #[validate(custom(function = validate_category))]
    pub category: String,
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
    pub difficulty: Difficulty,
}

pub fn validate_category(category: &str) -> Result<(), validator::ValidationError> {
    if SKILL_CATEGORIES.contains(&category) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("unknown_category"))
    }
}

/// Filter for the skill catalog. `limit` and `offset` are already resolved.
#[derive(Debug, Clone, Default)]
pub struct SkillFilter {
    pub category: Option<String>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Query parameters for listing skills.
#[derive(Debug, Default, Deserialize)]
pub struct SkillListParams {
    pub page: Option<String>,
    pub limit: Option<String>,

    /// Category filter; "All" disables it.
    pub category: Option<String>,

    /// Substring match against name or description.
    pub search: Option<String>,
}

/// One of a user's attempts joined to the skill its assessment measures.
#[derive(Debug, Clone, FromRow)]
pub struct SkillAttempt {
    pub attempt_id: i64,
    pub skill_id: i64,
    pub name: String,
    pub category: String,
    pub description: String,
    pub difficulty: String,
    pub score: f64,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// A skill annotated with attempt statistics across all users.
#[derive(Debug, Clone, FromRow)]
pub struct SkillStats {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub description: String,
    pub difficulty: String,

    /// Count of attempts on this skill.
    pub popularity: i64,

    /// Mean attempt score, 0 when nobody has attempted it.
    pub avg_score: f64,
}
