// src/models/recommendation.rs

use serde::Serialize;

/// A skill the user previously scored below the passing threshold on.
#[derive(Debug, Clone, PartialEq)]
pub struct GapCandidate {
    pub skill_id: i64,
    pub name: String,
    pub category: String,
    pub description: String,
    pub difficulty: String,
    pub previous_score: f64,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// An entry of the recommendation list returned to the client.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecommendedSkill {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub description: String,
    pub difficulty: String,
    #[serde(flatten)]
    pub reason: Recommendation,
}

/// Why a skill is on the list.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Recommendation {
    /// Previously failed; serialized with `needs_improvement: true`.
    Gap {
        previous_score: f64,
        needs_improvement: bool,
    },
    /// Not yet attempted; serialized with `is_new: true`.
    New {
        popularity: i64,
        avg_score: f64,
        is_new: bool,
    },
}

impl From<GapCandidate> for RecommendedSkill {
    fn from(gap: GapCandidate) -> Self {
        Self {
            id: gap.skill_id,
            name: gap.name,
            category: gap.category,
            description: gap.description,
            difficulty: gap.difficulty,
            reason: Recommendation::Gap {
                previous_score: gap.previous_score,
                needs_improvement: true,
            },
        }
    }
}
