// src/services/recommendation.rs

use std::collections::HashSet;

use crate::{
    config::{DEFAULT_SKILL_CATEGORY, PASSING_SCORE},
    error::AppError,
    models::{
        pagination::{Pagination, SkillPage},
        recommendation::{GapCandidate, Recommendation, RecommendedSkill},
        skill::{SkillAttempt, SkillStats},
    },
    store::Store,
};

/// Selects the skills a user failed, worst score first.
///
/// Attempts below `PASSING_SCORE` are ordered by score ascending, then by
/// completion time descending. A skill appears once, with its worst attempt.
pub fn select_gaps(history: &[SkillAttempt]) -> Vec<GapCandidate> {
    let mut failed: Vec<&SkillAttempt> = history
        .iter()
        .filter(|a| a.score < PASSING_SCORE)
        .collect();

    failed.sort_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then_with(|| b.completed_at.cmp(&a.completed_at))
    });

    let mut seen = HashSet::new();
    failed
        .into_iter()
        .filter(|a| seen.insert(a.skill_id))
        .map(|a| GapCandidate {
            skill_id: a.skill_id,
            name: a.name.clone(),
            category: a.category.clone(),
            description: a.description.clone(),
            difficulty: a.difficulty.clone(),
            previous_score: a.score,
            completed_at: a.completed_at,
        })
        .collect()
}

/// Distinct categories across the user's history, in first-seen order.
/// Falls back to `DEFAULT_SKILL_CATEGORY` for users without history.
pub fn user_categories(history: &[SkillAttempt]) -> Vec<String> {
    let mut seen = HashSet::new();
    let categories: Vec<String> = history
        .iter()
        .filter(|a| seen.insert(a.category.as_str()))
        .map(|a| a.category.clone())
        .collect();

    if categories.is_empty() {
        vec![DEFAULT_SKILL_CATEGORY.to_string()]
    } else {
        categories
    }
}

/// Every skill the user attempted plus every skill already listed as a gap.
pub fn excluded_skill_ids(history: &[SkillAttempt], gaps: &[GapCandidate]) -> HashSet<i64> {
    history
        .iter()
        .map(|a| a.skill_id)
        .chain(gaps.iter().map(|g| g.skill_id))
        .collect()
}

/// Number of backfill slots left on a page once gaps are placed.
pub fn remaining_slots(page_size: usize, gap_count: usize) -> usize {
    page_size.saturating_sub(gap_count)
}

/// Ranks not-yet-attempted skills and keeps the best `remaining`.
///
/// Order: in `categories` first, then popularity descending, then average
/// score ascending (often attempted but poorly scored skills rank higher),
/// then id ascending.
pub fn rank_backfill(
    candidates: Vec<SkillStats>,
    categories: &[String],
    exclude: &HashSet<i64>,
    remaining: usize,
) -> Vec<RecommendedSkill> {
    if remaining == 0 {
        return Vec::new();
    }

    let in_categories = |s: &SkillStats| categories.iter().any(|c| c == &s.category);

    let mut eligible: Vec<SkillStats> = candidates
        .into_iter()
        .filter(|s| !exclude.contains(&s.id) && in_categories(s))
        .collect();

    eligible.sort_by(|a, b| {
        in_categories(b)
            .cmp(&in_categories(a))
            .then_with(|| b.popularity.cmp(&a.popularity))
            .then_with(|| a.avg_score.total_cmp(&b.avg_score))
            .then_with(|| a.id.cmp(&b.id))
    });

    eligible
        .into_iter()
        .take(remaining)
        .map(|s| RecommendedSkill {
            id: s.id,
            name: s.name,
            category: s.category,
            description: s.description,
            difficulty: s.difficulty,
            reason: Recommendation::New {
                popularity: s.popularity,
                avg_score: s.avg_score,
                is_new: true,
            },
        })
        .collect()
}

/// Supplementary skills that fill a page when there are fewer gaps than `page_size`.
pub fn backfill(
    history: &[SkillAttempt],
    gaps: &[GapCandidate],
    candidates: Vec<SkillStats>,
    page_size: usize,
) -> Vec<RecommendedSkill> {
    let remaining = remaining_slots(page_size, gaps.len());
    if remaining == 0 {
        return Vec::new();
    }

    let categories = user_categories(history);
    let exclude = excluded_skill_ids(history, gaps);
    rank_backfill(candidates, &categories, &exclude, remaining)
}

/// Gap candidates followed by backfill results.
pub fn combine(gaps: Vec<GapCandidate>, backfill: Vec<RecommendedSkill>) -> Vec<RecommendedSkill> {
    gaps.into_iter()
        .map(RecommendedSkill::from)
        .chain(backfill)
        .collect()
}

/// Computes the full recommendation list for a user and returns one page of it.
///
/// The list is re-derived from the attempt log on every call.
pub async fn recommend(
    store: &dyn Store,
    user_id: i64,
    pagination: Pagination,
) -> Result<SkillPage<RecommendedSkill>, AppError> {
    let history = store.skill_attempt_history(user_id).await?;
    let gaps = select_gaps(&history);
    let page_size = pagination.limit as usize;

    let extra = if remaining_slots(page_size, gaps.len()) > 0 {
        let categories = user_categories(&history);
        let candidates = store.candidate_skills(&categories).await?;
        backfill(&history, &gaps, candidates, page_size)
    } else {
        Vec::new()
    };

    tracing::debug!(
        user_id,
        gaps = gaps.len(),
        backfill = extra.len(),
        "Computed skill recommendations"
    );

    Ok(SkillPage::slice(combine(gaps, extra), pagination))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::*;

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn attempt(attempt_id: i64, skill_id: i64, category: &str, score: f64, minutes: i64) -> SkillAttempt {
        SkillAttempt {
            attempt_id,
            skill_id,
            name: format!("Skill {}", skill_id),
            category: category.to_string(),
            description: String::new(),
            difficulty: "Beginner".to_string(),
            score,
            completed_at: at(minutes),
        }
    }

    fn stats(id: i64, category: &str, popularity: i64, avg_score: f64) -> SkillStats {
        SkillStats {
            id,
            name: format!("Skill {}", id),
            category: category.to_string(),
            description: String::new(),
            difficulty: "Intermediate".to_string(),
            popularity,
            avg_score,
        }
    }

    #[test]
    fn test_select_gaps_filters_and_orders() {
        let history = vec![
            attempt(1, 10, "Technical Skills", 55.0, 1),
            attempt(2, 11, "Technical Skills", 90.0, 2),
            attempt(3, 12, "Technical Skills", 30.0, 3),
            attempt(4, 13, "Technical Skills", 55.0, 9),
            attempt(5, 14, "Technical Skills", 70.0, 4),
        ];

        let gaps = select_gaps(&history);
        let ids: Vec<i64> = gaps.iter().map(|g| g.skill_id).collect();
        // 30 first, then the two 55s with the most recent first; 70 passes.
        assert_eq!(ids, vec![12, 13, 10]);

        for pair in gaps.windows(2) {
            assert!(pair[0].previous_score <= pair[1].previous_score);
            if pair[0].previous_score == pair[1].previous_score {
                assert!(pair[0].completed_at >= pair[1].completed_at);
            }
        }
    }

    #[test]
    fn test_select_gaps_keeps_worst_attempt_per_skill() {
        let history = vec![
            attempt(1, 10, "Technical Skills", 60.0, 1),
            attempt(2, 10, "Technical Skills", 20.0, 2),
        ];

        let gaps = select_gaps(&history);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].previous_score, 20.0);
    }

    #[test]
    fn test_user_categories_default() {
        assert_eq!(user_categories(&[]), vec![DEFAULT_SKILL_CATEGORY.to_string()]);

        let history = vec![
            attempt(1, 1, "Soft", 10.0, 1),
            attempt(2, 2, "Hard", 10.0, 2),
            attempt(3, 3, "Soft", 10.0, 3),
        ];
        assert_eq!(user_categories(&history), vec!["Soft".to_string(), "Hard".to_string()]);
    }

    #[test]
    fn test_rank_backfill_ordering() {
        let categories = vec!["Technical Skills".to_string()];
        let candidates = vec![
            stats(1, "Technical Skills", 3, 80.0),
            stats(2, "Technical Skills", 5, 60.0),
            stats(3, "Technical Skills", 5, 40.0),
            stats(4, "Technical Skills", 0, 0.0),
            stats(5, "Creative Skills", 50, 10.0),
        ];

        let ranked = rank_backfill(candidates, &categories, &HashSet::new(), 10);
        let ids: Vec<i64> = ranked.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 1, 4]);
        assert!(ranked.iter().all(|r| matches!(r.reason, Recommendation::New { is_new: true, .. })));
    }

    #[test]
    fn test_rank_backfill_respects_exclusions_and_limit() {
        let categories = vec!["Technical Skills".to_string()];
        let candidates = (1..=8).map(|id| stats(id, "Technical Skills", id, 50.0)).collect();
        let exclude: HashSet<i64> = [8, 7].into_iter().collect();

        let ranked = rank_backfill(candidates, &categories, &exclude, 3);
        let ids: Vec<i64> = ranked.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![6, 5, 4]);

        let none = rank_backfill(vec![stats(1, "Technical Skills", 1, 1.0)], &categories, &exclude, 0);
        assert!(none.is_empty());
    }

    #[test]
    fn test_backfill_scenario_one_gap() {
        let history = vec![
            attempt(1, 1, "Cognitive Skills", 40.0, 1),
            attempt(2, 2, "Cognitive Skills", 90.0, 2),
        ];
        let gaps = select_gaps(&history);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].skill_id, 1);
        assert_eq!(gaps[0].previous_score, 40.0);

        let candidates: Vec<SkillStats> = (1..=9)
            .map(|id| stats(id, "Cognitive Skills", 10 - id, 50.0))
            .collect();

        let extra = backfill(&history, &gaps, candidates, 6);
        assert_eq!(extra.len(), 5);
        assert!(extra.iter().all(|r| r.id != 1 && r.id != 2));

        let combined = combine(gaps, extra);
        assert_eq!(combined.len(), 6);
        let ids: HashSet<i64> = combined.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), combined.len());
        assert!(matches!(
            combined[0].reason,
            Recommendation::Gap { previous_score, needs_improvement: true } if previous_score == 40.0
        ));
    }

    #[test]
    fn test_backfill_empty_when_gaps_fill_page() {
        let history: Vec<SkillAttempt> = (1..=4)
            .map(|id| attempt(id, id, "Cognitive Skills", 10.0, id))
            .collect();
        let gaps = select_gaps(&history);
        let candidates = vec![stats(99, "Cognitive Skills", 1, 1.0)];

        assert!(backfill(&history, &gaps, candidates.clone(), 4).is_empty());
        assert!(backfill(&history, &gaps, candidates.clone(), 2).is_empty());
        assert_eq!(backfill(&history, &gaps, candidates, 5).len(), 1);
    }
}
