// src/services/scoring.rs

use serde::Serialize;

use crate::config::{EXCELLENT_SCORE, PASSING_SCORE};

/// Qualitative verdict for a score on the 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub feedback: &'static str,
    pub passed: bool,
}

pub const EXCELLENT_FEEDBACK: &str = "Excellent performance! Keep up the great work.";
pub const GOOD_FEEDBACK: &str = "Good job! You can improve with more practice.";
pub const NEEDS_IMPROVEMENT_FEEDBACK: &str =
    "Needs improvement. Consider reviewing the material again.";

/// Maps a score to feedback text and a pass flag.
///
/// Tiers: `>= 80` excellent, `>= 70` good, anything lower needs improvement.
/// `passed` is exactly `score >= 70`, so every passing score gets positive feedback.
pub fn classify(score: f64) -> Classification {
    let passed = is_passing(score);
    let feedback = if score >= EXCELLENT_SCORE {
        EXCELLENT_FEEDBACK
    } else if passed {
        GOOD_FEEDBACK
    } else {
        NEEDS_IMPROVEMENT_FEEDBACK
    };

    Classification { feedback, passed }
}

pub fn is_passing(score: f64) -> bool {
    score >= PASSING_SCORE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_passing_scores() {
        assert_eq!(
            classify(85.0),
            Classification { feedback: EXCELLENT_FEEDBACK, passed: true }
        );
        assert_eq!(
            classify(70.0),
            Classification { feedback: GOOD_FEEDBACK, passed: true }
        );
        assert!(classify(100.0).passed);
    }

    #[test]
    fn test_classify_failing_scores() {
        assert_eq!(
            classify(65.0),
            Classification { feedback: NEEDS_IMPROVEMENT_FEEDBACK, passed: false }
        );
        assert!(!classify(69.99).passed);
        assert!(!classify(0.0).passed);
    }

    #[test]
    fn test_classify_is_monotonic() {
        let mut seen_pass = false;
        for tenth in 0..=1000 {
            let score = tenth as f64 / 10.0;
            let c = classify(score);
            assert_eq!(c.passed, score >= 70.0, "score {}", score);
            if seen_pass {
                assert!(c.passed, "score {} fell back below the threshold", score);
            }
            seen_pass |= c.passed;
        }
    }
}
