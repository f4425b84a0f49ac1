// src/services/report.rs

use crate::{
    error::AppError,
    models::{
        attempt::{AttemptDetail, NewAttempt, Submission},
        report::{GeneratedReport, NewReport},
    },
    services::scoring::classify,
    store::Store,
};

/// Builds the report row for an attempt.
///
/// All denormalized fields are copied from `detail` as they are now; the
/// feedback text comes from the score classifier.
pub fn build_report(detail: &AttemptDetail) -> NewReport {
    let classification = classify(detail.score);

    NewReport {
        user_assessment_id: detail.user_assessment_id,
        user_id: detail.user_id,
        assessment_id: detail.assessment_id,
        score: detail.score,
        completed_at: detail.completed_at,
        title: detail.title.clone(),
        description: detail.description.clone(),
        feedback: classification.feedback.to_string(),
    }
}

/// Records a submission and its report in one storage transaction.
/// The report row comes from [`build_report`].
pub async fn submit_attempt(store: &dyn Store, attempt: NewAttempt) -> Result<Submission, AppError> {
    let user_id = attempt.user_id;
    let assessment_id = attempt.assessment_id;
    let submission = store.submit_attempt(attempt, build_report).await?;

    tracing::info!(
        user_id,
        assessment_id,
        attempt_id = submission.user_assessment_id,
        report_id = submission.report_id,
        "Assessment submitted"
    );

    Ok(submission)
}

/// Generates and stores a new report for one of `user_id`'s attempts.
///
/// Not idempotent: each call inserts another report row. Someone else's
/// attempt is reported as missing.
pub async fn generate_report(
    store: &dyn Store,
    user_id: i64,
    attempt_id: i64,
) -> Result<GeneratedReport, AppError> {
    let detail = load_attempt(store, attempt_id).await?;
    if detail.user_id != user_id {
        return Err(AppError::NotFound("Assessment attempt not found".to_string()));
    }
    store_report(store, &detail).await
}

async fn load_attempt(store: &dyn Store, attempt_id: i64) -> Result<AttemptDetail, AppError> {
    store
        .find_attempt_detail(attempt_id)
        .await?
        .ok_or(AppError::NotFound("Assessment attempt not found".to_string()))
}

async fn store_report(store: &dyn Store, detail: &AttemptDetail) -> Result<GeneratedReport, AppError> {
    let report_id = store.insert_report(build_report(detail)).await?;

    tracing::info!(
        attempt_id = detail.user_assessment_id,
        report_id,
        "Assessment report generated"
    );

    Ok(GeneratedReport {
        success: true,
        message: "Assessment report generated successfully".to_string(),
        report_id,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::{
        models::{assessment::NewAssessment, user::NewUser},
        services::scoring::{EXCELLENT_FEEDBACK, NEEDS_IMPROVEMENT_FEEDBACK},
        store::memory::MemoryStore,
    };

    fn detail(score: f64) -> AttemptDetail {
        AttemptDetail {
            user_assessment_id: 11,
            user_id: 3,
            assessment_id: 7,
            score,
            completed_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
            title: "Logical Reasoning".to_string(),
            description: "Patterns and deduction".to_string(),
        }
    }

    async fn seeded_attempt(store: &MemoryStore, score: f64) -> (i64, i64) {
        let user = store
            .create_user(NewUser {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                password: "hash".to_string(),
                role: "user".to_string(),
            })
            .await
            .unwrap();
        let assessment = store
            .create_assessment(NewAssessment {
                title: "Logical Reasoning".to_string(),
                description: "Patterns and deduction".to_string(),
                skill_id: None,
            })
            .await
            .unwrap();
        let submission = submit_attempt(
            store,
            NewAttempt {
                user_id: user.id,
                assessment_id: assessment.id,
                score,
                completed_at: Utc::now(),
            },
        )
        .await
        .unwrap();
        (user.id, submission.user_assessment_id)
    }

    #[test]
    fn test_build_report_copies_fields() {
        let report = build_report(&detail(92.0));
        assert_eq!(report.user_assessment_id, 11);
        assert_eq!(report.user_id, 3);
        assert_eq!(report.assessment_id, 7);
        assert_eq!(report.title, "Logical Reasoning");
        assert_eq!(report.description, "Patterns and deduction");
        assert_eq!(report.completed_at, detail(92.0).completed_at);
        assert_eq!(report.feedback, EXCELLENT_FEEDBACK);
    }

    #[test]
    fn test_build_report_failing_feedback() {
        let report = build_report(&detail(40.0));
        assert_eq!(report.score, 40.0);
        assert_eq!(report.feedback, NEEDS_IMPROVEMENT_FEEDBACK);
    }

    #[tokio::test]
    async fn test_generate_report_missing_attempt() {
        let store = MemoryStore::new();
        let err = generate_report(&store, 1, 999).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.report_count().await, 0);
    }

    #[tokio::test]
    async fn test_generate_report_twice_creates_two_reports() {
        let store = MemoryStore::new();
        let (user_id, attempt_id) = seeded_attempt(&store, 55.0).await;
        // Submission already produced one report.
        assert_eq!(store.report_count().await, 1);

        let first = generate_report(&store, user_id, attempt_id).await.unwrap();
        let second = generate_report(&store, user_id, attempt_id).await.unwrap();
        assert!(first.success && second.success);
        assert_ne!(first.report_id, second.report_id);
        assert_eq!(store.report_count().await, 3);
    }

    #[tokio::test]
    async fn test_generate_report_rejects_other_users() {
        let store = MemoryStore::new();
        let (_, attempt_id) = seeded_attempt(&store, 80.0).await;

        let err = generate_report(&store, 4242, attempt_id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.report_count().await, 1);
    }
}
