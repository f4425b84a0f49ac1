// src/handlers/assessment.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        assessment::{CreateAssessmentRequest, NewAssessment},
        attempt::{NewAttempt, SubmitAttemptRequest},
        question::{CreateQuestionRequest, NewQuestion, PublicQuestion},
    },
    services::{report::submit_attempt, scoring::classify},
    store::Store,
    utils::{html::clean_html, jwt::Claims},
};

/// Lists all assessments.
pub async fn list_assessments(
    State(store): State<Arc<dyn Store>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(store.list_assessments().await?))
}

/// Get a single assessment by ID.
pub async fn get_assessment(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let assessment = store
        .find_assessment(id)
        .await?
        .ok_or(AppError::NotFound("Assessment not found".to_string()))?;

    Ok(Json(assessment))
}

/// Creates a new assessment.
/// Admin only.
pub async fn create_assessment(
    State(store): State<Arc<dyn Store>>,
    Json(payload): Json<CreateAssessmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let assessment = store
        .create_assessment(NewAssessment {
            title: payload.title.trim().to_string(),
            description: clean_html(&payload.description),
            skill_id: payload.skill_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(assessment)))
}

/// Lists the questions of an assessment, without correct answers.
pub async fn list_questions(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if store.find_assessment(id).await?.is_none() {
        return Err(AppError::NotFound("Assessment not found".to_string()));
    }

    let questions: Vec<PublicQuestion> = store
        .list_questions(id)
        .await?
        .into_iter()
        .map(PublicQuestion::from)
        .collect();

    Ok(Json(questions))
}

/// Adds a question to an assessment.
/// Admin only. The correct answer must be one of the options.
pub async fn add_question(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if !payload.options.contains(&payload.correct_answer) {
        return Err(AppError::BadRequest(
            "Correct answer must be one of the options".to_string(),
        ));
    }

    let question = store
        .add_question(NewQuestion {
            assessment_id: id,
            question_text: payload.question_text,
            correct_answer: payload.correct_answer,
            options: payload.options,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(json!({"id": question.id}))))
}

/// Records a completed assessment for the current user and generates its report.
///
/// * The user comes from the token, never from the body.
/// * Score must be finite and within 0-100.
/// * Attempt and report are written together.
pub async fn submit_assessment(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Path(assessment_id): Path<i64>,
    Json(req): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    if !req.score.is_finite() {
        return Err(AppError::BadRequest("Score must be a finite number".to_string()));
    }
    req.validate()?;

    let submission = submit_attempt(
        store.as_ref(),
        NewAttempt {
            user_id,
            assessment_id,
            score: req.score,
            completed_at: Utc::now(),
        },
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Assessment submitted and report generated successfully",
        "assessment_id": assessment_id,
        "score": req.score,
        "passed": classify(req.score).passed,
        "user_assessment_id": submission.user_assessment_id,
        "report_id": submission.report_id,
    })))
}
