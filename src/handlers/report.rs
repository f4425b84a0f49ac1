// src/handlers/report.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{attempt::AttemptHistoryEntry, report::ReportResponse},
    services::{report::generate_report, scoring::is_passing},
    store::Store,
    utils::jwt::Claims,
};

/// The current user's assessment history, most recent first.
pub async fn get_history(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let history: Vec<AttemptHistoryEntry> = store
        .attempt_history(user_id)
        .await?
        .into_iter()
        .map(|row| AttemptHistoryEntry {
            passed: is_passing(row.score),
            id: row.id,
            report_id: row.report_id,
            title: row.title,
            completed_at: row.completed_at,
            score: row.score,
        })
        .collect();

    Ok(Json(history))
}

/// Generates a fresh report for one of the current user's attempts.
/// Each call stores a new report.
pub async fn regenerate_report(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let generated = generate_report(store.as_ref(), user_id, attempt_id).await?;
    Ok(Json(generated))
}

/// Fetches a stored report owned by the current user.
pub async fn get_report(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Path(report_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let report = store
        .find_report(report_id)
        .await?
        .filter(|r| r.user_id == user_id)
        .ok_or(AppError::NotFound("Report not found".to_string()))?;

    Ok(Json(ReportResponse {
        passed: is_passing(report.score),
        report,
    }))
}
