// src/handlers/skill.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        pagination::{PageParams, Pagination, SkillPage},
        skill::{CreateSkillRequest, SkillFilter, SkillListParams},
    },
    services::recommendation::recommend,
    store::Store,
    utils::jwt::Claims,
};

/// Lists the skill catalog with pagination.
/// `category=All` (or no category) disables the category filter.
pub async fn list_skills(
    State(store): State<Arc<dyn Store>>,
    Query(params): Query<SkillListParams>,
) -> Result<impl IntoResponse, AppError> {
    let pagination = Pagination::from_raw(params.page.as_deref(), params.limit.as_deref());

    let filter = SkillFilter {
        category: params
            .category
            .filter(|c| !c.is_empty() && c != "All"),
        search: params
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        limit: pagination.limit as i64,
        offset: pagination.offset() as i64,
    };

    let (skills, total) = store.list_skills(&filter).await?;

    Ok(Json(SkillPage::new(skills, total, pagination)))
}

/// Creates a skill.
/// Admin only.
pub async fn create_skill(
    State(store): State<Arc<dyn Store>>,
    Json(mut payload): Json<CreateSkillRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    payload.name = payload.name.trim().to_string();

    let skill = store.create_skill(payload).await?;

    Ok((StatusCode::CREATED, Json(skill)))
}

/// Recommended skills for the current user: failed skills first,
/// then not-yet-attempted skills from the user's categories.
pub async fn recommended_skills(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let page = recommend(store.as_ref(), user_id, params.pagination()).await?;

    Ok(Json(page))
}
