use std::sync::Arc;

use axum::{Extension, Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    error::AppError,
    models::user::ProfilePatch,
    store::Store,
    utils::{html::clean_html, jwt::Claims},
};

/// Get current user's profile with associated skills.
pub async fn get_profile(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let profile = store
        .find_profile(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(profile))
}

/// Partially update the current user's profile.
/// Only fields present in the body are changed; returns the full profile.
pub async fn update_profile(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Json(mut patch): Json<ProfilePatch>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    if let Err(errors) = patch.validate() {
        if errors.field_errors().contains_key("email") {
            return Err(AppError::BadRequest("Invalid email format".to_string()));
        }
        return Err(errors.into());
    }

    let profile = if patch.is_empty() {
        store.find_profile(user_id).await?
    } else {
        patch.name = patch.name.map(|name| name.trim().to_string());
        patch.bio = patch.bio.map(|bio| clean_html(&bio));
        store.update_profile(user_id, patch).await?
    };

    let profile = profile
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(profile))
}
