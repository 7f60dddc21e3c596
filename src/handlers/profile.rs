// src/handlers/profile.rs

use axum::{Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    error::AppError,
    models::profile::{NewProfile, ProfileUpdate, UpdateProfileRequest},
    storage::SharedStorage,
    utils::{html::clean_text, jwt::CurrentUser},
};

/// Returns the current user's profile.
pub async fn get_me(
    State(storage): State<SharedStorage>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let profile = storage
        .read_profile(user.id)
        .await?
        .ok_or(AppError::NotFound("Profile not found".to_string()))?;

    Ok(Json(profile))
}

/// Updates name and language. Creates the profile first if it is missing.
pub async fn update_me(
    State(storage): State<SharedStorage>,
    user: CurrentUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    // Sanitize before storing; the name is rendered on the dashboard.
    let full_name = payload.full_name.as_deref().map(clean_text);

    if storage.read_profile(user.id).await?.is_none() {
        storage
            .create_profile(NewProfile {
                id: user.id,
                email: user.email.clone(),
                full_name: None,
            })
            .await?;
    }

    let profile = storage
        .update_profile(
            user.id,
            ProfileUpdate {
                full_name,
                preferred_language: payload.preferred_language,
            },
        )
        .await?;

    tracing::info!(user = %user.id, "Profile updated");
    Ok(Json(profile))
}
