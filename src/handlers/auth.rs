// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{
        profile::NewProfile,
        user::{CreateUserRequest, LoginRequest, NewUser},
    },
    storage::SharedStorage,
    utils::{
        hash::{hash_password, verify_password},
        html::clean_text,
        jwt::sign_jwt,
    },
};

/// Registers a new user and creates their profile.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(storage): State<SharedStorage>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let email = payload.email.trim().to_lowercase();
    let hashed_password = hash_password(&payload.password)?;

    let user = storage
        .create_user(NewUser {
            email: email.clone(),
            password_hash: hashed_password,
        })
        .await?;

    let full_name = payload
        .full_name
        .as_deref()
        .map(clean_text)
        .filter(|name| !name.is_empty());

    // The account exists either way; a missing profile is created on first update.
    if let Err(e) = storage
        .create_profile(NewProfile {
            id: user.id,
            email,
            full_name,
        })
        .await
    {
        tracing::warn!(user = %user.id, "Failed to create profile: {}", e);
    }

    tracing::info!(user = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns a JWT token.
pub async fn login(
    State(storage): State<SharedStorage>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let email = payload.email.trim().to_lowercase();
    let user = storage
        .find_user_by_email(&email)
        .await?
        .ok_or(AppError::AuthError("Invalid email or password".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid email or password".to_string()));
    }

    let token = sign_jwt(user.id, &user.email, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer"
    })))
}
