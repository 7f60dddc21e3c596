// src/handlers/exams.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    config::Config,
    error::AppError,
    exam::{
        catalog,
        registry::SessionRegistry,
        runner::spawn_session,
        session::{SessionContext, SessionSpec},
    },
    models::{
        profile::{Eligibility, can_take_test},
        question::ExamCategory,
    },
    state::SharedQuestions,
    storage::SharedStorage,
    utils::jwt::CurrentUser,
};

/// Lists the exam types with their duration and size.
pub async fn list_exams() -> impl IntoResponse {
    Json(catalog::catalog())
}

/// Whether the current user may start another exam.
pub async fn eligibility(
    State(storage): State<SharedStorage>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let profile = storage.read_profile(user.id).await?;
    Ok(Json(Eligibility::for_profile(profile.as_ref())))
}

/// Starts a timed session for `category`.
///
/// * Rejects users whose free tests are used up (403).
/// * Loads the question set and starts the countdown.
/// * Returns 201 with the first question.
pub async fn start_session(
    State(storage): State<SharedStorage>,
    State(questions): State<SharedQuestions>,
    State(sessions): State<SessionRegistry>,
    State(config): State<Config>,
    user: CurrentUser,
    Path(category): Path<ExamCategory>,
) -> Result<impl IntoResponse, AppError> {
    let profile = storage.read_profile(user.id).await?;
    if !can_take_test(profile.as_ref()) {
        return Err(AppError::Forbidden(
            "Free trial ended. Upgrade to access more mock exams.".to_string(),
        ));
    }

    let entry = catalog::entry(category);
    if !entry.available {
        return Err(AppError::BadRequest(format!(
            "The {} exam is not available yet",
            category
        )));
    }

    let spec = SessionSpec {
        category,
        questions: questions.questions(category)?,
        duration: entry.duration(),
    };
    let context = SessionContext { user };

    let handle = spawn_session(spec, context, storage, config.session_retention())?;
    let view = handle.snapshot().await?;
    sessions.insert(handle).await;

    Ok((StatusCode::CREATED, Json(view)))
}
