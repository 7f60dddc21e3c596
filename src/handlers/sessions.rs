// src/handlers/sessions.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    exam::{
        registry::SessionRegistry,
        runner::{SessionAction, SessionHandle},
    },
    models::session::{MoveCursorRequest, RecordAnswerRequest, SessionView},
    utils::jwt::CurrentUser,
};

async fn find_session(
    sessions: &SessionRegistry,
    id: Uuid,
    user: &CurrentUser,
) -> Result<SessionHandle, AppError> {
    sessions
        .get(id, user.id)
        .await
        .ok_or(AppError::NotFound("Exam session not found".to_string()))
}

async fn apply(
    sessions: &SessionRegistry,
    id: Uuid,
    user: &CurrentUser,
    action: SessionAction,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(sessions, id, user).await?;
    let view = handle.apply(action).await?;
    Ok(Json(view))
}

/// Current state of the session: question, answer, time left.
pub async fn get_session(
    State(sessions): State<SessionRegistry>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    apply(&sessions, id, &user, SessionAction::Snapshot).await
}

pub async fn record_answer(
    State(sessions): State<SessionRegistry>,
    user: CurrentUser,
    Path((id, question_id)): Path<(Uuid, String)>,
    Json(payload): Json<RecordAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let action = SessionAction::Answer {
        question_id,
        answer: payload.answer,
    };
    apply(&sessions, id, &user, action).await
}

pub async fn next_question(
    State(sessions): State<SessionRegistry>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    apply(&sessions, id, &user, SessionAction::Next).await
}

pub async fn previous_question(
    State(sessions): State<SessionRegistry>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    apply(&sessions, id, &user, SessionAction::Previous).await
}

/// Jumps to a question by index (the question palette).
pub async fn move_cursor(
    State(sessions): State<SessionRegistry>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<MoveCursorRequest>,
) -> Result<impl IntoResponse, AppError> {
    apply(&sessions, id, &user, SessionAction::GoTo(payload.index)).await
}

/// Scores the session and stores the result. Only allowed on the final question.
///
/// Idempotent: submitting again returns the same result.
pub async fn submit_session(
    State(sessions): State<SessionRegistry>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = find_session(&sessions, id, &user).await?;
    let view = handle.submit().await?;

    tracing::info!(
        session = %id,
        user = %user.id,
        persisted = view.result.as_ref().is_some_and(|r| r.persisted),
        "Exam submitted"
    );
    Ok(Json(view))
}

/// Leaves the exam. Nothing is scored or stored.
pub async fn abandon_session(
    State(sessions): State<SessionRegistry>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = sessions
        .remove(id, user.id)
        .await
        .ok_or(AppError::NotFound("Exam session not found".to_string()))?;
    handle.abandon();

    Ok(StatusCode::NO_CONTENT)
}
