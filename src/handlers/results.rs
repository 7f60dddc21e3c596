// src/handlers/results.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::{
    config::{DEFAULT_RESULTS_LIMIT, MAX_RESULTS_LIMIT},
    error::AppError,
    models::{
        dashboard::DashboardSummary,
        exam_result::{ResultOrder, ResultsQuery},
    },
    storage::SharedStorage,
    utils::jwt::CurrentUser,
};

/// The current user's results, newest first unless `order=oldest`.
///
/// `limit` defaults to 10 and is clamped to 1..=100.
pub async fn list_results(
    State(storage): State<SharedStorage>,
    user: CurrentUser,
    Query(params): Query<ResultsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_RESULTS_LIMIT)
        .clamp(1, MAX_RESULTS_LIMIT);
    let order = params.order.unwrap_or_default();

    let results = storage.list_results(user.id, limit, order).await?;
    Ok(Json(results))
}

/// Totals and averages over the most recent results.
pub async fn dashboard(
    State(storage): State<SharedStorage>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let results = storage
        .list_results(user.id, DEFAULT_RESULTS_LIMIT, ResultOrder::Newest)
        .await?;

    Ok(Json(DashboardSummary::from_results(&results)))
}
