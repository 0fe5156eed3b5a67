//! Per-user browsing statistics

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::{populate, populate_page, ApiJson, ApiQuery};
use crate::aggregate::overall_statistics;
use crate::database::{new_id, AppState};
use crate::error::{AppError, AppResult};
use crate::model::{ListParams, MessageResponse, PageRequest, RecordPageView, UserStatistics};

pub async fn list_statistics(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> AppResult<impl IntoResponse> {
    let page = state
        .store
        .list::<UserStatistics, _>(PageRequest::from(&params), |_| true)?;
    let page = populate_page(&state.store, page, |s| Some(s.user_id.as_str()))?;
    Ok(Json(page))
}

/// Records one page view for a user
///
/// ```json
/// { "user_id": "...", "page_name": "dashboard", "time_spent": 42 }
/// ```
///
/// Creates the user's statistics on first use (**201 Created**), otherwise
/// increments the page's visit count and adds `time_spent` (**200 OK**).
pub async fn record_page_view(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RecordPageView>,
) -> AppResult<impl IntoResponse> {
    if payload.page_name.trim().is_empty() {
        return Err(AppError::Validation("page_name is required".to_string()));
    }
    if payload.time_spent.is_some_and(|t| !t.is_finite() || t < 0.0) {
        return Err(AppError::Validation(
            "time_spent must be a non-negative number".to_string(),
        ));
    }

    let now = state.store.now();
    let user_id = payload.user_id.clone();
    let page_name = payload.page_name.clone();
    let time_spent = payload.time_spent;

    let statistics = state.store.upsert::<UserStatistics, _, _>(
        &user_id,
        || payload.into_statistics(new_id(), now),
        |statistics| statistics.record_page_view(&page_name, time_spent),
    )?;

    let status = if statistics.created_at == statistics.updated_at {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(statistics)))
}

/// `GET /api/user-statistics/user/{user_id}`
pub async fn get_statistics_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let statistics = state.store.find_by_key::<UserStatistics>(&user_id)?;
    Ok(Json(populate(&state.store, statistics, Some(&user_id))?))
}

pub async fn get_statistics(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let statistics = state.store.get::<UserStatistics>(&id)?;
    let user_id = statistics.user_id.clone();
    Ok(Json(populate(&state.store, statistics, Some(&user_id))?))
}

pub async fn delete_statistics(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.store.soft_delete::<UserStatistics>(&id)?;
    Ok(Json(MessageResponse::new("Statistics deleted successfully")))
}

/// Tracked users, their five most visited pages and average time spent
pub async fn overall(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let statistics = state.store.all::<UserStatistics, _>(|_| true)?;
    Ok(Json(overall_statistics(&statistics)))
}
