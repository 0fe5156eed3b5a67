//! Dashboard sessions ("active users")
//!
//! Ending a session flags it as deleted; ended sessions no longer count
//! towards the statistics.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::info;

use super::{populate, populate_page, ApiJson, ApiQuery};
use crate::aggregate::active_user_stats;
use crate::database::{new_id, AppState};
use crate::error::AppResult;
use crate::model::{ActiveUser, CreateSession, ListParams, MessageResponse, PageRequest, UpdateSession};

pub async fn list_active_users(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> AppResult<impl IntoResponse> {
    let page = state
        .store
        .list::<ActiveUser, _>(PageRequest::from(&params), |_| true)?;
    let page = populate_page(&state.store, page, |s| Some(s.user_id.as_str()))?;
    Ok(Json(page))
}

pub async fn create_session(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateSession>,
) -> AppResult<impl IntoResponse> {
    let session = payload.into_session(new_id(), state.store.now());
    let session = state.store.insert(session)?;

    info!(id = %session.id, user = %session.user_id, "session started");
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let session = state.store.get::<ActiveUser>(&id)?;
    let user_id = session.user_id.clone();
    Ok(Json(populate(&state.store, session, Some(&user_id))?))
}

/// Updates the duration and/or location of an open session
pub async fn update_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateSession>,
) -> AppResult<impl IntoResponse> {
    let session = state.store.update::<ActiveUser, _>(&id, |session| {
        payload.apply(session);
        Ok(())
    })?;
    Ok(Json(session))
}

pub async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.store.soft_delete::<ActiveUser>(&id)?;

    info!(id = %id, "session ended");
    Ok(Json(MessageResponse::new("Session ended successfully")))
}

/// Count and average duration of open sessions
///
/// ```json
/// { "totalActive": 3, "averageSessionDuration": 420.5 }
/// ```
pub async fn active_user_statistics(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let sessions = state.store.all::<ActiveUser, _>(|_| true)?;
    Ok(Json(active_user_stats(&sessions)))
}
