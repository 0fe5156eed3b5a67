//! User notifications

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::info;

use super::{populate, populate_page, ApiJson, ApiQuery};
use crate::database::{new_id, AppState};
use crate::error::{AppError, AppResult};
use crate::model::{
    BulkNotifications, CreateNotification, ListParams, MessageResponse, Notification,
    NotificationFilter, PageRequest,
};

/// Lists notifications, newest first
///
/// `GET /api/notifications?user_id=...&is_read=false`
pub async fn list_notifications(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
    ApiQuery(filter): ApiQuery<NotificationFilter>,
) -> AppResult<impl IntoResponse> {
    let page = state.store.list::<Notification, _>(PageRequest::from(&params), |n| {
        filter.matches(n)
    })?;
    let page = populate_page(&state.store, page, |n| Some(n.user_id.as_str()))?;
    Ok(Json(page))
}

pub async fn create_notification(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateNotification>,
) -> AppResult<impl IntoResponse> {
    let notification = payload.into_notification(new_id(), state.store.now());
    let notification = state.store.insert(notification)?;
    Ok((StatusCode::CREATED, Json(notification)))
}

/// Creates several notifications at once
///
/// All or nothing: when any item is invalid the response is a 400 naming
/// that item and nothing is stored.
///
/// # Request Body
///
/// ```json
/// { "notifications": [{ "user_id": "...", "message": "Order shipped", "type": "order" }] }
/// ```
///
/// # Response
///
/// **201 Created** with the stored notifications in request order.
pub async fn create_notifications_bulk(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<BulkNotifications>,
) -> AppResult<impl IntoResponse> {
    if payload.notifications.is_empty() {
        return Err(AppError::Validation(
            "notifications must not be empty".to_string(),
        ));
    }

    let notifications: Vec<Notification> = payload
        .notifications
        .into_iter()
        .map(|item| item.into_notification(new_id(), state.store.now()))
        .collect();
    let notifications = state.store.insert_all(notifications)?;

    info!(count = notifications.len(), "notifications created");
    Ok((StatusCode::CREATED, Json(notifications)))
}

pub async fn get_notification(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let notification = state.store.get::<Notification>(&id)?;
    let user_id = notification.user_id.clone();
    Ok(Json(populate(&state.store, notification, Some(&user_id))?))
}

/// Marks a notification as read
///
/// `PATCH /api/notifications/{id}`
pub async fn mark_as_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let notification = state.store.update::<Notification, _>(&id, |n| {
        n.is_read = true;
        Ok(())
    })?;
    Ok(Json(notification))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.store.soft_delete::<Notification>(&id)?;
    Ok(Json(MessageResponse::new("Notification deleted successfully")))
}
