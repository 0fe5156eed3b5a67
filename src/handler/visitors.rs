//! Site visitors, one document per IP address

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::debug;

use super::{ApiJson, ApiQuery};
use crate::aggregate::visitor_stats;
use crate::database::{new_id, AppState};
use crate::error::AppResult;
use crate::model::{ListParams, MessageResponse, PageRequest, RecordVisit, Visitor};

pub async fn list_visitors(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> AppResult<impl IntoResponse> {
    let page = state
        .store
        .list::<Visitor, _>(PageRequest::from(&params), |_| true)?;
    Ok(Json(page))
}

/// Looks a visitor up by address
///
/// # Arguments
///
/// * `ip` - The visitor's address; surrounding whitespace is ignored
///
/// # Example
///
/// ```text
/// GET /api/visitors/ip/198.51.100.4
/// ```
pub async fn get_visitor_by_ip(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(state.store.find_by_key::<Visitor>(ip.trim())?))
}

/// Fetches a visitor by `_id`; soft-deleted visitors are a 404
pub async fn get_visitor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(state.store.get::<Visitor>(&id)?))
}

/// Records a visit
///
/// The first visit from an address creates the visitor with a count of 1
/// (**201 Created**); later visits increment the count and refresh
/// `last_visited_at` (**200 OK**).
pub async fn record_visit(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RecordVisit>,
) -> AppResult<impl IntoResponse> {
    let now = state.store.now();
    let ip_address = payload.ip_address.trim().to_string();
    let location = payload.location.clone();

    let visitor = state.store.upsert::<Visitor, _, _>(
        &ip_address,
        || {
            RecordVisit {
                ip_address: ip_address.clone(),
                ..payload
            }
            .into_visitor(new_id(), now)
        },
        |visitor| visitor.record_visit(now, location),
    )?;

    debug!(ip = %visitor.ip_address, visits = visitor.visit_count, "visit recorded");
    let status = if visitor.created_at == visitor.updated_at {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(visitor)))
}

pub async fn delete_visitor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.store.soft_delete::<Visitor>(&id)?;
    Ok(Json(MessageResponse::new("Visitor deleted successfully")))
}

/// Unique visitors, total visits and a per-country breakdown
pub async fn visitor_statistics(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let visitors = state.store.all::<Visitor, _>(|_| true)?;
    Ok(Json(visitor_stats(&visitors)))
}
