//! Customer enquiries; deletes only hide the enquiry

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{Map, Value};
use tracing::info;

use super::{populate, populate_page, ApiJson, ApiQuery};
use crate::database::{new_id, AppState};
use crate::error::AppResult;
use crate::model::{CreateEnquiry, Enquiry, EnquiryFilter, ListParams, MessageResponse, PageRequest};

pub async fn list_enquiries(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
    ApiQuery(filter): ApiQuery<EnquiryFilter>,
) -> AppResult<impl IntoResponse> {
    let page = state
        .store
        .list::<Enquiry, _>(PageRequest::from(&params), |enquiry| filter.matches(enquiry))?;
    let page = populate_page(&state.store, page, |enquiry| enquiry.user_id.as_deref())?;
    Ok(Json(page))
}

/// Creates an enquiry
///
/// The sender is either a known user (`user_id`) or described by free-text
/// contact details, of which `email` is mandatory.
pub async fn create_enquiry(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateEnquiry>,
) -> AppResult<impl IntoResponse> {
    let enquiry = payload.into_enquiry(new_id(), state.store.now());
    let enquiry = state.store.insert(enquiry)?;

    info!(id = %enquiry.id, "enquiry received");
    Ok((StatusCode::CREATED, Json(enquiry)))
}

pub async fn get_enquiry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let enquiry = state.store.get::<Enquiry>(&id)?;
    let user_id = enquiry.user_id.clone();
    Ok(Json(populate(&state.store, enquiry, user_id.as_deref())?))
}

/// Overwrites the fields present in the body, typically `status`
pub async fn update_enquiry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(fields): ApiJson<Map<String, Value>>,
) -> AppResult<impl IntoResponse> {
    let enquiry = state.store.set_fields::<Enquiry>(&id, fields)?;
    Ok(Json(enquiry))
}

pub async fn delete_enquiry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.store.soft_delete::<Enquiry>(&id)?;
    Ok(Json(MessageResponse::new("Enquiry deleted successfully")))
}
