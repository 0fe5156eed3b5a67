//! Payment transactions; deletes are permanent

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
use crate::model::{
    CreateTransaction, ListParams, MessageResponse, PageRequest, Transaction, TransactionFilter,
};

/// Lists transactions with their user, newest first
///
/// # Query Parameters
///
/// - `page` - Page number (default: 1)
/// - `limit` - Items per page (default: 10, max: 100)
/// - `search` - Case-insensitive match on `cost` or `userId`
///
/// # Example
///
/// ```text
/// GET /api/transactions?search=129&page=1&limit=20
/// ```
///
/// # Response
///
/// ```json
/// {
///   "items": [{ "_id": "...", "userId": "...", "cost": "129.99", "products": [], "user": {...} }],
///   "totalPages": 1,
///   "currentPage": 1
/// }
/// ```
pub async fn list_transactions(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
    ApiQuery(filter): ApiQuery<TransactionFilter>,
) -> AppResult<impl IntoResponse> {
    let page = state.store.list::<Transaction, _>(PageRequest::from(&params), |transaction| {
        filter.matches(transaction)
    })?;
    let page = populate_page(&state.store, page, |t| Some(t.user_id.as_str()))?;
    Ok(Json(page))
}

/// Records a transaction
///
/// # Request Body
///
/// ```json
/// { "userId": "...", "cost": "129.99", "products": ["..."] }
/// ```
///
/// # Response
///
/// - **201 Created** - the stored transaction
/// - **400 Bad Request** - missing `userId`, or a `cost` that is not a non-negative number
pub async fn create_transaction(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateTransaction>,
) -> AppResult<impl IntoResponse> {
    let transaction = payload.into_transaction(new_id(), state.store.now());
    let transaction = state.store.insert(transaction)?;

    info!(id = %transaction.id, user = %transaction.user_id, cost = %transaction.cost, "transaction recorded");
    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let transaction = state.store.get::<Transaction>(&id)?;
    let user_id = transaction.user_id.clone();
    Ok(Json(populate(&state.store, transaction, Some(&user_id))?))
}

/// Overwrites the fields present in the body
///
/// `user_id` is accepted as a spelling of `userId`.
pub async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(mut fields): ApiJson<Map<String, Value>>,
) -> AppResult<impl IntoResponse> {
    if let Some(user_id) = fields.remove("user_id") {
        fields.entry("userId").or_insert(user_id);
    }
    let transaction = state.store.set_fields::<Transaction>(&id, fields)?;
    Ok(Json(transaction))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.store.hard_delete::<Transaction>(&id)?;

    info!(id = %id, "transaction deleted");
    Ok(Json(MessageResponse::new("Transaction deleted successfully")))
}
