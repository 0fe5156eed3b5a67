//! Orders; deletes are permanent

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{Map, Value};
use tracing::info;

use super::{populate, populate_page, ApiJson, ApiQuery};
use crate::database::{merge_fields, new_id, AppState};
use crate::error::AppResult;
use crate::model::{
    items_total, CreateOrder, ListParams, MessageResponse, Order, OrderFilter, PageRequest,
};

/// Lists orders with their customer, newest first
///
/// `GET /api/orders?user_id=...&status=shipped`
pub async fn list_orders(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
    ApiQuery(filter): ApiQuery<OrderFilter>,
) -> AppResult<impl IntoResponse> {
    let page = state
        .store
        .list::<Order, _>(PageRequest::from(&params), |order| filter.matches(order))?;
    let page = populate_page(&state.store, page, |order| Some(order.user_id.as_str()))?;
    Ok(Json(page))
}

pub async fn create_order(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateOrder>,
) -> AppResult<impl IntoResponse> {
    let order = payload.into_order(new_id(), state.store.now());
    let order = state.store.insert(order)?;

    info!(id = %order.id, total = order.total_amount, "order placed");
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let order = state.store.get::<Order>(&id)?;
    let user_id = order.user_id.clone();
    Ok(Json(populate(&state.store, order, Some(&user_id))?))
}

/// Overwrites the fields present in the body
///
/// Replacing `items` without a `total_amount` recomputes the total.
pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(fields): ApiJson<Map<String, Value>>,
) -> AppResult<impl IntoResponse> {
    let recompute = fields.contains_key("items") && !fields.contains_key("total_amount");

    let order = state.store.update::<Order, _>(&id, |order| {
        *order = merge_fields(order, fields)?;
        if recompute {
            order.total_amount = items_total(&order.items);
        }
        Ok(())
    })?;

    info!(id = %order.id, status = ?order.status, "order updated");
    Ok(Json(order))
}

/// Removes an order permanently
///
/// # Response
///
/// - **200 OK** - `{"message": "Order deleted successfully"}`
/// - **404 Not Found** - no such order
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.store.hard_delete::<Order>(&id)?;
    Ok(Json(MessageResponse::new("Order deleted successfully")))
}
