//! Product catalogue CRUD; deletes are permanent

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{Map, Value};
use tracing::info;

use super::{ApiJson, ApiQuery};
use crate::database::{new_id, AppState};
use crate::error::AppResult;
use crate::model::{CreateProduct, ListParams, MessageResponse, PageRequest, Product, ProductFilter};

/// Lists products, newest first
///
/// `GET /api/products?page=1&limit=10&category=Lamps&search=desk`
pub async fn list_products(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
    ApiQuery(filter): ApiQuery<ProductFilter>,
) -> AppResult<impl IntoResponse> {
    let page = state
        .store
        .list::<Product, _>(PageRequest::from(&params), |product| filter.matches(product))?;
    Ok(Json(page))
}

/// Creates a product
///
/// # Request Body
///
/// ```json
/// { "name": "Desk Lamp", "price": 129.99, "category": "Lighting", "stock_quantity": 12 }
/// ```
///
/// # Response
///
/// - **201 Created** - the stored product with its generated `_id`
/// - **400 Bad Request** - missing name, negative price, rating outside 0..=5
pub async fn create_product(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateProduct>,
) -> AppResult<impl IntoResponse> {
    let product = payload.into_product(new_id(), state.store.now());
    let product = state.store.insert(product)?;

    info!(id = %product.id, name = %product.name, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Fetches one product
///
/// # Response
///
/// - **200 OK** - the product
/// - **404 Not Found** - `{"message": "Product not found"}`
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(state.store.get::<Product>(&id)?))
}

/// Overwrites the fields present in the body
///
/// `PUT|PATCH /api/products/{id}` with e.g. `{"price": 149.99}`
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(mut fields): ApiJson<Map<String, Value>>,
) -> AppResult<impl IntoResponse> {
    if let Some(stock) = fields.remove("stock_quantity") {
        fields.entry("supply").or_insert(stock);
    }
    let product = state.store.set_fields::<Product>(&id, fields)?;
    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.store.hard_delete::<Product>(&id)?;

    info!(id = %id, "product deleted");
    Ok(Json(MessageResponse::new("Product deleted successfully")))
}
