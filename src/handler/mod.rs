//! HTTP request handlers for the dashboard API
//!
//! One submodule per resource. Every handler returns [`AppResult`], so
//! failures reach the client as `{"message": ...}` with a 4xx or 5xx status.

use axum::{
    extract::{FromRequest, FromRequestParts},
    Json,
};
use serde_json::{json, Value};

use crate::database::Store;
use crate::error::{AppError, AppResult};
use crate::model::{Paged, User, UserRef, WithUser};

pub mod active_users;
pub mod enquiries;
pub mod geography;
pub mod notifications;
pub mod products;
pub mod orders;
pub mod transactions;
pub mod user_statistics;
pub mod users;
pub mod visitors;

/// JSON body extractor whose rejections are reported as [`AppError`]
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections are reported as [`AppError`]
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Welcome message listing the resources
///
/// `GET /`
pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the dashboard API",
        "endpoints": {
            "users": "/api/users",
            "admins": "/api/admins",
            "products": "/api/products",
            "orders": "/api/orders",
            "transactions": "/api/transactions",
            "enquiries": "/api/enquiries",
            "notifications": "/api/notifications",
            "activeUsers": "/api/active-users",
            "visitors": "/api/visitors",
            "userStatistics": "/api/user-statistics",
            "geography": "/api/geography"
        }
    }))
}

/// Resolves the user referenced by each item of a page.
pub(crate) fn populate_page<T, F>(
    store: &Store,
    page: Paged<T>,
    user_id: F,
) -> AppResult<Paged<WithUser<T>>>
where
    F: Fn(&T) -> Option<&str>,
{
    let ids: Vec<&str> = page.items.iter().filter_map(|doc| user_id(doc)).collect();
    let users = store.get_many::<User>(&ids)?;

    Ok(page.map(|doc| {
        let user = user_id(&doc)
            .and_then(|id| users.get(id))
            .map(UserRef::from);
        WithUser { doc, user }
    }))
}

/// Resolves the user referenced by a single document.
pub(crate) fn populate<T>(store: &Store, doc: T, user_id: Option<&str>) -> AppResult<WithUser<T>> {
    let user = match user_id {
        Some(id) => store.get_many::<User>(&[id])?.get(id).map(UserRef::from),
        None => None,
    };
    Ok(WithUser { doc, user })
}
