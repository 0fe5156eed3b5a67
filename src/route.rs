//! Route definitions for the dashboard API
//!
//! Every resource is mounted flat under `/api/<resource>`, with `/{id}` for
//! single documents and a few fixed sub-paths (`/statistics`, `/ip/{ip}`, ...).

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Method,
};
use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::database::AppState;
use crate::handler::{
    active_users, enquiries, geography, index, notifications, orders, products, transactions,
    user_statistics, users, visitors,
};
use crate::middleware::{auth_middleware, error_detail};

/// Largest accepted request body, photo uploads included
pub const BODY_LIMIT: usize = 30 * 1024 * 1024;

/// Creates and configures the application router with all routes
///
/// # Route Definitions
///
/// - `GET /` - welcome message listing the resources
/// - `/api/products`, `/api/orders`, `/api/transactions`, `/api/enquiries`, `/api/users` - CRUD
/// - `/api/admins` - admin accounts
/// - `/api/notifications` - CRUD, bulk creation, mark as read
/// - `/api/active-users` - sessions and their statistics
/// - `/api/visitors` - visit upsert by IP and statistics
/// - `/api/user-statistics` - page-view upsert by user and overall statistics
/// - `/api/geography` - users per country
/// - `GET /uploads/*` - uploaded photos
pub fn create_app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .patch(products::update_product)
                .delete(products::delete_product),
        )
        .route(
            "/orders",
            get(orders::list_orders).post(orders::create_order),
        )
        .route(
            "/orders/{id}",
            get(orders::get_order)
                .put(orders::update_order)
                .patch(orders::update_order)
                .delete(orders::delete_order),
        )
        .route(
            "/transactions",
            get(transactions::list_transactions).post(transactions::create_transaction),
        )
        .route(
            "/transactions/{id}",
            get(transactions::get_transaction)
                .put(transactions::update_transaction)
                .patch(transactions::update_transaction)
                .delete(transactions::delete_transaction),
        )
        .route(
            "/enquiries",
            get(enquiries::list_enquiries).post(enquiries::create_enquiry),
        )
        .route(
            "/enquiries/{id}",
            get(enquiries::get_enquiry)
                .put(enquiries::update_enquiry)
                .patch(enquiries::update_enquiry)
                .delete(enquiries::delete_enquiry),
        )
        .route(
            "/notifications",
            get(notifications::list_notifications).post(notifications::create_notification),
        )
        .route(
            "/notifications/bulk",
            post(notifications::create_notifications_bulk),
        )
        .route(
            "/notifications/{id}",
            get(notifications::get_notification)
                .patch(notifications::mark_as_read)
                .delete(notifications::delete_notification),
        )
        .route(
            "/active-users",
            get(active_users::list_active_users).post(active_users::create_session),
        )
        .route(
            "/active-users/statistics",
            get(active_users::active_user_statistics),
        )
        .route(
            "/active-users/{id}",
            get(active_users::get_session)
                .patch(active_users::update_session)
                .delete(active_users::end_session),
        )
        .route(
            "/visitors",
            get(visitors::list_visitors).post(visitors::record_visit),
        )
        .route("/visitors/statistics", get(visitors::visitor_statistics))
        .route("/visitors/ip/{ip}", get(visitors::get_visitor_by_ip))
        .route(
            "/visitors/{id}",
            get(visitors::get_visitor).delete(visitors::delete_visitor),
        )
        .route(
            "/user-statistics",
            get(user_statistics::list_statistics).post(user_statistics::record_page_view),
        )
        .route("/user-statistics/overall", get(user_statistics::overall))
        .route(
            "/user-statistics/user/{user_id}",
            get(user_statistics::get_statistics_for_user),
        )
        .route(
            "/user-statistics/{id}",
            get(user_statistics::get_statistics).delete(user_statistics::delete_statistics),
        )
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/{id}/photo", post(users::upload_photo))
        .route("/admins", get(users::list_admins).post(users::create_admin))
        .route(
            "/geography",
            get(geography::get_geography)
                .post(geography::add_geography)
                .put(geography::update_geography),
        )
        .route("/geography/{user_id}", delete(geography::delete_geography))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, ACCEPT])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/", get(index))
        .nest("/api", api_routes)
        .nest_service("/uploads", ServeDir::new(&state.config.uploads_dir))
        .layer(middleware::from_fn_with_state(state.clone(), error_detail))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors)
        .with_state(state)
}
