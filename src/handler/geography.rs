//! Users per country
//!
//! Every endpoint answers with the full histogram,
//! `[{"id": "USA", "value": 2}, ...]`, after applying its change.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::info;

use super::users::hash_password;
use super::ApiJson;
use crate::aggregate::country_histogram;
use crate::database::{new_id, AppState};
use crate::error::{AppError, AppResult};
use crate::model::{AddCountry, CountryCount, MoveUser, Role, User};

fn histogram(state: &AppState) -> AppResult<Json<Vec<CountryCount>>> {
    let users = state.store.all::<User, _>(|_| true)?;
    Ok(Json(country_histogram(&users)))
}

fn require_country(country: &str) -> AppResult<String> {
    let country = country.trim();
    if country.is_empty() {
        return Err(AppError::Validation("Country code is required".to_string()));
    }
    Ok(country.to_string())
}

pub async fn get_geography(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    histogram(&state)
}

/// Adds a placeholder user located in `country`
///
/// `POST /api/geography {"country": "GB"}`
pub async fn add_geography(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<AddCountry>,
) -> AppResult<impl IntoResponse> {
    let country = require_country(&payload.country)?;

    let id = new_id();
    let now = state.store.now();
    // placeholder accounts get an unguessable password nobody knows
    let password = hash_password(new_id(), state.config.bcrypt_cost).await?;
    let user = User {
        name: format!("User_{}", now.timestamp_millis()),
        email: format!("user_{id}@example.com"),
        password,
        role: Role::User,
        is_active: true,
        city: None,
        state: None,
        country: Some(country),
        occupation: None,
        phone_number: None,
        photo: None,
        created_at: now,
        updated_at: now,
        id,
    };
    let user = state.store.insert(user)?;

    info!(id = %user.id, country = ?user.country, "placeholder user added");
    Ok((StatusCode::CREATED, histogram(&state)?))
}

/// Moves a user to another country
///
/// `PUT /api/geography {"userId": "...", "country": "FR"}`
pub async fn update_geography(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<MoveUser>,
) -> AppResult<impl IntoResponse> {
    let country = require_country(&payload.country)?;

    state.store.update::<User, _>(&payload.user_id, |user| {
        user.country = Some(country);
        Ok(())
    })?;

    histogram(&state)
}

/// Removes a user
///
/// `DELETE /api/geography/{user_id}`
pub async fn delete_geography(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.store.hard_delete::<User>(&user_id)?;
    histogram(&state)
}
