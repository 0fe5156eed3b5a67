//! Users, admins and profile photos
//!
//! Passwords are bcrypt-hashed before they reach the store and are never
//! part of a response. Deleting a user removes it permanently.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::{ApiJson, ApiQuery};
use crate::database::{new_id, AppState};
use crate::error::{AppError, AppResult};
use crate::model::{
    normalize_email, CreateUser, ListParams, MessageResponse, PageRequest, Role, User, UserFilter,
    UserResponse,
};

/// Hashes a clear-text password off the async runtime.
pub(crate) async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    Ok(tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??)
}

pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
    ApiQuery(filter): ApiQuery<UserFilter>,
) -> AppResult<impl IntoResponse> {
    let page = state
        .store
        .list::<User, _>(PageRequest::from(&params), |user| filter.matches(user))?;
    Ok(Json(page.map(UserResponse::from)))
}

/// Creates a user
///
/// - **201 Created** - the user, without password
/// - **400 Bad Request** - missing name, email or password
/// - **409 Conflict** - the email is already registered
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateUser>,
) -> AppResult<impl IntoResponse> {
    let user = register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

async fn register(state: &AppState, mut payload: CreateUser) -> AppResult<User> {
    if payload.password.is_empty() {
        return Err(AppError::Validation("password is required".to_string()));
    }

    let password = std::mem::take(&mut payload.password);
    let hash = hash_password(password, state.config.bcrypt_cost).await?;
    let user = payload.into_user(new_id(), hash, state.store.now());
    let user = state.store.insert(user)?;

    info!(id = %user.id, role = ?user.role, "user created");
    Ok(user)
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let user = state.store.get::<User>(&id)?;
    Ok(Json(UserResponse::from(user)))
}

/// Overwrites the fields present in the body
///
/// A new `password` is hashed; `email` is normalised and must stay unique.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(mut fields): ApiJson<Map<String, Value>>,
) -> AppResult<impl IntoResponse> {
    for (alias, name) in [("is_active", "isActive"), ("phone_number", "phoneNumber")] {
        if let Some(value) = fields.remove(alias) {
            fields.entry(name).or_insert(value);
        }
    }
    fields.remove("photo");

    if let Some(Value::String(address)) = fields.get_mut("email") {
        *address = normalize_email(address);
    }

    if let Some(password) = fields.remove("password") {
        let Value::String(password) = password else {
            return Err(AppError::Validation("password must be a string".to_string()));
        };
        if password.is_empty() {
            return Err(AppError::Validation("password is required".to_string()));
        }
        let hash = hash_password(password, state.config.bcrypt_cost).await?;
        fields.insert("password".to_string(), Value::String(hash));
    }

    let user = state.store.set_fields::<User>(&id, fields)?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.store.hard_delete::<User>(&id)?;

    info!(id = %id, "user deleted");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

fn photo_extension(content_type: Option<&str>) -> AppResult<&'static str> {
    match content_type {
        Some("image/png") => Ok("png"),
        Some("image/jpeg") => Ok("jpg"),
        Some("image/gif") => Ok("gif"),
        Some("image/webp") => Ok("webp"),
        other => Err(AppError::Validation(format!(
            "unsupported photo type: {}",
            other.unwrap_or("unknown")
        ))),
    }
}

/// Writes the photo under the uploads directory and points the user at it.
///
/// When the user cannot be updated (e.g. it was deleted meanwhile) the file
/// is removed again.
async fn save_photo(state: &AppState, id: &str, extension: &str, bytes: &[u8]) -> AppResult<User> {
    let file_name = format!("{id}-{}.{extension}", new_id());
    let path = state.config.uploads_dir.join(&file_name);
    tokio::fs::create_dir_all(&state.config.uploads_dir).await?;
    tokio::fs::write(&path, bytes).await?;

    let photo = format!("/uploads/{file_name}");
    let updated = state.store.update::<User, _>(id, |user| {
        user.photo = Some(photo);
        Ok(())
    });

    match updated {
        Ok(user) => {
            info!(id = %id, file = %file_name, size = bytes.len(), "photo uploaded");
            Ok(user)
        }
        Err(err) => {
            if let Err(cleanup) = tokio::fs::remove_file(&path).await {
                warn!(file = %path.display(), error = %cleanup, "could not remove orphaned photo");
            }
            Err(err.into())
        }
    }
}

/// Stores a profile photo
///
/// `POST /api/users/{id}/photo` as `multipart/form-data` with an image in the
/// `photo` field. The file is written under the uploads directory and served
/// back from `/uploads/...`.
pub async fn upload_photo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    // ids come from the store, so this also keeps the file name safe
    state.store.get::<User>(&id)?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("photo") {
            continue;
        }

        let extension = photo_extension(field.content_type())?;
        let bytes = field.bytes().await?;
        if bytes.is_empty() {
            return Err(AppError::Validation("photo is empty".to_string()));
        }

        let user = save_photo(&state, &id, extension, &bytes).await?;
        return Ok(Json(UserResponse::from(user)));
    }

    Err(AppError::Validation("photo field is required".to_string()))
}

/// `GET /api/admins`
pub async fn list_admins(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> AppResult<impl IntoResponse> {
    let page = state
        .store
        .list::<User, _>(PageRequest::from(&params), |user| user.role == Role::Admin)?;
    Ok(Json(page.map(UserResponse::from)))
}

/// Creates a user with the admin role, whatever role the body asks for
pub async fn create_admin(
    State(state): State<AppState>,
    ApiJson(mut payload): ApiJson<CreateUser>,
) -> AppResult<impl IntoResponse> {
    payload.role = Some(Role::Admin);
    let admin = register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(admin))))
}
