use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::database::AppState;
use crate::error::{AppError, ErrorDetail, INTERNAL_MESSAGE};

/// Middleware to check for the admin token
///
/// When `ADMIN_TOKEN` is configured, the request must carry it in the
/// `Authorization` header, either bare or as `Bearer <token>`. Without a
/// configured token the check is skipped.
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(token) = &state.config.admin_token {
        let provided = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.strip_prefix("Bearer ").unwrap_or(value));

        if provided != Some(token.as_str()) {
            return Err(AppError::Unauthorized);
        }
    }

    Ok(next.run(request).await)
}

/// Reveals the raw text of internal errors outside production
///
/// Handlers never put internal details in the body themselves; they attach an
/// [`ErrorDetail`] that this layer either drops or renders as `"error"`.
pub async fn error_detail(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let Some(ErrorDetail(detail)) = response.extensions_mut().remove::<ErrorDetail>() else {
        return response;
    };
    if !state.config.expose_errors {
        return response;
    }

    (
        response.status(),
        Json(json!({ "message": INTERNAL_MESSAGE, "error": detail })),
    )
        .into_response()
}
