// Registration, login, and the current-user lookup

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Extension, Json};
use serde::Serialize;

use super::{json_body, AppState, CurrentUser};
use crate::error::ApiError;
use crate::users::{authenticate, register_user, LoginInput, RegisterError, RegisterInput, User};

/// User profile plus a freshly issued bearer token
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: User,
    pub token: String,
}

fn issue_for(state: &AppState, user: User) -> Result<AuthResponse, ApiError> {
    let token = state
        .tokens
        .issue(&user.id)
        .map_err(|e| ApiError::Internal(anyhow::Error::new(e)))?;
    Ok(AuthResponse { user, token })
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let input = json_body(body)?;

    let user = {
        let conn = state.conn()?;
        register_user(&conn, &input).map_err(|e| match e {
            RegisterError::Store(err) => ApiError::Internal(err),
            other => ApiError::BadRequest(other.to_string()),
        })?
    };

    tracing::info!(user = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(issue_for(&state, user)?)))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginInput>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let input = json_body(body)?;

    let (email, password) = match (input.email.as_deref(), input.password.as_deref()) {
        (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => (email, password),
        _ => return Err(ApiError::BadRequest("Please provide email and password".to_string())),
    };

    let user = {
        let conn = state.conn()?;
        authenticate(&conn, email, password)?
    };

    let user = user.ok_or_else(|| ApiError::Unauthenticated("Invalid email or password".to_string()))?;

    tracing::info!(user = %user.id, "user logged in");
    Ok(Json(issue_for(&state, user)?))
}

/// GET /api/auth/me
pub async fn me(Extension(current): Extension<CurrentUser>) -> Json<User> {
    Json(current.0)
}
