// Finance Tracker - REST API
// Router, shared state, and the small helpers every handler uses

pub mod auth;
pub mod guard;
pub mod resources;

use axum::{
    extract::rejection::JsonRejection,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use rusqlite::Connection;
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::resources::{Asset, Expense, Liability};
use crate::token::TokenIssuer;

pub use guard::CurrentUser;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub tokens: Arc<TokenIssuer>,
}

impl AppState {
    pub fn new(conn: Connection, tokens: TokenIssuer) -> Self {
        AppState {
            db: Arc::new(Mutex::new(conn)),
            tokens: Arc::new(tokens),
        }
    }

    /// Lock the store for one request's read (and conditional write)
    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal(anyhow::anyhow!("database lock poisoned")))
    }
}

/// Unwrap a JSON body, rendering axum's rejection as `{ message }` with the
/// rejection's own status (400, 415, 413, 422)
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::Rejected(rejection.status(), rejection.body_text()))
}

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "OK", "version": crate::VERSION }))
}

// ============================================================================
// Router
// ============================================================================

pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        .nest("/expenses", resources::routes::<Expense>())
        .nest("/assets", resources::routes::<Asset>())
        .nest("/liabilities", resources::routes::<Liability>())
        .route_layer(middleware::from_fn_with_state(state.clone(), guard::require_auth));

    Router::new()
        .nest("/api", public.merge(protected))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
