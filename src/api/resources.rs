// Owned-resource handlers, written once for every `Resource` kind
//
// Read-by-id, update and delete all go through `authorize` while holding the
// store lock, so the ownership check and the write see the same row.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde_json::{json, Value};

use super::{json_body, AppState, CurrentUser};
use crate::error::ApiError;
use crate::ownership::{authorize, Action};
use crate::resources::Resource;

pub fn routes<R: Resource>() -> Router<AppState> {
    Router::new()
        .route("/", get(list::<R>).post(create::<R>))
        .route("/:id", get(read::<R>).put(update::<R>).delete(remove::<R>))
}

fn object_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    let value = json_body(body)?;
    if !value.is_object() {
        return Err(ApiError::BadRequest("Request body must be a JSON object".to_string()));
    }
    Ok(value)
}

/// POST /api/<kind>
async fn create<R: Resource>(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<R>), ApiError> {
    let draft = R::validate_create(&object_body(body)?)?;

    let record = {
        let conn = state.conn()?;
        R::insert(&conn, current.id(), draft)?
    };

    tracing::info!(resource = R::KIND.noun(), id = record.id(), owner = current.id(), "created");
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/<kind>
async fn list<R: Resource>(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<R>>, ApiError> {
    let conn = state.conn()?;
    Ok(Json(R::list_for_owner(&conn, current.id())?))
}

/// GET /api/<kind>/:id
async fn read<R: Resource>(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<R>, ApiError> {
    let conn = state.conn()?;
    let record = authorize(R::find_by_id(&conn, &id)?, current.id(), R::KIND, Action::Read)?;
    Ok(Json(record))
}

/// PUT /api/<kind>/:id
async fn update<R: Resource>(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<R>, ApiError> {
    let patch = R::validate_update(&object_body(body)?)?;

    let conn = state.conn()?;
    let record = authorize(R::find_by_id(&conn, &id)?, current.id(), R::KIND, Action::Update)?;
    let updated = record.apply(patch);
    updated.save(&conn)?;

    tracing::info!(resource = R::KIND.noun(), id = %id, "updated");
    Ok(Json(updated))
}

/// DELETE /api/<kind>/:id
async fn remove<R: Resource>(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.conn()?;
    authorize(R::find_by_id(&conn, &id)?, current.id(), R::KIND, Action::Delete)?;
    R::delete(&conn, &id)?;

    tracing::info!(resource = R::KIND.noun(), id = %id, "deleted");
    Ok(Json(json!({ "message": format!("{} deleted successfully", R::KIND.title()) })))
}
