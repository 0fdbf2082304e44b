use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::middleware::Session;
use crate::{error::AppError, state::AppState};

#[derive(Debug, Serialize)]
struct UserSummary {
    id: i64,
    username: String,
    role: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/{id}", delete(delete_user))
}

/// Anonymous callers get the same 403 as non-admins here.
fn admin_only(session: &Session) -> Result<(), AppError> {
    match session.identity() {
        Some(identity) if identity.is_admin() => Ok(()),
        _ => Err(AppError::AuthorizationError("Admin access required".to_string())),
    }
}

async fn list_users(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Value>, AppError> {
    admin_only(&session)?;

    let users: Vec<UserSummary> = state
        .users
        .list_users()
        .await
        .map_err(|e| AppError::store("Failed to load users", e))?
        .into_iter()
        .map(|u| UserSummary {
            id: u.id,
            username: u.username,
            role: u.role.as_str().to_string(),
        })
        .collect();

    Ok(Json(json!({ "users": users })))
}

async fn delete_user(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    admin_only(&session)?;

    let deleted_bookings = state
        .users
        .delete_user_cascade(id)
        .await
        .map_err(|e| AppError::store("Failed to delete user", e))?
        .ok_or_else(|| AppError::NotFoundError("User not found".to_string()))?;

    tracing::info!("User {} deleted with {} booking(s)", id, deleted_bookings);
    Ok(Json(json!({
        "message": "User deleted successfully",
        "user_id": id,
        "deleted_bookings": deleted_bookings,
    })))
}
