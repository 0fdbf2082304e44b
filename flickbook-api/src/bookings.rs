use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use flickbook_booking::{require_admin, require_identity, BookingAction, BookingValidator, ChangeHandler};
use flickbook_catalog::WindowError;
use flickbook_shared::BookingView;
use serde_json::{json, Value};

use crate::middleware::Session;
use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/bookings", get(list_bookings).post(create_booking))
        .route("/api/bookings/mine", get(my_bookings))
        .route(
            "/api/bookings/{id}",
            get(get_booking)
                .patch(update_own_booking)
                .put(edit_booking)
                .delete(cancel_booking),
        )
}

fn views<'a>(bookings: impl IntoIterator<Item = &'a flickbook_shared::Booking>) -> Vec<BookingView> {
    bookings.into_iter().map(BookingView::from).collect()
}

/// Map a show-window failure; store errors surface as `store_message`.
pub(crate) fn window_error(err: WindowError, store_message: &'static str) -> AppError {
    match err {
        WindowError::Violation(v) => AppError::ValidationError(v.to_string()),
        WindowError::Store(e) => AppError::store(store_message, e),
    }
}

/// POST /api/bookings
async fn create_booking(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let candidate = BookingValidator::validate(&payload, session.username()).map_err(|errors| {
        AppError::InvalidPayload {
            message: "Invalid booking payload".to_string(),
            errors: json!(errors.messages()),
        }
    })?;

    state
        .window
        .enforce(&candidate.movie_title, &candidate.show_date)
        .await
        .map_err(|e| window_error(e, "Failed to save booking"))?;

    let booking = state
        .bookings
        .create_booking(&candidate)
        .await
        .map_err(|e| AppError::store("Failed to save booking", e))?;

    tracing::info!("Booking {} stored for {}", booking.id, booking.booked_by);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Booking stored successfully",
            "booking": BookingView::from(&booking),
        })),
    ))
}

/// GET /api/bookings (admin)
async fn list_bookings(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(session.identity())?;

    let bookings = state
        .bookings
        .list_bookings()
        .await
        .map_err(|e| AppError::store("Failed to load bookings", e))?;

    Ok(Json(json!({ "bookings": views(&bookings) })))
}

/// GET /api/bookings/mine
async fn my_bookings(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, AppError> {
    let identity = require_identity(session.identity())?;

    let bookings = state
        .bookings
        .list_bookings_for(&identity.username)
        .await
        .map_err(|e| AppError::store("Failed to load bookings", e))?;

    Ok(Json(json!({ "user": identity.username, "bookings": views(&bookings) })))
}

/// GET /api/bookings/{id}
async fn get_booking(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.policy.load(session.identity(), id, BookingAction::View).await?;
    Ok(Json(json!({ "booking": BookingView::from(&booking) })))
}

/// Body parsed only after the access check, so a stranger gets 403 even for
/// a malformed body. An empty body counts as `{}`.
fn update_payload(body: &Bytes) -> Result<Value, AppError> {
    if body.is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_slice(body).map_err(|_| AppError::ValidationError("Invalid JSON body".to_string()))
}

async fn apply_update(
    state: &AppState,
    session: &Session,
    id: i64,
    action: BookingAction,
    body: &Bytes,
) -> Result<Json<Value>, AppError> {
    let current = state.policy.load(session.identity(), id, action).await?;
    let payload = update_payload(body)?;
    let changes = ChangeHandler::parse(&payload).map_err(|e| AppError::ValidationError(e.to_string()))?;

    let booking = state
        .bookings
        .update_booking(current.id, &changes)
        .await
        .map_err(|e| AppError::store("Failed to update booking", e))?
        .ok_or_else(|| AppError::NotFoundError("Booking not found".to_string()))?;

    tracing::info!(
        "Booking {} updated by {}",
        booking.id,
        session.username().unwrap_or_default()
    );
    Ok(Json(json!({
        "message": "Booking updated successfully",
        "booking": BookingView::from(&booking),
    })))
}

/// PATCH /api/bookings/{id}: owner only
async fn update_own_booking(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    apply_update(&state, &session, id, BookingAction::Update, &body).await
}

/// PUT /api/bookings/{id}: owner or any admin. Owner fields in the payload
/// are dropped by the change parser.
async fn edit_booking(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    apply_update(&state, &session, id, BookingAction::Edit, &body).await
}

/// DELETE /api/bookings/{id}
async fn cancel_booking(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.policy.load(session.identity(), id, BookingAction::Cancel).await?;

    state
        .bookings
        .delete_booking(booking.id)
        .await
        .map_err(|e| AppError::store("Failed to delete booking", e))?;

    tracing::info!("Booking {} cancelled", booking.id);
    Ok(Json(json!({
        "message": "Booking cancelled successfully",
        "booking_id": id,
    })))
}
