use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Extension, Json, Router,
};
use flickbook_booking::{reconcile::Reconciled, require_identity, BookingValidator};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::bookings::window_error;
use crate::middleware::Session;
use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    pub session_id: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/bookings/checkout", post(start_checkout))
        .route("/checkout/success", get(checkout_success))
        .route("/checkout/cancel", get(checkout_cancel))
}

/// POST /api/bookings/checkout
async fn start_checkout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    require_identity(session.identity())?;

    // The buyer must be named in the payload; the session is not a fallback here.
    let candidate = BookingValidator::validate(&payload, None).map_err(|errors| AppError::InvalidPayload {
        message: "Invalid booking payload".to_string(),
        errors: json!(errors.messages()),
    })?;

    state
        .window
        .enforce(&candidate.movie_title, &candidate.show_date)
        .await
        .map_err(|e| window_error(e, "Unable to start checkout"))?;

    let request = state.terms.request_for(&candidate);
    let checkout = state
        .checkout
        .create_session(&request)
        .await
        .map_err(|e| AppError::store("Unable to start checkout", e))?;

    let checkout_url = checkout
        .url
        .ok_or_else(|| AppError::store("Unable to start checkout", "provider returned no checkout url"))?;

    tracing::info!(
        "Checkout {} started for {} ({} x {})",
        checkout.id,
        candidate.booked_by,
        candidate.quantity,
        candidate.movie_title
    );
    Ok(Json(json!({ "checkout_url": checkout_url })))
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body><h1>{title}</h1><p>{body}</p><p><a href=\"/home\">Back to movies</a></p></body></html>",
        title = escape_html(title),
        body = escape_html(body),
    ))
}

/// GET /checkout/success?session_id=
///
/// Re-fetches the session from the provider rather than trusting the query.
async fn checkout_success(
    State(state): State<AppState>,
    Query(query): Query<SuccessQuery>,
) -> impl IntoResponse {
    let Some(session_id) = query.session_id.filter(|id| !id.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            page("Checkout", "Missing checkout session reference."),
        );
    };

    let checkout = match state.checkout.retrieve_session(&session_id).await {
        Ok(checkout) => checkout,
        Err(e) => {
            tracing::warn!("Could not verify checkout {}: {}", session_id, e);
            return (
                StatusCode::OK,
                page("Checkout", "We could not verify your payment with the provider. Please try again later."),
            );
        }
    };

    if !checkout.is_completed() {
        return (
            StatusCode::OK,
            page("Checkout", "Your payment has not been completed yet."),
        );
    }

    match state.reconciler.persist(&checkout.metadata).await {
        Ok(Reconciled::Inserted(booking)) | Ok(Reconciled::AlreadyPersisted(booking)) => (
            StatusCode::OK,
            page(
                "Booking confirmed",
                &format!(
                    "{} ticket(s) for {} on {} at {}. Booking #{}.",
                    booking.quantity, booking.movie_title, booking.show_date, booking.showtime, booking.id
                ),
            ),
        ),
        Ok(Reconciled::MissingMetadata) => (
            StatusCode::OK,
            page("Checkout", "Payment received, but we could not confirm your booking yet."),
        ),
        Err(e) => {
            tracing::error!("Failed to persist checkout {}: {}", session_id, e);
            (
                StatusCode::OK,
                page("Checkout", "Payment received, but we could not confirm your booking yet."),
            )
        }
    }
}

/// GET /checkout/cancel
async fn checkout_cancel() -> Html<String> {
    page("Checkout cancelled", "Your checkout was cancelled. No payment was taken.")
}
