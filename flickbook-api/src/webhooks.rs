use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use flickbook_booking::Reconciled;
use flickbook_core::payment::{PaymentError, WebhookEvent};
use serde_json::{json, Value};

use crate::{error::AppError, state::AppState};

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

pub fn routes() -> Router<AppState> {
    Router::new().route("/webhook/stripe", post(handle_stripe_webhook))
}

/// POST /webhook/stripe
///
/// Anything past signature verification is answered 200 so the provider
/// does not retry; reconciliation problems are only logged.
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|h| h.to_str().ok());

    let event = match state.checkout.parse_webhook(&body, signature) {
        Ok(event) => event,
        Err(PaymentError::InvalidSignature(reason)) => {
            tracing::warn!("Rejected webhook delivery: {}", reason);
            return Err(AppError::ValidationError("Invalid signature".to_string()));
        }
        Err(e) => {
            tracing::warn!("Signed webhook could not be decoded: {}", e);
            return Ok(acknowledged());
        }
    };

    match event {
        WebhookEvent::CheckoutCompleted(session) if session.is_completed() => {
            match state.reconciler.persist(&session.metadata).await {
                Ok(Reconciled::Inserted(booking)) => {
                    tracing::info!("Webhook persisted booking {} for checkout {}", booking.id, session.id)
                }
                Ok(Reconciled::AlreadyPersisted(booking)) => {
                    tracing::info!("Checkout {} already recorded as booking {}", session.id, booking.id)
                }
                Ok(Reconciled::MissingMetadata) => {
                    tracing::warn!("Checkout {} carried incomplete booking metadata", session.id)
                }
                Err(e) => tracing::error!("Failed to persist checkout {}: {}", session.id, e),
            }
        }
        WebhookEvent::CheckoutCompleted(session) => {
            tracing::info!("Checkout {} completed without payment; ignoring", session.id)
        }
        WebhookEvent::Other(kind) => tracing::debug!("Ignoring webhook event {}", kind),
    }

    Ok(acknowledged())
}

fn acknowledged() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "success" })))
}
