use async_trait::async_trait;
use flickbook_core::payment::{
    CheckoutProvider, CheckoutRequest, CheckoutSession, CheckoutStatus, PaymentError, WebhookEvent,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::info;
use uuid::Uuid;

use crate::stripe::{decode_event, verify_signature, SIGNATURE_TOLERANCE_SECS};

/// In-process checkout provider for local runs and tests.
///
/// Sessions live in memory. Webhooks use the same signed envelope as
/// Stripe so the webhook route behaves identically against either.
#[derive(Clone)]
pub struct MockCheckoutProvider {
    sessions: Arc<Mutex<HashMap<String, CheckoutSession>>>,
    webhook_secret: String,
    auto_complete: bool,
}

impl MockCheckoutProvider {
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            webhook_secret: webhook_secret.into(),
            auto_complete: false,
        }
    }

    /// Sessions are marked paid as soon as they are created.
    pub fn auto_completing(mut self) -> Self {
        self.auto_complete = true;
        self
    }

    pub fn webhook_secret(&self) -> &str {
        &self.webhook_secret
    }

    /// Mark a session paid, as if the buyer finished the hosted page.
    pub fn complete(&self, session_id: &str) -> Result<CheckoutSession, PaymentError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| PaymentError::Provider(e.to_string()))?;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| PaymentError::NotFound(session_id.to_string()))?;
        session.status = CheckoutStatus::Completed;
        Ok(session.clone())
    }

    /// Body of a `checkout.session.completed` event for `session`.
    pub fn completed_event(session: &CheckoutSession) -> serde_json::Value {
        serde_json::json!({
            "id": format!("evt_mock_{}", Uuid::new_v4().simple()),
            "type": "checkout.session.completed",
            "data": {"object": {
                "id": session.id,
                "url": session.url,
                "status": "complete",
                "payment_status": "paid",
                "amount_total": session.amount_total,
                "metadata": session.metadata,
            }}
        })
    }
}

#[async_trait]
impl CheckoutProvider for MockCheckoutProvider {
    async fn create_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession, PaymentError> {
        let id = format!("cs_mock_{}", Uuid::new_v4().simple());
        let status = if self.auto_complete {
            CheckoutStatus::Completed
        } else {
            CheckoutStatus::Created
        };
        let session = CheckoutSession {
            url: Some(format!("https://checkout.mock.local/pay/{}", id)),
            id,
            status,
            amount_total: Some(request.total_amount()),
            metadata: request.metadata.clone(),
        };

        self.sessions
            .lock()
            .map_err(|e| PaymentError::Provider(e.to_string()))?
            .insert(session.id.clone(), session.clone());

        info!("Created mock checkout session {}", session.id);
        Ok(session)
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, PaymentError> {
        self.sessions
            .lock()
            .map_err(|e| PaymentError::Provider(e.to_string()))?
            .get(session_id)
            .cloned()
            .ok_or_else(|| PaymentError::NotFound(session_id.to_string()))
    }

    fn parse_webhook(&self, payload: &[u8], signature: Option<&str>) -> Result<WebhookEvent, PaymentError> {
        let header = signature
            .ok_or_else(|| PaymentError::InvalidSignature("missing signature header".to_string()))?;
        verify_signature(
            payload,
            header,
            &self.webhook_secret,
            chrono::Utc::now().timestamp(),
            SIGNATURE_TOLERANCE_SECS,
        )?;
        decode_event(payload)
    }
}
