use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// String key/value pairs carried by a checkout session.
pub type CheckoutMetadata = BTreeMap<String, String>;

/// Where a hosted checkout attempt stands on the provider side.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckoutStatus {
    /// Session exists, payment not collected yet.
    Created,
    /// Payment collected.
    Completed,
    /// Session closed without payment.
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub product_name: String,
    /// Per-ticket price in the currency's minor unit.
    pub unit_amount: i64,
    pub currency: String,
    pub quantity: i32,
    pub metadata: CheckoutMetadata,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutRequest {
    pub fn total_amount(&self) -> i64 {
        self.unit_amount * i64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String, // Provider's ID (e.g., cs_test_123)
    pub url: Option<String>,
    pub status: CheckoutStatus,
    pub amount_total: Option<i64>,
    pub metadata: CheckoutMetadata,
}

impl CheckoutSession {
    pub fn is_completed(&self) -> bool {
        self.status == CheckoutStatus::Completed
    }
}

/// A verified webhook notification.
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    CheckoutCompleted(CheckoutSession),
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("payment provider request failed: {0}")]
    Provider(String),
    #[error("checkout session not found: {0}")]
    NotFound(String),
    #[error("invalid webhook signature: {0}")]
    InvalidSignature(String),
    #[error("malformed provider payload: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    /// Create a hosted checkout session the buyer is redirected to
    async fn create_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession, PaymentError>;

    /// Re-fetch a session from the provider; callers must not trust client-supplied state
    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, PaymentError>;

    /// Verify and decode a webhook delivery
    fn parse_webhook(&self, payload: &[u8], signature: Option<&str>) -> Result<WebhookEvent, PaymentError>;
}
