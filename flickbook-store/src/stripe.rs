use async_trait::async_trait;
use flickbook_core::payment::{
    CheckoutMetadata, CheckoutProvider, CheckoutRequest, CheckoutSession, CheckoutStatus,
    PaymentError, WebhookEvent,
};
use flickbook_shared::pii::Masked;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration;
use tracing::{info, warn};

use crate::app_config::PaymentsConfig;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a webhook signature timestamp, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Hosted checkout through Stripe Checkout Sessions.
pub struct StripeClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: Masked<String>,
    webhook_secret: Masked<String>,
}

/// Checkout session object as Stripe returns it.
#[derive(Debug, Deserialize)]
pub(crate) struct StripeSession {
    id: String,
    url: Option<String>,
    status: Option<String>,
    payment_status: Option<String>,
    amount_total: Option<i64>,
    #[serde(default)]
    metadata: CheckoutMetadata,
}

impl From<StripeSession> for CheckoutSession {
    fn from(session: StripeSession) -> Self {
        let status = if session.payment_status.as_deref() == Some("paid") {
            CheckoutStatus::Completed
        } else if session.status.as_deref() == Some("expired") {
            CheckoutStatus::Expired
        } else {
            CheckoutStatus::Created
        };

        CheckoutSession {
            id: session.id,
            url: session.url,
            status,
            amount_total: session.amount_total,
            metadata: session.metadata,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StripeEvent {
    #[serde(rename = "type")]
    type_: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Value,
}

/// Decode an already-verified event body.
pub(crate) fn decode_event(payload: &[u8]) -> Result<WebhookEvent, PaymentError> {
    let event: StripeEvent =
        serde_json::from_slice(payload).map_err(|e| PaymentError::Malformed(e.to_string()))?;

    if event.type_ != "checkout.session.completed" {
        return Ok(WebhookEvent::Other(event.type_));
    }

    let session: StripeSession = serde_json::from_value(event.data.object)
        .map_err(|e| PaymentError::Malformed(e.to_string()))?;
    Ok(WebhookEvent::CheckoutCompleted(session.into()))
}

fn mac_for(secret: &str, timestamp: &str, payload: &[u8]) -> Result<HmacSha256, PaymentError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::InvalidSignature(e.to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Check a `Stripe-Signature` header (`t=<unix>,v1=<hex>[,v1=<hex>...]`).
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
    tolerance: i64,
) -> Result<(), PaymentError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| PaymentError::InvalidSignature("missing timestamp".to_string()))?;
    if signatures.is_empty() {
        return Err(PaymentError::InvalidSignature("missing v1 signature".to_string()));
    }

    let issued: i64 = timestamp
        .parse()
        .map_err(|_| PaymentError::InvalidSignature("malformed timestamp".to_string()))?;
    if (now - issued).abs() > tolerance {
        return Err(PaymentError::InvalidSignature("timestamp outside tolerance".to_string()));
    }

    let mac = mac_for(secret, timestamp, payload)?;
    let matched = signatures.iter().any(|candidate| {
        hex::decode(candidate)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });

    if matched {
        Ok(())
    } else {
        Err(PaymentError::InvalidSignature("signature mismatch".to_string()))
    }
}

/// Build a valid `Stripe-Signature` header for `payload`.
pub fn signature_header(payload: &[u8], secret: &str, timestamp: i64) -> Result<String, PaymentError> {
    let timestamp = timestamp.to_string();
    let digest = mac_for(secret, &timestamp, payload)?.finalize().into_bytes();
    Ok(format!("t={},v1={}", timestamp, hex::encode(digest)))
}

impl StripeClient {
    pub fn new(config: &PaymentsConfig) -> Result<Self, PaymentError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            secret_key: Masked(config.secret_key.clone()),
            webhook_secret: Masked(config.webhook_secret.clone()),
        })
    }

    async fn read_session(response: reqwest::Response) -> Result<CheckoutSession, PaymentError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Provider(format!("{}: {}", status, body)));
        }

        let session: StripeSession = response
            .json()
            .await
            .map_err(|e| PaymentError::Malformed(e.to_string()))?;
        Ok(session.into())
    }
}

#[async_trait]
impl CheckoutProvider for StripeClient {
    async fn create_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession, PaymentError> {
        let mut form: Vec<(String, String)> = vec![
            ("mode".into(), "payment".into()),
            ("success_url".into(), request.success_url.clone()),
            ("cancel_url".into(), request.cancel_url.clone()),
            ("line_items[0][quantity]".into(), request.quantity.to_string()),
            ("line_items[0][price_data][currency]".into(), request.currency.clone()),
            ("line_items[0][price_data][unit_amount]".into(), request.unit_amount.to_string()),
            ("line_items[0][price_data][product_data][name]".into(), request.product_name.clone()),
        ];
        for (key, value) in &request.metadata {
            form.push((format!("metadata[{}]", key), value.clone()));
        }

        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(self.secret_key.expose())
            .form(&form)
            .send()
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        let session = Self::read_session(response).await?;
        info!("Created Stripe checkout session {}", session.id);
        Ok(session)
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, PaymentError> {
        let response = self
            .http
            .get(format!("{}/v1/checkout/sessions/{}", self.api_base, session_id))
            .bearer_auth(self.secret_key.expose())
            .send()
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PaymentError::NotFound(session_id.to_string()));
        }
        Self::read_session(response).await
    }

    fn parse_webhook(&self, payload: &[u8], signature: Option<&str>) -> Result<WebhookEvent, PaymentError> {
        let header = signature
            .ok_or_else(|| PaymentError::InvalidSignature("missing Stripe-Signature header".to_string()))?;

        verify_signature(
            payload,
            header,
            self.webhook_secret.expose(),
            chrono::Utc::now().timestamp(),
            SIGNATURE_TOLERANCE_SECS,
        )
        .inspect_err(|e| warn!("Rejected Stripe webhook: {}", e))?;

        decode_event(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test123secret456";
    const PAYLOAD: &[u8] = b"{\"type\":\"checkout.session.completed\"}";

    #[test]
    fn test_valid_signature() {
        let now = 1_700_000_000;
        let header = signature_header(PAYLOAD, SECRET, now).unwrap();
        assert!(verify_signature(PAYLOAD, &header, SECRET, now, SIGNATURE_TOLERANCE_SECS).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let now = 1_700_000_000;
        let header = signature_header(PAYLOAD, "wrong_secret", now).unwrap();
        assert!(verify_signature(PAYLOAD, &header, SECRET, now, SIGNATURE_TOLERANCE_SECS).is_err());
    }

    #[test]
    fn test_modified_payload_rejected() {
        let now = 1_700_000_000;
        let header = signature_header(PAYLOAD, SECRET, now).unwrap();
        let tampered = b"{\"type\":\"checkout.session.completed\",\"hacked\":true}";
        assert!(verify_signature(tampered, &header, SECRET, now, SIGNATURE_TOLERANCE_SECS).is_err());
    }

    #[test]
    fn test_old_timestamp_rejected() {
        let now = 1_700_000_000;
        let header = signature_header(PAYLOAD, SECRET, now - 600).unwrap();
        assert!(verify_signature(PAYLOAD, &header, SECRET, now, SIGNATURE_TOLERANCE_SECS).is_err());
    }

    #[test]
    fn test_malformed_headers_rejected() {
        for header in ["", "garbage", "t=1700000000", "v1=abcdef"] {
            assert!(
                verify_signature(PAYLOAD, header, SECRET, 1_700_000_000, SIGNATURE_TOLERANCE_SECS).is_err(),
                "header {:?} should be rejected",
                header
            );
        }
    }

    #[test]
    fn test_decode_completed_session() {
        let payload = serde_json::json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": {"object": {
                "id": "cs_test_1",
                "payment_status": "paid",
                "status": "complete",
                "amount_total": 2400,
                "metadata": {"movie_title": "Inception", "quantity": "2"}
            }}
        });

        match decode_event(payload.to_string().as_bytes()).unwrap() {
            WebhookEvent::CheckoutCompleted(session) => {
                assert_eq!(session.id, "cs_test_1");
                assert!(session.is_completed());
                assert_eq!(session.metadata["movie_title"], "Inception");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_other_events_pass_through() {
        let payload = br#"{"type":"payment_intent.created","data":{"object":{}}}"#;
        assert!(matches!(
            decode_event(payload).unwrap(),
            WebhookEvent::Other(kind) if kind == "payment_intent.created"
        ));
    }
}
