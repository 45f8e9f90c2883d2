//! PIX payment provider client.
//!
//! Talks to an Efí-style PIX API when an API key is configured. Without
//! a key the client never leaves the process and serves locally
//! generated mock intents, which keeps development setups working
//! end-to-end against the same code path.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::services::gateway::{GatewayError, PaymentGateway, PaymentIntent, PaymentRequest};

/// How webhook notifications are authenticated.
#[derive(Debug, Clone)]
pub enum WebhookAuthenticity {
    /// Every notification is accepted. An explicit configuration state,
    /// only for setups without a provider secret.
    Disabled,
    /// The signature header must equal the shared secret.
    SharedSecret(String),
}

/// HTTP client for the PIX provider.
#[derive(Debug, Clone)]
pub struct PixClient {
    http: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
    authenticity: WebhookAuthenticity,
}

impl PixClient {
    /// Creates a client for the given provider base URL.
    pub fn new(
        api_base: String,
        api_key: Option<String>,
        authenticity: WebhookAuthenticity,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            api_base,
            api_key,
            authenticity,
        })
    }

    fn mock_intent(&self, request: &PaymentRequest) -> PaymentIntent {
        let pix_id = Uuid::new_v4().to_string();
        let expires_at =
            chrono::Utc::now().timestamp_millis() + request.expires_in_secs as i64 * 1000;
        let payload = json!({
            "pixId": pix_id,
            "amount": request.amount.cents(),
            "expiresAt": expires_at,
            "qr": format!("PIX-QR-{pix_id}"),
        });
        PaymentIntent {
            provider_payment_id: pix_id,
            payload,
        }
    }
}

#[async_trait]
impl PaymentGateway for PixClient {
    async fn initiate(&self, request: PaymentRequest) -> Result<PaymentIntent, GatewayError> {
        let Some(api_key) = &self.api_key else {
            tracing::warn!(
                order_id = %request.order_id,
                "no PIX API key configured, issuing mock intent"
            );
            return Ok(self.mock_intent(&request));
        };

        let url = format!("{}/pix/create", self.api_base);
        let body = json!({
            "amount": request.amount.cents(),
            "external_id": request.order_id,
            "expires_in": request.expires_in_secs,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::Rejected(format!(
                "provider returned {}",
                response.status()
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;

        // Providers disagree on the name of the id field; fall back to a
        // local id so the order always carries one.
        let provider_payment_id = payload
            .get("id")
            .or_else(|| payload.get("pixId"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        tracing::info!(
            order_id = %request.order_id,
            provider_payment_id,
            "payment intent opened"
        );

        Ok(PaymentIntent {
            provider_payment_id,
            payload,
        })
    }

    fn verify_notification(&self, signature: Option<&str>) -> bool {
        match &self.authenticity {
            WebhookAuthenticity::Disabled => true,
            WebhookAuthenticity::SharedSecret(secret) => {
                signature.is_some_and(|s| s == secret.as_str())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Money, OrderId};

    fn mock_client(authenticity: WebhookAuthenticity) -> PixClient {
        PixClient::new("https://api.efi.example".to_string(), None, authenticity).unwrap()
    }

    #[tokio::test]
    async fn test_mock_intent_without_api_key() {
        let client = mock_client(WebhookAuthenticity::Disabled);
        let before = chrono::Utc::now().timestamp_millis();

        let intent = client
            .initiate(PaymentRequest::new(Money::from_cents(3500), OrderId::new()))
            .await
            .unwrap();

        assert!(Uuid::parse_str(&intent.provider_payment_id).is_ok());
        assert_eq!(intent.payload["amount"], 3500);
        assert_eq!(
            intent.payload["qr"],
            format!("PIX-QR-{}", intent.provider_payment_id)
        );

        let expires_at = intent.payload["expiresAt"].as_i64().unwrap();
        assert!(expires_at >= before + 1800 * 1000);
    }

    #[test]
    fn test_disabled_authenticity_accepts_everything() {
        let client = mock_client(WebhookAuthenticity::Disabled);
        assert!(client.verify_notification(None));
        assert!(client.verify_notification(Some("whatever")));
    }

    #[test]
    fn test_shared_secret_requires_exact_match() {
        let client = mock_client(WebhookAuthenticity::SharedSecret("s3cret".to_string()));
        assert!(client.verify_notification(Some("s3cret")));
        assert!(!client.verify_notification(Some("wrong")));
        assert!(!client.verify_notification(None));
    }
}
