use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};
use vipride_core::payment::{PaymentError, PaymentGateway, PaymentOutcome, PaymentRequest};

use crate::app_config::PaymentConfig;

/// HTTP client for the card payment provider.
pub struct HttpPaymentGateway {
    client: Client,
    endpoint: String,
    api_key: String,
    secret_key: String,
}

impl HttpPaymentGateway {
    pub fn new(config: &PaymentConfig) -> Result<Self, PaymentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| PaymentError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/payment/auth", config.base_uri.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            secret_key: config.secret_key.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn charge(&self, request: &PaymentRequest) -> Result<PaymentOutcome, PaymentError> {
        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.api_key, Some(&self.secret_key))
            .header("x-conversation-id", request.conversation_id.to_string())
            .json(request)
            .send()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, conversation_id = %request.conversation_id, "Payment gateway returned an error status");
            return Err(PaymentError::ProviderApi(format!("{}: {}", status, body)));
        }

        let outcome: PaymentOutcome = response
            .json()
            .await
            .map_err(|e| PaymentError::ProviderApi(format!("unreadable response: {e}")))?;

        info!(
            conversation_id = %request.conversation_id,
            reference = %request.booking_reference,
            success = outcome.is_success(),
            "Payment gateway responded"
        );
        Ok(outcome)
    }
}
