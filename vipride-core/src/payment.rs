use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::booking::Buyer;

/// Card payment forwarded to the gateway. Card and basket fields are kept
/// as the client sent them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub conversation_id: Uuid,
    pub booking_reference: String,
    pub buyer: Buyer,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Success,
    Failure,
}

/// The gateway's verdict on a payment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub status: PaymentStatus,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl PaymentOutcome {
    pub fn is_success(&self) -> bool {
        self.status == PaymentStatus::Success
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment gateway unreachable: {0}")]
    Transport(String),
    #[error("Payment gateway API error: {0}")]
    ProviderApi(String),
}

/// Remote card payment service.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: &PaymentRequest) -> Result<PaymentOutcome, PaymentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_deserialization() {
        let json = r#"{ "status": "failure", "errorMessage": "Card declined" }"#;
        let outcome: PaymentOutcome = serde_json::from_str(json).expect("Failed to deserialize");
        assert!(!outcome.is_success());
        assert_eq!(outcome.error_message.as_deref(), Some("Card declined"));
        assert_eq!(outcome.payment_id, None);
    }

    #[test]
    fn test_request_flattens_opaque_fields() {
        let mut fields = Map::new();
        fields.insert("paidPrice".into(), Value::from("120.0"));
        let request = PaymentRequest {
            conversation_id: Uuid::nil(),
            booking_reference: "TRF-1".into(),
            buyer: Buyer::default(),
            fields,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["paidPrice"], "120.0");
        assert_eq!(json["bookingReference"], "TRF-1");
    }
}
