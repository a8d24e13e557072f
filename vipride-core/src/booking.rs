//! Turning a payment/booking submission from the booking wizards into a
//! reservation record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::notification::ConfirmationExtras;
use crate::payment::PaymentRequest;
use crate::reservation::{NewReservation, ReservationStatus, ServiceType};

pub const DEFAULT_VEHICLE: &str = "Mercedes Vito";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buyer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gsm_number: Option<String>,
    /// Identity, address and other gateway-only fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    pub email: Option<String>,
    pub name: Option<String>,
    pub service_name: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
    pub total_price: Option<Value>,
    pub booking_reference: Option<String>,
    pub passengers: Option<Value>,
    pub phone: Option<String>,
    pub special_requests: Option<String>,
}

/// Body of `POST /api/payment`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSubmission {
    #[serde(default)]
    pub buyer: Buyer,
    #[serde(default)]
    pub booking_details: BookingDetails,
    /// Card, price and basket fields, passed through to the gateway untouched.
    #[serde(flatten)]
    pub payment: Map<String, Value>,
}

/// What to do when the reservation cannot be written after a successful payment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PersistenceFailurePolicy {
    /// Log the failure and still answer the client with success. The booking
    /// wizard never blocks a paid customer on a backend write.
    #[default]
    ReportSuccess,
    /// Answer with a server error.
    Surface,
}

impl PersistenceFailurePolicy {
    pub fn from_swallow_flag(swallow: bool) -> Self {
        if swallow {
            PersistenceFailurePolicy::ReportSuccess
        } else {
            PersistenceFailurePolicy::Surface
        }
    }

    pub fn fails_request(&self) -> bool {
        matches!(self, PersistenceFailurePolicy::Surface)
    }
}

#[derive(Debug, Clone)]
pub struct BookingDefaults {
    pub default_vehicle: String,
}

impl Default for BookingDefaults {
    fn default() -> Self {
        Self { default_vehicle: DEFAULT_VEHICLE.to_string() }
    }
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn text(value: Option<&String>) -> String {
    value.cloned().unwrap_or_default()
}

/// Passenger count from a loosely typed field: absent or falsy means 1.
pub fn passenger_count(value: Option<&Value>) -> i32 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match parsed {
        Some(n) if n > 0 => i32::try_from(n).unwrap_or(i32::MAX),
        _ => 1,
    }
}

impl BookingSubmission {
    pub fn booking_reference(&self) -> &str {
        self.booking_details.booking_reference.as_deref().unwrap_or("")
    }

    pub fn service_type(&self) -> ServiceType {
        ServiceType::from_reference(self.booking_reference())
    }

    fn customer_name(&self) -> String {
        let first = self.buyer.name.as_deref().unwrap_or("").trim();
        let last = self.buyer.surname.as_deref().unwrap_or("").trim();
        let full = format!("{} {}", first, last).trim().to_string();
        if full.is_empty() {
            non_blank(self.booking_details.name.as_ref()).unwrap_or("").to_string()
        } else {
            full
        }
    }

    pub fn customer_email(&self) -> String {
        non_blank(self.booking_details.email.as_ref())
            .or_else(|| non_blank(self.buyer.email.as_ref()))
            .unwrap_or("")
            .to_string()
    }

    fn customer_phone(&self) -> String {
        non_blank(self.buyer.gsm_number.as_ref())
            .or_else(|| non_blank(self.booking_details.phone.as_ref()))
            .unwrap_or("")
            .to_string()
    }

    /// Builds the reservation row. Status is always `CONFIRMED`: by the time
    /// this runs the gateway has accepted the payment.
    pub fn to_reservation(&self, defaults: &BookingDefaults) -> NewReservation {
        let details = &self.booking_details;
        let vehicle_type = non_blank(details.service_name.as_ref())
            .unwrap_or(defaults.default_vehicle.as_str())
            .to_string();

        NewReservation {
            customer_name: self.customer_name(),
            customer_email: self.customer_email(),
            customer_phone: self.customer_phone(),
            pickup_location: text(details.pickup_location.as_ref()),
            dropoff_location: text(details.dropoff_location.as_ref()),
            pickup_date: text(details.date.as_ref()),
            pickup_time: text(details.time.as_ref()),
            vehicle_type,
            service_type: self.service_type(),
            passengers: passenger_count(details.passengers.as_ref()),
            special_requests: text(details.special_requests.as_ref()),
            status: ReservationStatus::Confirmed.to_string(),
        }
    }

    pub fn payment_request(&self, conversation_id: Uuid) -> PaymentRequest {
        PaymentRequest {
            conversation_id,
            booking_reference: self.booking_reference().to_string(),
            buyer: self.buyer.clone(),
            fields: self.payment.clone(),
        }
    }

    pub fn confirmation_extras(&self) -> ConfirmationExtras {
        let total_price = match &self.booking_details.total_price {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        ConfirmationExtras {
            booking_reference: self.booking_reference().to_string(),
            total_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn submission(value: Value) -> BookingSubmission {
        serde_json::from_value(value).expect("Failed to deserialize")
    }

    #[test]
    fn test_full_derivation() {
        let sub = submission(json!({
            "price": "150.0",
            "paymentCard": { "cardNumber": "5528790000000008" },
            "buyer": { "name": "Ayse", "surname": "Yilmaz", "email": "buyer@example.com", "gsmNumber": "  +905551234567 ", "city": "Istanbul" },
            "bookingDetails": {
                "email": "guest@example.com",
                "serviceName": "Mercedes S-Class",
                "date": "2026-11-02",
                "time": "14:30",
                "pickupLocation": "Istanbul Airport",
                "dropoffLocation": "Sultanahmet",
                "totalPrice": 150,
                "bookingReference": "TOUR-1699999999",
                "passengers": 4,
                "specialRequests": "Child seat"
            }
        }));

        let r = sub.to_reservation(&BookingDefaults::default());
        assert_eq!(r.customer_name, "Ayse Yilmaz");
        assert_eq!(r.customer_email, "guest@example.com");
        assert_eq!(r.customer_phone, "+905551234567");
        assert_eq!(r.pickup_location, "Istanbul Airport");
        assert_eq!(r.dropoff_location, "Sultanahmet");
        assert_eq!(r.pickup_date, "2026-11-02");
        assert_eq!(r.pickup_time, "14:30");
        assert_eq!(r.vehicle_type, "Mercedes S-Class");
        assert_eq!(r.service_type, ServiceType::Tour);
        assert_eq!(r.passengers, 4);
        assert_eq!(r.special_requests, "Child seat");
        assert_eq!(r.status, "CONFIRMED");

        assert!(sub.payment.contains_key("price"));
        assert!(sub.payment.contains_key("paymentCard"));
        assert_eq!(sub.buyer.extra["city"], "Istanbul");
        assert_eq!(sub.confirmation_extras().total_price.as_deref(), Some("150"));
    }

    #[test]
    fn test_minimal_submission_defaults() {
        let sub = submission(json!({ "bookingDetails": { "bookingReference": "CHF-1699999999" } }));
        let r = sub.to_reservation(&BookingDefaults::default());
        assert_eq!(r.service_type, ServiceType::Chauffeur);
        assert_eq!(r.passengers, 1);
        assert_eq!(r.vehicle_type, DEFAULT_VEHICLE);
        assert_eq!(r.customer_name, "");
        assert_eq!(r.customer_phone, "");
        assert_eq!(r.special_requests, "");
        assert_eq!(r.status, "CONFIRMED");
    }

    #[test]
    fn test_reference_prefixes() {
        for (reference, expected) in [
            ("TOUR-1699999999", ServiceType::Tour),
            ("TRF-1699999999", ServiceType::Transfer),
            ("CHF-1699999999", ServiceType::Chauffeur),
            ("XYZ-1", ServiceType::Transfer),
        ] {
            let sub = submission(json!({ "bookingDetails": { "bookingReference": reference } }));
            assert_eq!(sub.service_type(), expected, "reference {}", reference);
        }
    }

    #[test]
    fn test_falsy_passengers_default_to_one() {
        for value in [json!(0), json!(""), json!(false), json!(null), json!("abc"), json!(-2)] {
            assert_eq!(passenger_count(Some(&value)), 1, "value {}", value);
        }
        assert_eq!(passenger_count(None), 1);
        assert_eq!(passenger_count(Some(&json!("3"))), 3);
        assert_eq!(passenger_count(Some(&json!(7))), 7);
    }

    #[test]
    fn test_name_and_contact_fallbacks() {
        let sub = submission(json!({
            "buyer": { "email": "buyer@example.com" },
            "bookingDetails": { "name": "Guest Name", "phone": " 0212 000 00 00 " }
        }));
        let defaults = BookingDefaults { default_vehicle: "Mercedes Sprinter".into() };
        let r = sub.to_reservation(&defaults);
        assert_eq!(r.customer_name, "Guest Name");
        assert_eq!(r.customer_email, "buyer@example.com");
        assert_eq!(r.customer_phone, "0212 000 00 00");
        assert_eq!(r.vehicle_type, "Mercedes Sprinter");
    }

    #[test]
    fn test_persistence_policy_flag() {
        assert_eq!(PersistenceFailurePolicy::default(), PersistenceFailurePolicy::ReportSuccess);
        assert!(!PersistenceFailurePolicy::from_swallow_flag(true).fails_request());
        assert!(PersistenceFailurePolicy::from_swallow_flag(false).fails_request());
    }
}
