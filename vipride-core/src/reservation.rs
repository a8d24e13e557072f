use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// Kind of service a reservation was made for.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceType {
    #[default]
    Transfer,
    Tour,
    Chauffeur,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Transfer => "TRANSFER",
            ServiceType::Tour => "TOUR",
            ServiceType::Chauffeur => "CHAUFFEUR",
        }
    }

    /// Derives the service from a client booking reference such as
    /// `TRF-1699999999`. Unknown prefixes fall back to `Transfer`.
    pub fn from_reference(reference: &str) -> Self {
        let reference = reference.trim();
        if reference.starts_with("TOUR-") {
            ServiceType::Tour
        } else if reference.starts_with("CHF-") {
            ServiceType::Chauffeur
        } else {
            ServiceType::Transfer
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRANSFER" => Ok(ServiceType::Transfer),
            "TOUR" => Ok(ServiceType::Tour),
            "CHAUFFEUR" => Ok(ServiceType::Chauffeur),
            other => Err(CoreError::ValidationError(format!("unknown service type '{}'", other))),
        }
    }
}

/// Statuses accepted at the HTTP boundary.
///
/// The store keeps `status` as free text; this allow-list is only enforced
/// where requests enter the system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Confirmed,
    Cancelled,
    Completed,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Confirmed => "CONFIRMED",
            ReservationStatus::Cancelled => "CANCELLED",
            ReservationStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CONFIRMED" => Ok(ReservationStatus::Confirmed),
            "CANCELLED" => Ok(ReservationStatus::Cancelled),
            "COMPLETED" => Ok(ReservationStatus::Completed),
            _ => Err(CoreError::ValidationError(format!(
                "status must be one of CONFIRMED, CANCELLED, COMPLETED (got '{}')",
                s
            ))),
        }
    }
}

fn default_passengers() -> i32 {
    1
}

fn default_status() -> String {
    ReservationStatus::Confirmed.to_string()
}

/// A reservation before the store has assigned `id` and `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewReservation {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub pickup_location: String,
    #[serde(default)]
    pub dropoff_location: String,
    #[serde(default)]
    pub pickup_date: String,
    #[serde(default)]
    pub pickup_time: String,
    #[serde(default)]
    pub vehicle_type: String,
    #[serde(default)]
    pub service_type: ServiceType,
    #[serde(default = "default_passengers")]
    pub passengers: i32,
    #[serde(default)]
    pub special_requests: String,
    #[serde(default = "default_status")]
    pub status: String,
}

/// A persisted reservation row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reservation {
    pub id: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub pickup_date: String,
    pub pickup_time: String,
    pub vehicle_type: String,
    pub service_type: ServiceType,
    pub passengers: i32,
    pub special_requests: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn from_new(id: i64, new: NewReservation, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            customer_name: new.customer_name,
            customer_email: new.customer_email,
            customer_phone: new.customer_phone,
            pickup_location: new.pickup_location,
            dropoff_location: new.dropoff_location,
            pickup_date: new.pickup_date,
            pickup_time: new.pickup_time,
            vehicle_type: new.vehicle_type,
            service_type: new.service_type,
            passengers: new.passengers,
            special_requests: new.special_requests,
            status: new.status,
            created_at,
        }
    }

    /// The caller-supplied part of the record.
    pub fn details(&self) -> NewReservation {
        NewReservation {
            customer_name: self.customer_name.clone(),
            customer_email: self.customer_email.clone(),
            customer_phone: self.customer_phone.clone(),
            pickup_location: self.pickup_location.clone(),
            dropoff_location: self.dropoff_location.clone(),
            pickup_date: self.pickup_date.clone(),
            pickup_time: self.pickup_time.clone(),
            vehicle_type: self.vehicle_type.clone(),
            service_type: self.service_type,
            passengers: self.passengers,
            special_requests: self.special_requests.clone(),
            status: self.status.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_type_from_reference() {
        assert_eq!(ServiceType::from_reference("TOUR-1699999999"), ServiceType::Tour);
        assert_eq!(ServiceType::from_reference("TRF-1699999999"), ServiceType::Transfer);
        assert_eq!(ServiceType::from_reference("CHF-1699999999"), ServiceType::Chauffeur);
        assert_eq!(ServiceType::from_reference("XYZ-1"), ServiceType::Transfer);
        assert_eq!(ServiceType::from_reference(""), ServiceType::Transfer);
    }

    #[test]
    fn test_status_allow_list() {
        assert_eq!("cancelled".parse::<ReservationStatus>().unwrap(), ReservationStatus::Cancelled);
        assert_eq!(" COMPLETED ".parse::<ReservationStatus>().unwrap(), ReservationStatus::Completed);
        assert!("PENDING".parse::<ReservationStatus>().is_err());
        assert!("".parse::<ReservationStatus>().is_err());
    }

    #[test]
    fn test_new_reservation_defaults() {
        let json = r#"{ "customer_name": "Ayse Yilmaz", "pickup_location": "IST" }"#;
        let new: NewReservation = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(new.passengers, 1);
        assert_eq!(new.service_type, ServiceType::Transfer);
        assert_eq!(new.status, "CONFIRMED");
        assert_eq!(new.special_requests, "");
    }

    #[test]
    fn test_service_type_serializes_uppercase() {
        let json = serde_json::to_string(&ServiceType::Chauffeur).unwrap();
        assert_eq!(json, "\"CHAUFFEUR\"");
    }
}
