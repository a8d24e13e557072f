use async_trait::async_trait;
use serde::Deserialize;

use crate::reservation::Reservation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailBody {
    Html(String),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub body: EmailBody,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
    #[error("Failed to build email: {0}")]
    Build(String),
    #[error("Failed to send email: {0}")]
    Transport(String),
}

/// Outbound transactional mail.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError>;
}

/// Booking summary fields that are not persisted but appear in the confirmation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfirmationExtras {
    pub booking_reference: String,
    pub total_price: Option<String>,
}

pub fn confirmation_email(reservation: &Reservation, extras: &ConfirmationExtras) -> EmailMessage {
    let name = reservation.customer_name.trim();
    let greeting = if name.is_empty() {
        String::from("Dear guest,")
    } else {
        format!("Dear {},", name)
    };

    let price_row = extras
        .total_price
        .as_deref()
        .map(|p| format!("<tr><td><strong>Total</strong></td><td>{}</td></tr>", p))
        .unwrap_or_default();

    let special = if reservation.special_requests.trim().is_empty() {
        String::new()
    } else {
        format!(
            "<tr><td><strong>Special requests</strong></td><td>{}</td></tr>",
            reservation.special_requests
        )
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Booking Confirmation</title></head>
<body style="font-family: Arial, sans-serif; color: #333;">
  <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2 style="color: #b8860b;">VIP Ride Istanbul Airport</h2>
    <p>{greeting}</p>
    <p>Your booking is confirmed. Reference: <strong>{reference}</strong> (#{id})</p>
    <table cellpadding="6">
      <tr><td><strong>Service</strong></td><td>{service}</td></tr>
      <tr><td><strong>Vehicle</strong></td><td>{vehicle}</td></tr>
      <tr><td><strong>Pickup</strong></td><td>{pickup}</td></tr>
      <tr><td><strong>Drop-off</strong></td><td>{dropoff}</td></tr>
      <tr><td><strong>Date</strong></td><td>{date} {time}</td></tr>
      <tr><td><strong>Passengers</strong></td><td>{passengers}</td></tr>
      {price_row}
      {special}
    </table>
    <p>Your driver will meet you at the pickup point with a name sign.</p>
  </div>
</body>
</html>"#,
        greeting = greeting,
        reference = extras.booking_reference,
        id = reservation.id,
        service = reservation.service_type,
        vehicle = reservation.vehicle_type,
        pickup = reservation.pickup_location,
        dropoff = reservation.dropoff_location,
        date = reservation.pickup_date,
        time = reservation.pickup_time,
        passengers = reservation.passengers,
        price_row = price_row,
        special = special,
    );

    EmailMessage {
        to: reservation.customer_email.clone(),
        to_name: (!name.is_empty()).then(|| name.to_string()),
        subject: format!("Booking Confirmation - {}", extras.booking_reference),
        body: EmailBody::Html(html),
    }
}
