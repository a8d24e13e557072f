use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::post,
    Router,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;
use vipride_core::booking::BookingSubmission;
use vipride_core::notification::confirmation_email;
use vipride_core::{NewReservation, Reservation};
use vipride_shared::Masked;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl PaymentResponse {
    fn success(reservation_id: Option<i64>) -> Self {
        Self { status: "success", reservation_id, error_message: None }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self { status: "failure", reservation_id: None, error_message: Some(message.into()) }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/payment", post(process_payment))
}

/// POST /api/payment
/// Charge the card, record the reservation and send the confirmation.
///
/// Once the gateway has accepted the payment the client gets a success
/// answer; reservation and email failures are logged (see
/// `PersistenceFailurePolicy` for the reservation case).
async fn process_payment(
    State(state): State<AppState>,
    Json(submission): Json<BookingSubmission>,
) -> Result<(StatusCode, Json<PaymentResponse>), AppError> {
    let conversation_id = Uuid::new_v4();
    let reference = submission.booking_reference().to_string();
    info!(%conversation_id, %reference, "Payment submitted");

    // 1. Charge
    match state.payments.charge(&submission.payment_request(conversation_id)).await {
        Ok(outcome) if outcome.is_success() => {
            info!(%conversation_id, payment_id = ?outcome.payment_id, "Payment accepted");
        }
        Ok(outcome) => {
            let message = outcome.error_message.unwrap_or_else(|| "Payment failed".to_string());
            warn!(%conversation_id, reason = %message, "Payment declined");
            return Ok((StatusCode::BAD_REQUEST, Json(PaymentResponse::failure(message))));
        }
        Err(e) => {
            error!(%conversation_id, error = %e, "Payment gateway call failed");
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(PaymentResponse::failure("Payment could not be processed")),
            ));
        }
    }

    // 2. Persist
    let new_reservation = submission.to_reservation(&state.booking.defaults);
    let reservation_id = match state.reservations.create(&new_reservation).await {
        Ok(id) => Some(id),
        Err(e) => {
            error!(%reference, error = %e, "Failed to save reservation after successful payment");
            if state.booking.persistence_failure.fails_request() {
                return Err(AppError::Anyhow(e.into()));
            }
            None
        }
    };

    // 3. Confirm
    if let Some(id) = reservation_id {
        send_confirmation(&state, id, new_reservation, &submission).await;
    }

    Ok((StatusCode::OK, Json(PaymentResponse::success(reservation_id))))
}

async fn send_confirmation(
    state: &AppState,
    id: i64,
    new_reservation: NewReservation,
    submission: &BookingSubmission,
) {
    let reservation = Reservation::from_new(id, new_reservation, Utc::now());
    if reservation.customer_email.is_empty() {
        warn!(reservation_id = id, "No customer email, skipping confirmation");
        return;
    }

    let email = confirmation_email(&reservation, &submission.confirmation_extras());
    match state.mailer.send(&email).await {
        Ok(()) => info!(reservation_id = id, to = ?Masked(&email.to), "Confirmation email sent"),
        Err(e) => error!(reservation_id = id, error = %e, "Failed to send confirmation email"),
    }
}
