pub mod booking;
pub mod distance;
pub mod memory;
pub mod notification;
pub mod payment;
pub mod repository;
pub mod reservation;
pub mod retry;

pub use repository::{ConnectionFault, ReservationRepository, StoreError};
pub use reservation::{NewReservation, Reservation, ReservationStatus, ServiceType};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
}
