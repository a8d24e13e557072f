use async_trait::async_trait;
use std::fmt;

use crate::reservation::{NewReservation, Reservation};

/// Connection-level failure classes reported by the database driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionFault {
    /// The peer reset the socket mid-operation.
    Reset,
    /// The connection went away (server gone, broken pipe, killed).
    Lost,
    /// Work was queued on a pool that had already failed fatally.
    EnqueueAfterFatal,
}

impl fmt::Display for ConnectionFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionFault::Reset => f.write_str("connection reset"),
            ConnectionFault::Lost => f.write_str("connection lost"),
            ConnectionFault::EnqueueAfterFatal => f.write_str("enqueue after fatal error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("transient connection error ({fault}): {message}")]
    TransientConnection { fault: ConnectionFault, message: String },
    #[error("query failed: {0}")]
    Query(String),
}

impl StoreError {
    pub fn transient(fault: ConnectionFault, message: impl Into<String>) -> Self {
        StoreError::TransientConnection { fault, message: message.into() }
    }

    /// Only resets and lost connections are worth another write attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::TransientConnection { fault: ConnectionFault::Reset | ConnectionFault::Lost, .. }
        )
    }

    /// Errors after which the connection pool should be rebuilt.
    pub fn is_fatal_to_pool(&self) -> bool {
        matches!(self, StoreError::TransientConnection { .. })
    }
}

/// Repository trait for reservation data access
///
/// The store owns the `reservations` table; nothing else queries it directly.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Insert a reservation and return its new id. Retries transient
    /// connection failures with exponential backoff.
    async fn create(&self, reservation: &NewReservation) -> Result<i64, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Reservation>, StoreError>;

    /// All reservations, newest first.
    async fn find_all(&self) -> Result<Vec<Reservation>, StoreError>;

    /// Overwrites `status` unconditionally. An unknown id is not an error.
    async fn update_status(&self, id: i64, status: &str) -> Result<(), StoreError>;
}
