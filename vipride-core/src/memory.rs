//! In-process reservation store.
//!
//! Backs the HTTP tests and local runs without MySQL. Writes go through the
//! same retry policy as the database store; failures can be scripted to
//! exercise it.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::Mutex;
use tracing::info;

use crate::repository::{ReservationRepository, StoreError};
use crate::reservation::{NewReservation, Reservation};
use crate::retry::{retry_with_backoff, RetryPolicy};

#[derive(Default)]
struct Table {
    rows: Vec<Reservation>,
    next_id: i64,
}

pub struct InMemoryReservationRepository {
    table: Mutex<Table>,
    scripted_failures: Mutex<VecDeque<StoreError>>,
    insert_attempts: AtomicU32,
    retry: RetryPolicy,
}

impl InMemoryReservationRepository {
    pub fn new() -> Self {
        Self::with_retry(RetryPolicy::reservation_writes())
    }

    pub fn with_retry(retry: RetryPolicy) -> Self {
        Self {
            table: Mutex::new(Table { rows: Vec::new(), next_id: 1 }),
            scripted_failures: Mutex::new(VecDeque::new()),
            insert_attempts: AtomicU32::new(0),
            retry,
        }
    }

    /// The next inserts fail with these errors, in order.
    pub async fn fail_next_inserts(&self, errors: impl IntoIterator<Item = StoreError>) {
        self.scripted_failures.lock().await.extend(errors);
    }

    /// Number of insert attempts made so far, retries included.
    pub fn insert_attempts(&self) -> u32 {
        self.insert_attempts.load(Ordering::SeqCst)
    }

    async fn insert_once(&self, reservation: &NewReservation) -> Result<i64, StoreError> {
        let attempt = self.insert_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(err) = self.scripted_failures.lock().await.pop_front() {
            return Err(err);
        }

        let mut table = self.table.lock().await;
        let id = table.next_id;
        table.next_id += 1;
        table.rows.push(Reservation::from_new(id, reservation.clone(), Utc::now()));
        info!(reservation_id = id, attempt, "Reservation inserted");
        Ok(id)
    }
}

impl Default for InMemoryReservationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReservationRepository for InMemoryReservationRepository {
    async fn create(&self, reservation: &NewReservation) -> Result<i64, StoreError> {
        retry_with_backoff(
            &self.retry,
            "reservation.create",
            || self.insert_once(reservation),
            StoreError::is_retryable,
        )
        .await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Reservation>, StoreError> {
        let table = self.table.lock().await;
        Ok(table.rows.iter().find(|r| r.id == id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Reservation>, StoreError> {
        let table = self.table.lock().await;
        let mut rows = table.rows.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn update_status(&self, id: i64, status: &str) -> Result<(), StoreError> {
        let mut table = self.table.lock().await;
        if let Some(row) = table.rows.iter_mut().find(|r| r.id == id) {
            row.status = status.to_string();
        }
        Ok(())
    }
}
