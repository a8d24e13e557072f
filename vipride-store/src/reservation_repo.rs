use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use vipride_core::retry::{retry_with_backoff, RetryPolicy};
use vipride_core::{NewReservation, Reservation, ReservationRepository, ServiceType, StoreError};
use vipride_shared::Masked;

use crate::database::DbClient;

const SELECT_COLUMNS: &str = "SELECT id, customer_name, customer_email, customer_phone, pickup_location, \
     dropoff_location, pickup_date, pickup_time, vehicle_type, service_type, passengers, \
     special_requests, status, created_at FROM reservations";

pub struct MySqlReservationRepository {
    db: Arc<DbClient>,
    retry: RetryPolicy,
}

impl MySqlReservationRepository {
    pub fn new(db: Arc<DbClient>) -> Self {
        Self { db, retry: RetryPolicy::reservation_writes() }
    }

    async fn insert_once(&self, r: &NewReservation) -> Result<i64, StoreError> {
        let current = self.db.pool().await;

        let result = sqlx::query(
            r#"
            INSERT INTO reservations (customer_name, customer_email, customer_phone, pickup_location, dropoff_location,
                                      pickup_date, pickup_time, vehicle_type, service_type, passengers, special_requests, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&r.customer_name)
        .bind(&r.customer_email)
        .bind(&r.customer_phone)
        .bind(&r.pickup_location)
        .bind(&r.dropoff_location)
        .bind(&r.pickup_date)
        .bind(&r.pickup_time)
        .bind(&r.vehicle_type)
        .bind(r.service_type.as_str())
        .bind(r.passengers)
        .bind(&r.special_requests)
        .bind(&r.status)
        .execute(&current.pool)
        .await
        .map_err(|e| self.db.observe(current.generation, &e))?;

        i64::try_from(result.last_insert_id())
            .map_err(|_| StoreError::Query(format!("insert id {} out of range", result.last_insert_id())))
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: i64,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    pickup_location: String,
    dropoff_location: String,
    pickup_date: String,
    pickup_time: String,
    vehicle_type: String,
    service_type: String,
    passengers: i32,
    special_requests: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<ReservationRow> for Reservation {
    fn from(row: ReservationRow) -> Self {
        let service_type = row.service_type.parse::<ServiceType>().unwrap_or_else(|_| {
            warn!(reservation_id = row.id, service_type = %row.service_type, "Unknown service type in row, reading as TRANSFER");
            ServiceType::Transfer
        });

        Reservation {
            id: row.id,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            customer_phone: row.customer_phone,
            pickup_location: row.pickup_location,
            dropoff_location: row.dropoff_location,
            pickup_date: row.pickup_date,
            pickup_time: row.pickup_time,
            vehicle_type: row.vehicle_type,
            service_type,
            passengers: row.passengers,
            special_requests: row.special_requests.unwrap_or_default(),
            status: row.status,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ReservationRepository for MySqlReservationRepository {
    async fn create(&self, reservation: &NewReservation) -> Result<i64, StoreError> {
        info!(
            customer_email = ?Masked(&reservation.customer_email),
            service_type = %reservation.service_type,
            "Creating reservation"
        );

        let id = retry_with_backoff(
            &self.retry,
            "reservation.create",
            || self.insert_once(reservation),
            StoreError::is_retryable,
        )
        .await?;

        info!(reservation_id = id, "Reservation created");
        Ok(id)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Reservation>, StoreError> {
        let current = self.db.pool().await;
        let row = sqlx::query_as::<_, ReservationRow>(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&current.pool)
            .await
            .map_err(|e| self.db.observe(current.generation, &e))?;

        Ok(row.map(Reservation::from))
    }

    async fn find_all(&self) -> Result<Vec<Reservation>, StoreError> {
        let current = self.db.pool().await;
        let rows = sqlx::query_as::<_, ReservationRow>(&format!(
            "{} ORDER BY created_at DESC, id DESC",
            SELECT_COLUMNS
        ))
        .fetch_all(&current.pool)
        .await
        .map_err(|e| self.db.observe(current.generation, &e))?;

        Ok(rows.into_iter().map(Reservation::from).collect())
    }

    async fn update_status(&self, id: i64, status: &str) -> Result<(), StoreError> {
        let current = self.db.pool().await;
        let result = sqlx::query("UPDATE reservations SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&current.pool)
            .await
            .map_err(|e| self.db.observe(current.generation, &e))?;

        if result.rows_affected() == 0 {
            info!(reservation_id = id, "Status update matched no reservation");
        } else {
            info!(reservation_id = id, status, "Reservation status updated");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(service_type: &str, special_requests: Option<&str>) -> ReservationRow {
        ReservationRow {
            id: 12,
            customer_name: "Ayse Yilmaz".into(),
            customer_email: "guest@example.com".into(),
            customer_phone: "+905551234567".into(),
            pickup_location: "Istanbul Airport".into(),
            dropoff_location: "Taksim".into(),
            pickup_date: "2026-11-02".into(),
            pickup_time: "14:30".into(),
            vehicle_type: "Mercedes Vito".into(),
            service_type: service_type.into(),
            passengers: 3,
            special_requests: special_requests.map(String::from),
            status: "CONFIRMED".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_conversion() {
        let reservation = Reservation::from(row("CHAUFFEUR", Some("Water")));
        assert_eq!(reservation.id, 12);
        assert_eq!(reservation.service_type, ServiceType::Chauffeur);
        assert_eq!(reservation.special_requests, "Water");
        assert_eq!(reservation.passengers, 3);
    }

    #[test]
    fn test_row_conversion_tolerates_legacy_values() {
        let reservation = Reservation::from(row("shuttle", None));
        assert_eq!(reservation.service_type, ServiceType::Transfer);
        assert_eq!(reservation.special_requests, "");
    }

    #[test]
    fn test_status_column_fits_free_text_statuses() {
        let ddl = include_str!("../../migrations/20241101000000_create_reservations.sql");
        let status = ddl.lines().find(|l| l.trim_start().starts_with("status ")).unwrap();
        assert!(status.contains("VARCHAR(255)"), "{}", status);
    }
}
