use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_core::booking::{Booking, BookingStatus, SeatSelection, Transition};
use marquee_core::repository::BookingRepository;
use marquee_core::{CoreError, CoreResult};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::warn;

use crate::{is_foreign_key_violation, is_unique_violation, storage_error};

const BOOKING_COLUMNS: &str = "txn_id, user_id, show_id, amount, seats, status, created_at, updated_at";

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    txn_id: String,
    user_id: i32,
    show_id: i32,
    amount: Decimal,
    seats: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = CoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            txn_id: row.txn_id,
            user_id: row.user_id,
            show_id: row.show_id,
            amount: row.amount,
            seats: SeatSelection::from_column(&row.seats),
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn insert_pending(&self, booking: &Booking) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings (txn_id, user_id, show_id, amount, seats, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&booking.txn_id)
        .bind(booking.user_id)
        .bind(booking.show_id)
        .bind(booking.amount)
        .bind(booking.seats.to_column())
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CoreError::Conflict(format!("Duplicate transaction id {}", booking.txn_id))
            } else if is_foreign_key_violation(&e) {
                CoreError::NotFound("Show or user not found".to_string())
            } else {
                storage_error(e)
            }
        })?;

        Ok(())
    }

    async fn find_booking(&self, txn_id: &str) -> CoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE txn_id = $1",
            BOOKING_COLUMNS
        ))
        .bind(txn_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.map(Booking::try_from).transpose()
    }

    async fn transition(&self, txn_id: &str, target: BookingStatus) -> CoreResult<Booking> {
        if !target.is_terminal() {
            return Err(CoreError::InvalidRequest(
                "Bookings cannot be moved back to pending".to_string(),
            ));
        }

        // Conditional on still being pending: of two racing callbacks only one updates.
        let updated = sqlx::query_as::<_, BookingRow>(&format!(
            "UPDATE bookings SET status = $1, updated_at = NOW() \
             WHERE txn_id = $2 AND status = 'pending' RETURNING {}",
            BOOKING_COLUMNS
        ))
        .bind(target.as_str())
        .bind(txn_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        if let Some(row) = updated {
            return Booking::try_from(row);
        }

        let current = self
            .find_booking(txn_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Booking not found".to_string()))?;

        match current.status.check_transition(target)? {
            Transition::NoOp => Ok(current),
            Transition::Apply => {
                // Pending on re-read but the guarded update matched nothing.
                warn!("Booking {} changed while transitioning to {}", txn_id, target);
                Err(CoreError::Conflict(format!("Booking {} changed concurrently", txn_id)))
            }
        }
    }
}
