use async_trait::async_trait;
use marquee_core::repository::SeatLedger;
use marquee_core::seat::SeatClaim;
use marquee_core::{CoreError, CoreResult};
use sqlx::PgPool;

use crate::{is_foreign_key_violation, storage_error};

/// Seat claims in `seat_bookings`, guarded by `UNIQUE (show_id, seat)`.
pub struct PgSeatLedger {
    pool: PgPool,
}

impl PgSeatLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SeatClaimRow {
    show_id: i32,
    seat: String,
    user_id: i32,
}

#[async_trait]
impl SeatLedger for PgSeatLedger {
    async fn reserve(&self, claim: &SeatClaim) -> CoreResult<SeatClaim> {
        // The unique constraint decides; an empty RETURNING means someone got there first.
        let row = sqlx::query_as::<_, SeatClaimRow>(
            r#"
            INSERT INTO seat_bookings (show_id, seat, user_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (show_id, seat) DO NOTHING
            RETURNING show_id, seat, user_id
            "#,
        )
        .bind(claim.show_id)
        .bind(&claim.seat)
        .bind(claim.user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                CoreError::NotFound("Show or user not found".to_string())
            } else {
                storage_error(e)
            }
        })?;

        match row {
            Some(row) => Ok(SeatClaim {
                show_id: row.show_id,
                seat: row.seat,
                user_id: row.user_id,
            }),
            None => Err(CoreError::Conflict("Seat already booked".to_string())),
        }
    }

    async fn claimed_seats(&self, show_id: i32) -> CoreResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT seat FROM seat_bookings WHERE show_id = $1 ORDER BY seat_booking_id",
        )
        .bind(show_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)
    }
}
