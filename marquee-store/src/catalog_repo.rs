use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_core::booking::SeatSelection;
use marquee_core::catalog::{BookingDetails, Show};
use marquee_core::repository::CatalogRepository;
use marquee_core::CoreResult;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::storage_error;

/// Read-only access to shows and their movie/theatre.
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ShowRow {
    show_id: i32,
    theatre_id: i32,
    movie_id: i32,
    show_time: DateTime<Utc>,
    total_seats: i32,
    price: Decimal,
}

#[derive(sqlx::FromRow)]
struct BookingDetailsRow {
    txn_id: String,
    amount: Decimal,
    status: String,
    seats: String,
    show_id: i32,
    movie: String,
    theatre: String,
    show_time: DateTime<Utc>,
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn find_show(&self, show_id: i32) -> CoreResult<Option<Show>> {
        let row = sqlx::query_as::<_, ShowRow>(
            "SELECT show_id, theatre_id, movie_id, show_time, total_seats, price FROM shows WHERE show_id = $1",
        )
        .bind(show_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(|row| Show {
            show_id: row.show_id,
            theatre_id: row.theatre_id,
            movie_id: row.movie_id,
            show_time: row.show_time,
            total_seats: row.total_seats,
            price: row.price,
        }))
    }

    async fn booking_details(&self, txn_id: &str) -> CoreResult<Option<BookingDetails>> {
        let row = sqlx::query_as::<_, BookingDetailsRow>(
            r#"
            SELECT
                bookings.txn_id,
                bookings.amount,
                bookings.status,
                bookings.seats,
                bookings.show_id,
                movies.movie_name AS movie,
                theatres.theatre_name AS theatre,
                shows.show_time
            FROM bookings
            JOIN shows ON bookings.show_id = shows.show_id
            JOIN movies ON shows.movie_id = movies.movie_id
            JOIN theatres ON shows.theatre_id = theatres.theatre_id
            WHERE bookings.txn_id = $1
            "#,
        )
        .bind(txn_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(|row| BookingDetails {
            txn_id: row.txn_id,
            amount: row.amount,
            status: row.status,
            seats: SeatSelection::from_column(&row.seats).into(),
            show_id: row.show_id,
            movie: row.movie,
            theatre: row.theatre,
            date: BookingDetails::format_date(&row.show_time),
            show_time: BookingDetails::format_start_time(&row.show_time),
        }))
    }
}
