use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A screening, as read from the catalog. The booking core never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Show {
    pub show_id: i32,
    pub theatre_id: i32,
    pub movie_id: i32,
    pub show_time: DateTime<Utc>,
    pub total_seats: i32,
    pub price: Decimal,
}

/// Booking joined with its show, movie and theatre.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingDetails {
    pub txn_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub status: String,
    pub seats: Vec<String>,
    pub show_id: i32,
    pub movie: String,
    pub theatre: String,
    /// Show date, `YYYY-MM-DD`
    pub date: String,
    /// Show start time, `HH:MM`
    pub show_time: String,
}

impl BookingDetails {
    pub fn format_date(show_time: &DateTime<Utc>) -> String {
        show_time.format("%Y-%m-%d").to_string()
    }

    pub fn format_start_time(show_time: &DateTime<Utc>) -> String {
        show_time.format("%H:%M").to_string()
    }
}
