//! In-memory implementations of the repository traits, used by tests and
//! local runs without Postgres.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use marquee_shared::Redacted;
use rust_decimal::Decimal;

use crate::booking::{Booking, BookingStatus, Transition};
use crate::catalog::{BookingDetails, Show};
use crate::identity::UserProfile;
use crate::repository::{BookingRepository, CatalogRepository, SeatLedger, UserDirectory};
use crate::seat::SeatClaim;
use crate::{CoreError, CoreResult};

#[derive(Default)]
struct Tables {
    claims: Vec<SeatClaim>,
    bookings: HashMap<String, Booking>,
    shows: HashMap<i32, CatalogEntry>,
    users: HashMap<i32, UserProfile>,
}

struct CatalogEntry {
    show: Show,
    movie: String,
    theatre: String,
}

/// All tables behind a single lock, so every check-and-write is atomic.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> CoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| CoreError::Storage("In-memory store lock poisoned".to_string()))
    }

    /// Catalog fixture: a show starting tomorrow at 250.00 per seat.
    pub fn add_show(&self, show_id: i32, movie: &str, theatre: &str, total_seats: i32) -> CoreResult<()> {
        let show = Show {
            show_id,
            theatre_id: show_id,
            movie_id: show_id,
            show_time: Utc::now() + Duration::days(1),
            total_seats,
            price: Decimal::new(25000, 2),
        };
        self.insert_show(show, movie, theatre)
    }

    pub fn insert_show(&self, show: Show, movie: &str, theatre: &str) -> CoreResult<()> {
        self.lock()?.shows.insert(
            show.show_id,
            CatalogEntry {
                show,
                movie: movie.to_string(),
                theatre: theatre.to_string(),
            },
        );
        Ok(())
    }

    pub fn add_user(&self, user_id: i32, name: &str, email: &str) -> CoreResult<()> {
        self.lock()?.users.insert(
            user_id,
            UserProfile {
                user_id,
                name: name.to_string(),
                email: Redacted::new(email.to_string()),
                is_admin: false,
            },
        );
        Ok(())
    }

    pub fn booking_count(&self) -> usize {
        self.lock().map(|tables| tables.bookings.len()).unwrap_or(0)
    }
}

#[async_trait]
impl SeatLedger for InMemoryStore {
    async fn reserve(&self, claim: &SeatClaim) -> CoreResult<SeatClaim> {
        let mut tables = self.lock()?;
        let taken = tables
            .claims
            .iter()
            .any(|c| c.show_id == claim.show_id && c.seat == claim.seat);
        if taken {
            return Err(CoreError::Conflict("Seat already booked".to_string()));
        }
        tables.claims.push(claim.clone());
        Ok(claim.clone())
    }

    async fn claimed_seats(&self, show_id: i32) -> CoreResult<Vec<String>> {
        let tables = self.lock()?;
        Ok(tables
            .claims
            .iter()
            .filter(|c| c.show_id == show_id)
            .map(|c| c.seat.clone())
            .collect())
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn insert_pending(&self, booking: &Booking) -> CoreResult<()> {
        let mut tables = self.lock()?;
        if tables.bookings.contains_key(&booking.txn_id) {
            return Err(CoreError::Conflict(format!("Duplicate transaction id {}", booking.txn_id)));
        }
        tables.bookings.insert(booking.txn_id.clone(), booking.clone());
        Ok(())
    }

    async fn find_booking(&self, txn_id: &str) -> CoreResult<Option<Booking>> {
        Ok(self.lock()?.bookings.get(txn_id).cloned())
    }

    async fn transition(&self, txn_id: &str, target: BookingStatus) -> CoreResult<Booking> {
        let mut tables = self.lock()?;
        let booking = tables
            .bookings
            .get_mut(txn_id)
            .ok_or_else(|| CoreError::NotFound("Booking not found".to_string()))?;

        if booking.status.check_transition(target)? == Transition::Apply {
            booking.status = target;
            booking.updated_at = Utc::now();
        }
        Ok(booking.clone())
    }
}

#[async_trait]
impl CatalogRepository for InMemoryStore {
    async fn find_show(&self, show_id: i32) -> CoreResult<Option<Show>> {
        Ok(self.lock()?.shows.get(&show_id).map(|entry| entry.show.clone()))
    }

    async fn booking_details(&self, txn_id: &str) -> CoreResult<Option<BookingDetails>> {
        let tables = self.lock()?;
        let Some(booking) = tables.bookings.get(txn_id) else {
            return Ok(None);
        };
        let Some(entry) = tables.shows.get(&booking.show_id) else {
            return Ok(None);
        };

        Ok(Some(BookingDetails {
            txn_id: booking.txn_id.clone(),
            amount: booking.amount,
            status: booking.status.to_string(),
            seats: booking.seats.labels().to_vec(),
            show_id: booking.show_id,
            movie: entry.movie.clone(),
            theatre: entry.theatre.clone(),
            date: BookingDetails::format_date(&entry.show.show_time),
            show_time: BookingDetails::format_start_time(&entry.show.show_time),
        }))
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn find_user(&self, user_id: i32) -> CoreResult<Option<UserProfile>> {
        Ok(self.lock()?.users.get(&user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_fixtures_are_visible_through_the_traits() {
        let store = InMemoryStore::new();
        store.add_show(3, "Dune", "Regal", 80).unwrap();
        store.add_user(9, "Ravi", "ravi@example.com").unwrap();

        assert_eq!(store.find_show(3).await.unwrap().map(|s| s.total_seats), Some(80));
        assert_eq!(store.find_user(9).await.unwrap().map(|u| u.name), Some("Ravi".to_string()));
    }

    #[test]
    fn test_fixtures_report_poisoned_lock() {
        let store = Arc::new(InMemoryStore::new());
        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.tables.lock();
            panic!("poisoning the store");
        })
        .join();

        assert!(matches!(store.add_show(1, "Dune", "Regal", 80), Err(CoreError::Storage(_))));
        assert!(matches!(store.add_user(1, "Ravi", "ravi@example.com"), Err(CoreError::Storage(_))));
    }
}
