use async_trait::async_trait;

use crate::booking::{Booking, BookingStatus};
use crate::catalog::{BookingDetails, Show};
use crate::identity::UserProfile;
use crate::seat::SeatClaim;
use crate::CoreResult;

/// Storage for seat claims. At most one claim per `(show_id, seat)`.
#[async_trait]
pub trait SeatLedger: Send + Sync {
    /// Insert the claim, or fail with `CoreError::Conflict` if the seat is taken.
    /// Check and insert must be a single atomic step.
    async fn reserve(&self, claim: &SeatClaim) -> CoreResult<SeatClaim>;

    /// Claimed seat labels for a show, in claim order.
    async fn claimed_seats(&self, show_id: i32) -> CoreResult<Vec<String>>;
}

/// Storage for booking records, keyed by transaction id.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Insert a pending booking. A duplicate transaction id is `CoreError::Conflict`.
    async fn insert_pending(&self, booking: &Booking) -> CoreResult<()>;

    async fn find_booking(&self, txn_id: &str) -> CoreResult<Option<Booking>>;

    /// Move a booking out of `pending`, conditionally on it still being pending.
    /// Follows [`BookingStatus::check_transition`] when it is not.
    async fn transition(&self, txn_id: &str, target: BookingStatus) -> CoreResult<Booking>;
}

/// Read-only view of the show catalog.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn find_show(&self, show_id: i32) -> CoreResult<Option<Show>>;

    async fn booking_details(&self, txn_id: &str) -> CoreResult<Option<BookingDetails>>;
}

/// Lookup of registered users by id.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, user_id: i32) -> CoreResult<Option<UserProfile>>;
}
