use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::repository::{CatalogRepository, SeatLedger};
use crate::{CoreError, CoreResult};

/// Longest seat label the ledger stores (`seat_bookings.seat`).
pub const MAX_SEAT_LABEL_LEN: usize = 16;

/// One user's exclusive hold of one seat on one show.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatClaim {
    pub show_id: i32,
    pub seat: String,
    pub user_id: i32,
}

/// Raw reservation request as it arrives over the wire.
///
/// Missing fields deserialize to their zero value so that validation, not the
/// JSON extractor, decides what a bad request looks like.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReserveSeat {
    #[serde(default)]
    pub show_id: i32,
    #[serde(default)]
    pub seat: String,
    #[serde(default)]
    pub user_id: i32,
}

impl ReserveSeat {
    pub fn validate(self) -> CoreResult<SeatClaim> {
        let seat = self.seat.trim().to_string();
        if seat.is_empty() || self.show_id <= 0 || self.user_id <= 0 {
            return Err(CoreError::InvalidRequest(
                "Seat, ShowID, and UserID are required".to_string(),
            ));
        }
        if seat.chars().count() > MAX_SEAT_LABEL_LEN {
            return Err(CoreError::InvalidRequest(format!(
                "Seat label must be at most {} characters",
                MAX_SEAT_LABEL_LEN
            )));
        }
        Ok(SeatClaim {
            show_id: self.show_id,
            seat,
            user_id: self.user_id,
        })
    }
}

/// First-writer-wins seat reservations on top of a [`SeatLedger`].
#[derive(Clone)]
pub struct SeatReservations {
    ledger: Arc<dyn SeatLedger>,
    catalog: Arc<dyn CatalogRepository>,
}

impl SeatReservations {
    pub fn new(ledger: Arc<dyn SeatLedger>, catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { ledger, catalog }
    }

    /// Claim a seat for a user. The ledger's conditional insert is the only
    /// arbiter; there is no separate "is it free?" read.
    pub async fn reserve(&self, request: ReserveSeat) -> CoreResult<SeatClaim> {
        let claim = request.validate()?;

        if self.catalog.find_show(claim.show_id).await?.is_none() {
            return Err(CoreError::NotFound(format!("Show {} not found", claim.show_id)));
        }

        match self.ledger.reserve(&claim).await {
            Ok(claim) => {
                info!("Seat {} on show {} claimed by user {}", claim.seat, claim.show_id, claim.user_id);
                Ok(claim)
            }
            Err(CoreError::Conflict(msg)) => {
                warn!("Seat {} on show {} already claimed", claim.seat, claim.show_id);
                Err(CoreError::Conflict(msg))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn claimed_seats(&self, show_id: i32) -> CoreResult<Vec<String>> {
        self.ledger.claimed_seats(show_id).await
    }
}
