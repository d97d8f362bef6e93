use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::repository::BookingRepository;
use crate::seat::MAX_SEAT_LABEL_LEN;
use crate::{CoreError, CoreResult};

/// Prefix of every generated transaction id.
pub const TXN_PREFIX: &str = "TXN";
/// Random characters after the prefix. Keeps ids within the gateway's 25 char limit.
pub const TXN_RANDOM_LEN: usize = 20;
/// Upper-case alphanumerics without the look-alikes 0/O and 1/I.
const TXN_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";
const MAX_TXN_ID_ATTEMPTS: usize = 3;

/// Booking lifecycle. `Success` and `Failed` are absorbing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Success,
    Failed,
}

/// What a requested status change amounts to, given the current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Apply,
    NoOp,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Success => "success",
            BookingStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, BookingStatus::Pending)
    }

    /// Transitions are only legal out of `Pending`. Re-applying the current
    /// terminal status is a no-op; switching terminal status is a conflict.
    pub fn check_transition(self, target: BookingStatus) -> CoreResult<Transition> {
        if !target.is_terminal() {
            return Err(CoreError::InvalidRequest(
                "Bookings cannot be moved back to pending".to_string(),
            ));
        }
        match self {
            BookingStatus::Pending => Ok(Transition::Apply),
            current if current == target => Ok(Transition::NoOp),
            current => Err(CoreError::Conflict(format!(
                "Booking already {}, refusing to mark it {}",
                current, target
            ))),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "success" => Ok(BookingStatus::Success),
            "failed" => Ok(BookingStatus::Failed),
            other => Err(CoreError::Storage(format!("Unknown booking status: {}", other))),
        }
    }
}

/// Largest amount `bookings.amount` (NUMERIC(10,2)) can hold.
pub fn max_amount() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Ordered, de-duplicated seat labels. Persisted as a comma-joined string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(into = "Vec<String>")]
pub struct SeatSelection(Vec<String>);

impl SeatSelection {
    pub fn new<I, S>(labels: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seats: Vec<String> = Vec::new();
        for label in labels {
            let label = label.as_ref().trim();
            if label.is_empty() {
                continue;
            }
            if label.contains(',') || label.chars().count() > MAX_SEAT_LABEL_LEN {
                return Err(CoreError::InvalidRequest(format!("Invalid seat label: {}", label)));
            }
            if !seats.iter().any(|s| s == label) {
                seats.push(label.to_string());
            }
        }
        Ok(Self(seats))
    }

    /// Parse the stored column form. Empty input yields an empty selection.
    pub fn from_column(joined: &str) -> Self {
        let seats = joined
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        Self(seats)
    }

    pub fn to_column(&self) -> String {
        self.0.join(",")
    }

    pub fn labels(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<SeatSelection> for Vec<String> {
    fn from(selection: SeatSelection) -> Self {
        selection.0
    }
}

/// Seats as sent by clients: either `"A1,A2"` or `["A1", "A2"]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SeatsInput {
    Joined(String),
    List(Vec<String>),
}

impl Default for SeatsInput {
    fn default() -> Self {
        SeatsInput::List(Vec::new())
    }
}

impl SeatsInput {
    pub fn into_selection(self) -> CoreResult<SeatSelection> {
        match self {
            SeatsInput::Joined(joined) => SeatSelection::new(joined.split(',')),
            SeatsInput::List(list) => SeatSelection::new(list),
        }
    }
}

/// One checkout attempt, keyed by its transaction id.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Booking {
    pub txn_id: String,
    pub user_id: i32,
    pub show_id: i32,
    pub amount: Decimal,
    pub seats: SeatSelection,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a pending booking.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: i32,
    pub show_id: i32,
    pub amount: Decimal,
    pub seats: SeatSelection,
}

impl NewBooking {
    pub fn new(user_id: i32, show_id: i32, amount: Decimal, seats: SeatSelection) -> CoreResult<Self> {
        if user_id <= 0 {
            return Err(CoreError::InvalidRequest("User ID is required".to_string()));
        }
        if show_id <= 0 {
            return Err(CoreError::InvalidRequest("Show ID is required".to_string()));
        }
        let amount = amount.round_dp(2);
        if amount <= Decimal::ZERO {
            return Err(CoreError::InvalidRequest("Amount must be positive".to_string()));
        }
        if amount > max_amount() {
            return Err(CoreError::InvalidRequest(format!(
                "Amount must not exceed {}",
                max_amount()
            )));
        }
        if seats.is_empty() {
            return Err(CoreError::InvalidRequest("At least one seat is required".to_string()));
        }
        Ok(Self {
            user_id,
            show_id,
            amount,
            seats,
        })
    }

    fn into_pending(self, txn_id: String) -> Booking {
        let now = Utc::now();
        Booking {
            txn_id,
            user_id: self.user_id,
            show_id: self.show_id,
            amount: self.amount,
            seats: self.seats,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Draw a transaction id from the OS CSPRNG.
pub fn generate_transaction_id() -> String {
    let mut rng = OsRng;
    let suffix: String = (0..TXN_RANDOM_LEN)
        .map(|_| TXN_ALPHABET[rng.gen_range(0..TXN_ALPHABET.len())] as char)
        .collect();
    format!("{}{}", TXN_PREFIX, suffix)
}

/// Booking lifecycle on top of a [`BookingRepository`].
#[derive(Clone)]
pub struct BookingRecords {
    repo: Arc<dyn BookingRepository>,
}

impl BookingRecords {
    pub fn new(repo: Arc<dyn BookingRepository>) -> Self {
        Self { repo }
    }

    /// Persist a pending booking under a fresh transaction id. A collision
    /// with an existing id surfaces from the store as `Conflict` and is retried.
    pub async fn create_pending(&self, new: NewBooking) -> CoreResult<Booking> {
        for attempt in 1..=MAX_TXN_ID_ATTEMPTS {
            let booking = new.clone().into_pending(generate_transaction_id());
            match self.repo.insert_pending(&booking).await {
                Ok(()) => {
                    info!(
                        "Booking {} created for user {} on show {} ({} seats)",
                        booking.txn_id,
                        booking.user_id,
                        booking.show_id,
                        booking.seats.len()
                    );
                    return Ok(booking);
                }
                Err(CoreError::Conflict(_)) => {
                    warn!("Transaction id collision on attempt {}, regenerating", attempt);
                }
                Err(e) => return Err(e),
            }
        }
        Err(CoreError::Storage("Could not allocate a unique transaction id".to_string()))
    }

    pub async fn transition(&self, txn_id: &str, target: BookingStatus) -> CoreResult<Booking> {
        let booking = self.repo.transition(txn_id, target).await?;
        info!("Booking {} is now {}", booking.txn_id, booking.status);
        Ok(booking)
    }

    pub async fn find(&self, txn_id: &str) -> CoreResult<Option<Booking>> {
        self.repo.find_booking(txn_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    fn new_booking() -> NewBooking {
        let seats = SeatSelection::new(["A1", "A2"]).unwrap();
        NewBooking::new(5, 1, dec!(250), seats).unwrap()
    }

    #[test]
    fn test_transition_rules() {
        use BookingStatus::*;

        assert_eq!(Pending.check_transition(Success).unwrap(), Transition::Apply);
        assert_eq!(Pending.check_transition(Failed).unwrap(), Transition::Apply);
        assert_eq!(Success.check_transition(Success).unwrap(), Transition::NoOp);
        assert_eq!(Failed.check_transition(Failed).unwrap(), Transition::NoOp);
        assert!(matches!(Success.check_transition(Failed), Err(CoreError::Conflict(_))));
        assert!(matches!(Failed.check_transition(Success), Err(CoreError::Conflict(_))));
        assert!(matches!(Pending.check_transition(Pending), Err(CoreError::InvalidRequest(_))));
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [BookingStatus::Pending, BookingStatus::Success, BookingStatus::Failed] {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
        assert!("paid".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn test_seat_selection_normalizes() {
        let seats = SeatsInput::Joined(" A1, A2,,A1 ".to_string()).into_selection().unwrap();
        assert_eq!(seats.labels(), &["A1".to_string(), "A2".to_string()]);
        assert_eq!(seats.to_column(), "A1,A2");
        assert_eq!(SeatSelection::from_column(""), SeatSelection::default());

        let bad = SeatsInput::List(vec!["A1,A2".to_string()]).into_selection();
        assert!(matches!(bad, Err(CoreError::InvalidRequest(_))));
    }

    #[test]
    fn test_new_booking_validation() {
        let seats = SeatSelection::new(["A1"]).unwrap();
        assert!(NewBooking::new(0, 1, dec!(10), seats.clone()).is_err());
        assert!(NewBooking::new(1, 0, dec!(10), seats.clone()).is_err());
        assert!(NewBooking::new(1, 1, dec!(0), seats.clone()).is_err());
        assert!(NewBooking::new(1, 1, dec!(10), SeatSelection::default()).is_err());

        let booking = NewBooking::new(1, 1, dec!(10.005), seats.clone()).unwrap();
        assert_eq!(booking.amount.to_string(), "10.00");

        // Rounds to zero
        assert!(NewBooking::new(1, 1, dec!(0.004), seats.clone()).is_err());
    }

    #[test]
    fn test_new_booking_amount_ceiling() {
        let seats = SeatSelection::new(["A1"]).unwrap();
        let at_limit = NewBooking::new(1, 1, dec!(99999999.99), seats.clone()).unwrap();
        assert_eq!(at_limit.amount, max_amount());

        let over = NewBooking::new(1, 1, dec!(100000000), seats);
        assert!(matches!(over, Err(CoreError::InvalidRequest(_))));
    }

    #[test]
    fn test_seat_selection_rejects_overlong_label() {
        let long = SeatSelection::new(["A1", "BALCONY-ROW-A-SEAT-12"]);
        assert!(matches!(long, Err(CoreError::InvalidRequest(_))));
        assert_eq!(SeatSelection::new(["A".repeat(16)]).unwrap().len(), 1);
    }

    #[test]
    fn test_transaction_ids_are_well_formed_and_distinct() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_transaction_id()).collect();
        assert_eq!(ids.len(), 1000);
        for id in &ids {
            assert!(id.starts_with(TXN_PREFIX));
            assert_eq!(id.len(), TXN_PREFIX.len() + TXN_RANDOM_LEN);
            assert!(id[TXN_PREFIX.len()..].bytes().all(|b| TXN_ALPHABET.contains(&b)));
        }
    }

    #[tokio::test]
    async fn test_booking_lifecycle() {
        let store = Arc::new(InMemoryStore::new());
        let records = BookingRecords::new(store.clone());

        let booking = records.create_pending(new_booking()).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);

        let done = records.transition(&booking.txn_id, BookingStatus::Success).await.unwrap();
        assert_eq!(done.status, BookingStatus::Success);

        // Same terminal status again: no-op
        let again = records.transition(&booking.txn_id, BookingStatus::Success).await.unwrap();
        assert_eq!(again.status, BookingStatus::Success);
        assert_eq!(again.updated_at, done.updated_at);

        // Different terminal status: conflict, stored status unchanged
        let flip = records.transition(&booking.txn_id, BookingStatus::Failed).await;
        assert!(matches!(flip, Err(CoreError::Conflict(_))));
        let stored = records.find(&booking.txn_id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Success);
    }

    #[tokio::test]
    async fn test_transition_unknown_booking() {
        let store = Arc::new(InMemoryStore::new());
        let records = BookingRecords::new(store);
        let result = records.transition("TXNMISSING", BookingStatus::Failed).await;
        assert!(matches!(result, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_racing_transitions_have_one_winner() {
        let store = Arc::new(InMemoryStore::new());
        let records = BookingRecords::new(store);
        let booking = records.create_pending(new_booking()).await.unwrap();

        let a = {
            let records = records.clone();
            let txn = booking.txn_id.clone();
            tokio::spawn(async move { records.transition(&txn, BookingStatus::Success).await })
        };
        let b = {
            let records = records.clone();
            let txn = booking.txn_id.clone();
            tokio::spawn(async move { records.transition(&txn, BookingStatus::Failed).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1);
    }
}
