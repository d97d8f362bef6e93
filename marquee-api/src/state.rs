use std::sync::Arc;

use marquee_core::booking::BookingRecords;
use marquee_core::payment::{GatewayConfig, PaymentBridge};
use marquee_core::repository::{BookingRepository, CatalogRepository, SeatLedger, UserDirectory};
use marquee_core::seat::SeatReservations;
use marquee_shared::Redacted;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: Redacted<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub seats: SeatReservations,
    pub payments: PaymentBridge,
    pub catalog: Arc<dyn CatalogRepository>,
    pub users: Arc<dyn UserDirectory>,
    pub auth: AuthConfig,
    pub allowed_origins: Vec<String>,
}

impl AppState {
    pub fn new(
        ledger: Arc<dyn SeatLedger>,
        bookings: Arc<dyn BookingRepository>,
        catalog: Arc<dyn CatalogRepository>,
        users: Arc<dyn UserDirectory>,
        gateway: GatewayConfig,
        auth: AuthConfig,
    ) -> Self {
        Self {
            seats: SeatReservations::new(ledger, catalog.clone()),
            payments: PaymentBridge::new(gateway, BookingRecords::new(bookings), catalog.clone()),
            catalog,
            users,
            auth,
            allowed_origins: Vec::new(),
        }
    }

    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }
}
