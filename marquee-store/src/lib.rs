pub mod app_config;
pub mod booking_repo;
pub mod catalog_repo;
pub mod database;
pub mod seat_repo;
pub mod user_repo;

pub use booking_repo::PgBookingRepository;
pub use catalog_repo::PgCatalogRepository;
pub use database::DbClient;
pub use seat_repo::PgSeatLedger;
pub use user_repo::PgUserDirectory;

use marquee_core::CoreError;
use tracing::error;

/// Map a driver error into the core taxonomy. Details stay in the log.
pub(crate) fn storage_error(err: sqlx::Error) -> CoreError {
    error!("Database error: {}", err);
    CoreError::Storage(err.to_string())
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_foreign_key_violation())
        .unwrap_or(false)
}
