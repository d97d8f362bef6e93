use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;

/// Postgres pool shared by the seat ledger, booking, catalog and user repositories.
#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        info!("Connected to Postgres (pool size {})", max_connections);
        Ok(Self { pool })
    }

    /// Apply the booking schema (users, catalog, seat_bookings, bookings).
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        let migrator = sqlx::migrate!("../migrations");
        info!("Applying {} booking schema migration(s)", migrator.iter().count());
        migrator.run(&self.pool).await?;
        info!("Booking schema is up to date");
        Ok(())
    }
}
