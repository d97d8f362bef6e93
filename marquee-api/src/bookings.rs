use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use marquee_core::catalog::BookingDetails;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/booking/{txnid}", get(get_booking_details))
}

/// GET /api/booking/{txnid}
async fn get_booking_details(
    State(state): State<AppState>,
    Path(txn_id): Path<String>,
) -> Result<Json<BookingDetails>, AppError> {
    state
        .catalog
        .booking_details(&txn_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError("Booking not found".to_string()))
}
