use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use marquee_core::seat::ReserveSeat;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedSeatsResponse {
    pub booked_seats: Vec<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/seats/book", post(book_seat))
        .route("/seats/show/{id}", get(get_booked_seats))
}

/// POST /seats/book
async fn book_seat(
    State(state): State<AppState>,
    payload: Result<Json<ReserveSeat>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(request) = payload.map_err(|_| AppError::ValidationError("Invalid request payload".to_string()))?;

    state.seats.reserve(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Seat booked successfully" })),
    ))
}

/// GET /seats/show/{id}
async fn get_booked_seats(
    State(state): State<AppState>,
    Path(show_id): Path<String>,
) -> Result<Json<BookedSeatsResponse>, AppError> {
    let show_id: i32 = show_id
        .parse()
        .map_err(|_| AppError::ValidationError("Invalid show ID".to_string()))?;

    let booked_seats = state.seats.claimed_seats(show_id).await?;
    Ok(Json(BookedSeatsResponse { booked_seats }))
}
