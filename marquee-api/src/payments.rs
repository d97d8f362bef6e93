use axum::{
    extract::{rejection::FormRejection, rejection::JsonRejection, Extension, Form, State},
    http::{header, StatusCode},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::post,
    Json, Router,
};
use marquee_core::identity::UserProfile;
use marquee_core::payment::{CallbackPayload, InitiatePayment};
use tracing::info;

use crate::error::AppError;
use crate::middleware::session_auth_middleware;
use crate::state::AppState;

/// Gateway callbacks are public; initiation needs a session.
pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/payment/initiate", post(initiate_payment))
        .route_layer(middleware::from_fn_with_state(state, session_auth_middleware));

    Router::new()
        .route("/api/payment/success", post(payment_success))
        .route("/api/payment/failure", post(payment_failure))
        .merge(protected)
}

/// POST /api/payment/initiate
/// Creates a pending booking and answers with a self-submitting gateway form.
async fn initiate_payment(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    payload: Result<Json<InitiatePayment>, JsonRejection>,
) -> Result<Html<String>, AppError> {
    let Json(request) = payload.map_err(|_| AppError::ValidationError("Invalid request format".to_string()))?;

    let (_booking, redirect) = state.payments.initiate(&user, request).await?;
    Ok(Html(redirect.render_form()))
}

/// POST /api/payment/success
async fn payment_success(
    State(state): State<AppState>,
    payload: Result<Form<CallbackPayload>, FormRejection>,
) -> Result<Response, AppError> {
    let Form(payload) = payload.map_err(|_| AppError::ValidationError("Invalid form data".to_string()))?;
    info!("Payment success callback for {} (status {})", payload.txnid, payload.status);

    let booking = state.payments.handle_success_callback(&payload).await?;
    let location = state.payments.config().frontend_success_url(&booking.txn_id);
    Ok(found(location))
}

/// POST /api/payment/failure
async fn payment_failure(
    State(state): State<AppState>,
    payload: Result<Form<CallbackPayload>, FormRejection>,
) -> Result<Response, AppError> {
    let Form(payload) = payload.map_err(|_| AppError::ValidationError("Invalid form data".to_string()))?;
    info!("Payment failure callback for {} (status {})", payload.txnid, payload.status);

    state.payments.handle_failure_callback(&payload).await?;
    Ok(found(state.payments.config().frontend_failure_url()))
}

/// 302 Found; `Redirect::to` would answer 303.
fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}
