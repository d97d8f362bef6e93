use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use jsonwebtoken::{decode, DecodingKey, Validation};
use marquee_core::identity::SessionClaims;

use crate::error::AppError;
use crate::state::AppState;

/// Cookie carrying the session token; the `Authorization` header is the fallback.
pub const SESSION_COOKIE: &str = "token";

// ============================================================================
// Session Authentication Middleware
// ============================================================================

pub async fn session_auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 1. Cookie first, then bearer header
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| {
            req.headers()
                .get(AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(str::to_string)
        })
        .ok_or_else(|| AppError::AuthenticationError("Unauthorized".to_string()))?;

    // 2. Verify signature and expiry
    let token_data = decode::<SessionClaims>(
        &token,
        &DecodingKey::from_secret(state.auth.secret.expose().as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthenticationError("Invalid token".to_string()))?;

    // 3. The user must still exist
    let user = state
        .users
        .find_user(token_data.claims.user_id)
        .await?
        .ok_or_else(|| AppError::AuthenticationError("User not found".to_string()))?;

    // 4. Hand the profile to the handler
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
