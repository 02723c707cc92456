//! Authentication middleware for protected endpoints.
//!
//! Extracts and validates the JWT access token from the `Authorization`
//! header, then injects the authenticated [`Caller`] into request extensions
//! for downstream handlers.
//!
//! # Extracting the caller
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use last_man_standing::auth::Caller;
//!
//! async fn protected_handler(Extension(caller): Extension<Caller>) -> String {
//!     format!("Authenticated as {}", caller.username)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use last_man_standing::auth::Caller;

use super::AppState;
use super::error::ApiError;

/// Authentication middleware that validates JWT tokens and injects the caller.
///
/// - **Success**: Token valid, injects `Caller` and calls the next handler
/// - **Missing header / invalid format / invalid or expired token**: `401 Unauthorized`
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

    let claims = state
        .auth_manager
        .verify_access_token(token)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

    request.extensions_mut().insert(Caller::from(claims));
    Ok(next.run(request).await)
}
