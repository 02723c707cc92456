//! Authentication API handlers.
//!
//! Managers register and log in here; both return a bearer token for the
//! protected game endpoints.
//!
//! # Examples
//!
//! Register a new manager:
//! ```bash
//! curl -X POST http://localhost:8080/api/auth/register \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "office_pool", "password": "Pass1234!", "displayName": "Office Pool"}'
//! ```
//!
//! Login:
//! ```bash
//! curl -X POST http://localhost:8080/api/auth/login \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "office_pool", "password": "Pass1234!"}'
//! ```

use axum::{Json, extract::State, http::StatusCode};
use last_man_standing::auth::{AuthError, LoginRequest, RegisterRequest, UserId};
use serde::{Deserialize, Serialize};

use super::AppState;
use super::error::{ApiError, ApiJson};
use crate::{logging, metrics};

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    pub username: String,
    pub password: String,
    /// Defaults to the username
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub user_id: UserId,
    pub username: String,
    pub display_name: String,
    pub is_admin: bool,
}

/// Register a new manager account and log them in.
///
/// # Errors
///
/// - `400 Bad Request`: Invalid username, weak password, or malformed body
/// - `409 Conflict`: Username already taken
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterPayload>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let display_name = payload
        .display_name
        .unwrap_or_else(|| payload.username.clone());

    let user = state
        .auth_manager
        .register(RegisterRequest {
            username: payload.username.clone(),
            password: payload.password.clone(),
            display_name,
        })
        .await?;

    let access_token = state
        .auth_manager
        .generate_access_token(user.id, &user.username, user.is_admin)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            access_token,
            user_id: user.id,
            username: user.username,
            display_name: user.display_name,
            is_admin: user.is_admin,
        }),
    ))
}

/// Authenticate a manager and issue an access token.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginPayload>,
) -> Result<Json<AuthResponse>, ApiError> {
    let username = payload.username.clone();
    let result = state
        .auth_manager
        .login(LoginRequest {
            username: payload.username,
            password: payload.password,
        })
        .await;

    metrics::login_attempts_total(result.is_ok());

    match result {
        Ok((user, access_token)) => Ok(Json(AuthResponse {
            access_token,
            user_id: user.id,
            username: user.username,
            display_name: user.display_name,
            is_admin: user.is_admin,
        })),
        Err(AuthError::InvalidCredentials) => {
            logging::log_security_event(
                "failed_login",
                None,
                &format!("Invalid credentials for {}", username),
            );
            Err(AuthError::InvalidCredentials.into())
        }
        Err(e) => Err(e.into()),
    }
}
