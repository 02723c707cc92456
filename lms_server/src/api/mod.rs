//! HTTP API for managed last-man-standing games.
//!
//! # Modules
//!
//! - [`auth`]: Manager registration and login
//! - [`games`]: Game setup, queries and advancement
//! - [`rounds`]: Picks, results and round reopening
//! - [`reports`]: Public per-round report
//! - [`middleware`]: Bearer token authentication for protected endpoints
//! - [`request_id`]: `x-request-id` propagation, request logging and metrics
//! - [`error`]: JSON error responses
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use lms_server::api::{create_router, AppState};
//! # async fn example(state: AppState) -> Result<(), Box<dyn std::error::Error>> {
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively. In production, configure appropriate
//! origins, methods, and headers.

pub mod auth;
pub mod error;
pub mod games;
pub mod middleware;
pub mod reports;
pub mod request_id;
pub mod rounds;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use last_man_standing::{
    auth::AuthManager,
    db::timeouts::with_timeout,
    game::{GameManager, GameSettings},
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request (cheap due to Arc wrappers).
#[derive(Clone)]
pub struct AppState {
    pub auth_manager: Arc<AuthManager>,
    pub game_manager: Arc<GameManager>,
    /// Database connection pool for health checks
    pub pool: Arc<PgPool>,
    /// Applied to new games that leave mode flags unset
    pub game_defaults: GameSettings,
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Endpoint Summary
///
/// ```text
/// GET    /health                          - Health check (public)
/// POST   /api/auth/register               - Register manager (public)
/// POST   /api/auth/login                  - Login (public)
/// GET    /api/report/{game_id}            - Per-round report (public)
/// POST   /api/games                       - Create game (auth required)
/// GET    /api/games                       - List own games (auth required)
/// GET    /api/games/{game_id}             - Game, participants, rounds (auth required)
/// DELETE /api/games/{game_id}             - Delete game (auth required)
/// POST   /api/games/{game_id}/participants - Add participant (auth required)
/// POST   /api/games/{game_id}/advance     - Advance game (auth required)
/// GET    /api/rounds/{round_id}           - Round and picks (auth required)
/// POST   /api/rounds/{round_id}/picks     - Submit pick (auth required)
/// POST   /api/rounds/{round_id}/results   - Submit results, close round (auth required)
/// POST   /api/rounds/{round_id}/reopen    - Reopen round (auth required)
/// ```
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/report/{game_id}", get(reports::game_report));

    let protected_routes = Router::new()
        .route("/games", get(games::list_games).post(games::create_game))
        .route(
            "/games/{game_id}",
            get(games::get_game).delete(games::delete_game),
        )
        .route("/games/{game_id}/participants", post(games::add_participant))
        .route("/games/{game_id}/advance", post(games::advance_game))
        .route("/rounds/{round_id}", get(rounds::get_round))
        .route("/rounds/{round_id}/picks", post(rounds::submit_pick))
        .route("/rounds/{round_id}/results", post(rounds::submit_results))
        .route("/rounds/{round_id}/reopen", post(rounds::reopen_round))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", public_routes.merge(protected_routes))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the database answers, `503 Service Unavailable`
/// otherwise.
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"healthy","version":"0.1.0","database":true,"timestamp":"2026-10-19T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = with_timeout(
        Duration::from_secs(2),
        sqlx::query("SELECT 1").execute(&*state.pool),
    )
    .await
    .is_ok();

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
