//! Public game report.
//!
//! No authentication: anyone with the game id can follow along.

use axum::{
    Json,
    extract::{Path, State},
};
use last_man_standing::game::{GameId, GameReport};

use super::AppState;
use super::error::ApiError;

/// Per-round pick counts by team, eliminations, and the game's winner(s).
///
/// # Errors
///
/// - `404 Not Found`: Game doesn't exist
pub async fn game_report(
    State(state): State<AppState>,
    Path(game_id): Path<GameId>,
) -> Result<Json<GameReport>, ApiError> {
    Ok(Json(state.game_manager.report(game_id).await?))
}
