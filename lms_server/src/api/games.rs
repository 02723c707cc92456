//! Game management API handlers.
//!
//! All endpoints require a bearer token and act on the caller's own games.
//! An admin may act for another manager by adding `?asManager=<user id>`;
//! games owned by anyone else are reported as not found.
//!
//! # Examples
//!
//! Create a game:
//! ```bash
//! curl -X POST http://localhost:8080/api/games \
//!   -H "Authorization: Bearer TOKEN" \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Premier League LMS", "players": ["Alice", "Bob", "Cara"]}'
//! ```
//!
//! Advance after the round's results are in:
//! ```bash
//! curl -X POST http://localhost:8080/api/games/1/advance \
//!   -H "Authorization: Bearer TOKEN"
//! ```

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use last_man_standing::auth::{
    Caller, Role, UserId,
    capability::{self, Permission},
};
use last_man_standing::game::{
    AdvanceOutcome, Game, GameDetail, GameId, GameSettings, GameStatus, NewGame, Participant,
    RolloverMode, WinnerMode,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use super::error::{ApiError, ApiJson, ApiQuery};
use super::request_id::RequestId;
use crate::metrics;

/// Optional impersonation target
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActingAs {
    pub as_manager: Option<UserId>,
}

impl ActingAs {
    /// Resolve whose games this request operates on.
    ///
    /// Acting for someone else needs [`Role::Admin`]; a denied attempt is
    /// indistinguishable from asking for a game that doesn't exist.
    pub fn manager_id(&self, caller: &Caller) -> Result<UserId, ApiError> {
        let target = self.as_manager.unwrap_or(caller.user_id);
        match capability::check(caller, target, Role::Admin) {
            Permission::Permit => Ok(target),
            Permission::Deny => {
                tracing::warn!(
                    user_id = caller.user_id,
                    target = target,
                    "Denied attempt to act as another manager"
                );
                Err(ApiError::not_found("Not found"))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGamePayload {
    pub name: String,
    pub group_name: Option<String>,
    pub players: Vec<String>,
    pub winner_mode: Option<WinnerMode>,
    pub rollover_mode: Option<RolloverMode>,
    pub max_winners: Option<u32>,
    pub postpone_as_win: Option<bool>,
}

impl CreateGamePayload {
    /// Fill unset mode flags from the server defaults
    pub fn into_new_game(self, defaults: GameSettings) -> NewGame {
        NewGame {
            name: self.name,
            group_name: self.group_name,
            players: self.players,
            settings: GameSettings {
                winner_mode: self.winner_mode.unwrap_or(defaults.winner_mode),
                rollover_mode: self.rollover_mode.unwrap_or(defaults.rollover_mode),
                max_winners: self.max_winners.unwrap_or(defaults.max_winners),
                postpone_as_win: self.postpone_as_win.unwrap_or(defaults.postpone_as_win),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddParticipantPayload {
    pub name: String,
}

/// Response of `POST /api/games/{id}/advance`
///
/// Completed games carry `status` and `winnerName`; otherwise the new
/// `roundNumber` is returned, with `rollover` set when one happened.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<GameStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_number: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollover: Option<RolloverMode>,
}

impl From<AdvanceOutcome> for AdvanceResponse {
    fn from(outcome: AdvanceOutcome) -> Self {
        match outcome {
            AdvanceOutcome::Completed { winner_name } => Self {
                status: Some(GameStatus::Completed),
                winner_name: Some(winner_name),
                round_number: None,
                rollover: None,
            },
            AdvanceOutcome::NextRound {
                round_number,
                rollover,
            } => Self {
                status: None,
                winner_name: None,
                round_number: Some(round_number),
                rollover,
            },
        }
    }
}

/// Metrics label for an advance outcome
fn outcome_label(outcome: &AdvanceOutcome) -> &'static str {
    match outcome {
        AdvanceOutcome::Completed { .. } => "completed",
        AdvanceOutcome::NextRound { rollover: None, .. } => "next_round",
        AdvanceOutcome::NextRound {
            rollover: Some(RolloverMode::Round),
            ..
        } => "rollover_round",
        AdvanceOutcome::NextRound {
            rollover: Some(RolloverMode::Game),
            ..
        } => "rollover_game",
    }
}

/// Create a game with its players and an open round 1.
///
/// Mode flags left out of the body fall back to the server's configured
/// defaults.
///
/// # Errors
///
/// - `400 Bad Request`: Missing name, fewer than 2 players, duplicate players
pub async fn create_game(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiQuery(acting): ApiQuery<ActingAs>,
    ApiJson(payload): ApiJson<CreateGamePayload>,
) -> Result<(StatusCode, Json<GameDetail>), ApiError> {
    let manager_id = acting.manager_id(&caller)?;
    let request = payload.into_new_game(state.game_defaults);

    let detail = state.game_manager.create_game(manager_id, request).await?;
    metrics::games_created_total();

    Ok((StatusCode::CREATED, Json(detail)))
}

/// List the manager's games, newest first.
pub async fn list_games(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiQuery(acting): ApiQuery<ActingAs>,
) -> Result<Json<Vec<Game>>, ApiError> {
    let manager_id = acting.manager_id(&caller)?;
    Ok(Json(state.game_manager.list_games(manager_id).await?))
}

/// Get a game with its participants and rounds.
///
/// # Errors
///
/// - `404 Not Found`: Game doesn't exist or belongs to another manager
pub async fn get_game(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiQuery(acting): ApiQuery<ActingAs>,
    Path(game_id): Path<GameId>,
) -> Result<Json<GameDetail>, ApiError> {
    let manager_id = acting.manager_id(&caller)?;
    Ok(Json(state.game_manager.get_game(manager_id, game_id).await?))
}

/// Delete a game with all of its participants, rounds and picks.
pub async fn delete_game(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiQuery(acting): ApiQuery<ActingAs>,
    Path(game_id): Path<GameId>,
) -> Result<StatusCode, ApiError> {
    let manager_id = acting.manager_id(&caller)?;
    state.game_manager.delete_game(manager_id, game_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a participant to a game that hasn't finished.
///
/// # Errors
///
/// - `400 Bad Request`: Blank or duplicate name
/// - `409 Conflict`: Game already completed
pub async fn add_participant(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiQuery(acting): ApiQuery<ActingAs>,
    Path(game_id): Path<GameId>,
    ApiJson(payload): ApiJson<AddParticipantPayload>,
) -> Result<(StatusCode, Json<Participant>), ApiError> {
    let manager_id = acting.manager_id(&caller)?;
    let participant = state
        .game_manager
        .add_participant(manager_id, game_id, &payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(participant)))
}

/// Run the round advancement engine.
///
/// # Response
///
/// ```json
/// {"status": "completed", "winnerName": "Alice"}
/// ```
/// or
/// ```json
/// {"roundNumber": 3, "rollover": "round"}
/// ```
///
/// # Errors
///
/// - `404 Not Found`: Game doesn't exist or belongs to another manager
/// - `409 Conflict`: The latest round is still open
pub async fn advance_game(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    request_id: RequestId,
    ApiQuery(acting): ApiQuery<ActingAs>,
    Path(game_id): Path<GameId>,
) -> Result<Json<AdvanceResponse>, ApiError> {
    let manager_id = acting.manager_id(&caller)?;
    let outcome = state.game_manager.advance(manager_id, game_id).await?;

    let label = outcome_label(&outcome);
    metrics::games_advanced_total(label);
    tracing::info!(
        request_id = %request_id.as_str(),
        game_id = game_id,
        outcome = label,
        "Game advanced"
    );

    Ok(Json(outcome.into()))
}
