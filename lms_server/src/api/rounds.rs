//! Round API handlers: picks, results and corrections.
//!
//! Rounds are addressed by their own id; ownership is checked through the
//! round's game, so a round in someone else's game is reported as not found.
//!
//! # Examples
//!
//! Close round 7 with results:
//! ```bash
//! curl -X POST http://localhost:8080/api/rounds/7/results \
//!   -H "Authorization: Bearer TOKEN" \
//!   -H "Content-Type: application/json" \
//!   -d '{"results": [{"pickId": 21, "result": "win"}, {"pickId": 22, "result": "draw"}]}'
//! ```

use axum::{
    Json,
    extract::{Extension, Path, State},
};
use last_man_standing::auth::Caller;
use last_man_standing::game::{
    CloseSummary, ParticipantId, Pick, PickResultEntry, Round, RoundDetail, RoundId,
};
use serde::Deserialize;

use super::AppState;
use super::error::{ApiError, ApiJson, ApiQuery};
use super::games::ActingAs;
use super::request_id::RequestId;
use crate::{logging, metrics};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPickPayload {
    pub participant_id: ParticipantId,
    pub team: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitResultsPayload {
    pub results: Vec<PickResultEntry>,
}

/// Get a round with every pick made in it.
pub async fn get_round(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiQuery(acting): ApiQuery<ActingAs>,
    Path(round_id): Path<RoundId>,
) -> Result<Json<RoundDetail>, ApiError> {
    let manager_id = acting.manager_id(&caller)?;
    Ok(Json(state.game_manager.get_round(manager_id, round_id).await?))
}

/// Record (or replace) an active participant's pick for an open round.
///
/// # Errors
///
/// - `404 Not Found`: Unknown round or participant
/// - `409 Conflict`: Round closed or participant already eliminated
pub async fn submit_pick(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiQuery(acting): ApiQuery<ActingAs>,
    Path(round_id): Path<RoundId>,
    ApiJson(payload): ApiJson<SubmitPickPayload>,
) -> Result<Json<Pick>, ApiError> {
    let manager_id = acting.manager_id(&caller)?;
    let pick = state
        .game_manager
        .submit_pick(manager_id, round_id, payload.participant_id, &payload.team)
        .await?;
    Ok(Json(pick))
}

/// Save a result for every pick in the round and close it.
///
/// Losses and draws eliminate; postponed fixtures eliminate unless the game
/// counts them as wins. Active participants who never picked are given a
/// losing pick.
///
/// # Errors
///
/// - `400 Bad Request`: A pick is missing a result or isn't in this round
/// - `409 Conflict`: Round already closed or game completed
pub async fn submit_results(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiQuery(acting): ApiQuery<ActingAs>,
    Path(round_id): Path<RoundId>,
    ApiJson(payload): ApiJson<SubmitResultsPayload>,
) -> Result<Json<CloseSummary>, ApiError> {
    let manager_id = acting.manager_id(&caller)?;
    let summary = state
        .game_manager
        .close_round(manager_id, round_id, &payload.results)
        .await?;

    metrics::rounds_closed_total();
    metrics::participants_eliminated(summary.eliminated);

    Ok(Json(summary))
}

/// Reopen the latest round of a game to correct its results.
///
/// Everyone eliminated in the round is restored and its results are cleared.
/// If the round had completed the game, the game becomes active again.
///
/// # Errors
///
/// - `409 Conflict`: Round still open, or a later round exists
pub async fn reopen_round(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    request_id: RequestId,
    ApiQuery(acting): ApiQuery<ActingAs>,
    Path(round_id): Path<RoundId>,
) -> Result<Json<Round>, ApiError> {
    let manager_id = acting.manager_id(&caller)?;
    let round = state
        .game_manager
        .reopen_round(manager_id, round_id)
        .await?;

    metrics::rounds_reopened_total();
    logging::log_game_correction(
        manager_id,
        caller.user_id,
        round_id,
        &format!(
            "Reopened round {} of game {} (request {})",
            round.round_number,
            round.game_id,
            request_id.as_str()
        ),
    );

    Ok(Json(round))
}
