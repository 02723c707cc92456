//! Game manager: every operation a manager performs on a game.
//!
//! Each mutating method opens one transaction, runs the matching procedure
//! below against it, and commits. Any error drops the transaction, which
//! rolls back every write made so far. The procedures are public so callers
//! that already hold a connection or transaction can compose them.

use sqlx::{PgConnection, PgPool};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use super::engine::{self, AdvanceDecision, AdvanceInput, Winners};
use super::errors::{GameError, GameResult};
use super::models::{
    AdvanceOutcome, CloseSummary, Game, GameDetail, GameId, GameStatus, NewGame, Participant,
    ParticipantId, Pick, PickResult, PickResultEntry, RolloverMode, Round, RoundDetail, RoundId,
    RoundStatus, WINNER_SEPARATOR, normalize_name,
};
use super::report::{self, GameReport};
use super::store;
use crate::auth::UserId;
use crate::db::timeouts::{DEFAULT_TRANSACTION_TIMEOUT, with_deadline};

/// Game manager
#[derive(Clone)]
pub struct GameManager {
    pool: Arc<PgPool>,
    transaction_timeout: Duration,
}

impl GameManager {
    /// Create a new game manager
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self {
            pool,
            transaction_timeout: DEFAULT_TRANSACTION_TIMEOUT,
        }
    }

    /// Override how long a single operation may take
    pub fn with_transaction_timeout(mut self, timeout: Duration) -> Self {
        self.transaction_timeout = timeout;
        self
    }

    /// Create a game with its participants and an open round 1
    pub async fn create_game(&self, manager_id: UserId, request: NewGame) -> GameResult<GameDetail> {
        let request = request.normalized().map_err(GameError::InvalidInput)?;

        with_deadline(self.transaction_timeout, async {
            let mut tx = self.pool.begin().await?;
            let detail = setup_game(&mut tx, manager_id, &request).await?;
            tx.commit().await?;

            log::info!(
                "Manager {} created game {} with {} participants",
                manager_id,
                detail.game.id,
                detail.participants.len()
            );
            Ok(detail)
        })
        .await
    }

    /// Get a game with its participants and rounds
    pub async fn get_game(&self, manager_id: UserId, game_id: GameId) -> GameResult<GameDetail> {
        with_deadline(self.transaction_timeout, async {
            let mut conn = self.pool.acquire().await?;
            let game = store::fetch_owned_game(&mut conn, game_id, manager_id, false).await?;
            let participants = store::fetch_participants(&mut conn, game_id).await?;
            let rounds = store::fetch_rounds(&mut conn, game_id).await?;

            Ok(GameDetail {
                game,
                participants,
                rounds,
            })
        })
        .await
    }

    /// List games owned by a manager, newest first
    pub async fn list_games(&self, manager_id: UserId) -> GameResult<Vec<Game>> {
        with_deadline(self.transaction_timeout, async {
            let mut conn = self.pool.acquire().await?;
            store::list_games(&mut conn, manager_id).await
        })
        .await
    }

    /// Delete a game and everything in it
    pub async fn delete_game(&self, manager_id: UserId, game_id: GameId) -> GameResult<()> {
        with_deadline(self.transaction_timeout, async {
            let mut conn = self.pool.acquire().await?;
            if !store::delete_game(&mut conn, game_id, manager_id).await? {
                return Err(GameError::NotFound(game_id));
            }
            log::info!("Manager {} deleted game {}", manager_id, game_id);
            Ok(())
        })
        .await
    }

    /// Add an entrant to a game that is still running
    pub async fn add_participant(
        &self,
        manager_id: UserId,
        game_id: GameId,
        name: &str,
    ) -> GameResult<Participant> {
        with_deadline(self.transaction_timeout, async {
            let mut tx = self.pool.begin().await?;
            let participant = add_participant(&mut tx, manager_id, game_id, name).await?;
            tx.commit().await?;
            Ok(participant)
        })
        .await
    }

    /// Get a round with its picks
    pub async fn get_round(&self, manager_id: UserId, round_id: RoundId) -> GameResult<RoundDetail> {
        with_deadline(self.transaction_timeout, async {
            let mut conn = self.pool.acquire().await?;
            let round = store::fetch_owned_round(&mut conn, round_id, manager_id).await?;
            let picks = store::fetch_picks(&mut conn, round_id).await?;
            Ok(RoundDetail { round, picks })
        })
        .await
    }

    /// Record or replace a participant's pick for an open round
    pub async fn submit_pick(
        &self,
        manager_id: UserId,
        round_id: RoundId,
        participant_id: ParticipantId,
        team: &str,
    ) -> GameResult<Pick> {
        with_deadline(self.transaction_timeout, async {
            let mut tx = self.pool.begin().await?;
            let pick = record_pick(&mut tx, manager_id, round_id, participant_id, team).await?;
            tx.commit().await?;
            Ok(pick)
        })
        .await
    }

    /// Save results for every pick in a round and close it
    pub async fn close_round(
        &self,
        manager_id: UserId,
        round_id: RoundId,
        results: &[PickResultEntry],
    ) -> GameResult<CloseSummary> {
        with_deadline(self.transaction_timeout, async {
            let mut tx = self.pool.begin().await?;
            let summary = close_round_with_results(&mut tx, manager_id, round_id, results).await?;
            tx.commit().await?;
            Ok(summary)
        })
        .await
    }

    /// Declare winner(s), roll over, or open the next round
    pub async fn advance(&self, manager_id: UserId, game_id: GameId) -> GameResult<AdvanceOutcome> {
        with_deadline(self.transaction_timeout, async {
            let mut tx = self.pool.begin().await?;
            let outcome = advance_game(&mut tx, manager_id, game_id).await?;
            tx.commit().await?;
            Ok(outcome)
        })
        .await
    }

    /// Undo a closed round so its results can be entered again
    pub async fn reopen_round(&self, manager_id: UserId, round_id: RoundId) -> GameResult<Round> {
        with_deadline(self.transaction_timeout, async {
            let mut tx = self.pool.begin().await?;
            let round = reopen_closed_round(&mut tx, manager_id, round_id).await?;
            tx.commit().await?;
            Ok(round)
        })
        .await
    }

    /// Public per-round summary; no ownership check
    pub async fn report(&self, game_id: GameId) -> GameResult<GameReport> {
        with_deadline(self.transaction_timeout, async {
            let mut conn = self.pool.acquire().await?;
            let game = store::fetch_game(&mut conn, game_id).await?;
            let participants = store::fetch_participants(&mut conn, game_id).await?;
            let rounds = store::fetch_rounds(&mut conn, game_id).await?;
            let picks = store::fetch_game_picks(&mut conn, game_id).await?;

            Ok(report::build_report(&game, &participants, &rounds, &picks))
        })
        .await
    }
}

/// Lock the game that owns `round_id`, then load the round under that lock.
///
/// Every writer takes the game row first, so round writers and advances of
/// the same game queue up behind one lock instead of deadlocking. The round
/// is read again after locking because a game rollover may have deleted it.
async fn lock_owned_round(
    conn: &mut PgConnection,
    manager_id: UserId,
    round_id: RoundId,
) -> GameResult<(Game, Round)> {
    let unlocked = store::fetch_owned_round(conn, round_id, manager_id).await?;
    let game = store::fetch_owned_game(conn, unlocked.game_id, manager_id, true).await?;
    let round = store::fetch_owned_round(conn, round_id, manager_id).await?;
    Ok((game, round))
}

/// Insert a game, its participants and round 1.
///
/// `request` must already be normalized.
pub async fn setup_game(
    conn: &mut PgConnection,
    manager_id: UserId,
    request: &NewGame,
) -> GameResult<GameDetail> {
    let game = store::insert_game(conn, manager_id, request).await?;

    let mut participants = Vec::with_capacity(request.players.len());
    for player in &request.players {
        participants.push(store::insert_participant(conn, game.id, player).await?);
    }
    participants.sort_by(|a, b| a.name.cmp(&b.name));

    let round = store::insert_round(conn, game.id, 1).await?;

    Ok(GameDetail {
        game,
        participants,
        rounds: vec![round],
    })
}

pub async fn add_participant(
    conn: &mut PgConnection,
    manager_id: UserId,
    game_id: GameId,
    name: &str,
) -> GameResult<Participant> {
    let name = normalize_name(name)
        .ok_or_else(|| GameError::InvalidInput("Participant name must be 1-128 characters".into()))?;

    let game = store::fetch_owned_game(conn, game_id, manager_id, true).await?;
    if game.status == GameStatus::Completed {
        return Err(GameError::GameCompleted);
    }

    let lowered = name.to_lowercase();
    let existing = store::fetch_participants(conn, game_id).await?;
    if existing.iter().any(|p| p.name.to_lowercase() == lowered) {
        return Err(GameError::DuplicateParticipant(name));
    }

    store::insert_participant(conn, game_id, &name).await
}

pub async fn record_pick(
    conn: &mut PgConnection,
    manager_id: UserId,
    round_id: RoundId,
    participant_id: ParticipantId,
    team: &str,
) -> GameResult<Pick> {
    let team = normalize_name(team)
        .ok_or_else(|| GameError::InvalidInput("Team must be 1-128 characters".into()))?;

    let (_, round) = lock_owned_round(conn, manager_id, round_id).await?;
    if round.status != RoundStatus::Open {
        return Err(GameError::RoundNotOpen {
            round_number: round.round_number,
        });
    }

    let participant = store::fetch_participant(conn, round.game_id, participant_id).await?;
    if !participant.is_active {
        return Err(GameError::ParticipantEliminated(participant.name));
    }

    let pick_id = store::upsert_pick(conn, round.game_id, round_id, participant_id, &team).await?;
    store::fetch_pick(conn, pick_id).await
}

/// Apply results, eliminate losers, auto-assign a losing pick to active
/// participants who never picked, and close the round.
pub async fn close_round_with_results(
    conn: &mut PgConnection,
    manager_id: UserId,
    round_id: RoundId,
    results: &[PickResultEntry],
) -> GameResult<CloseSummary> {
    let (game, round) = lock_owned_round(conn, manager_id, round_id).await?;
    if round.status != RoundStatus::Open {
        return Err(GameError::RoundNotOpen {
            round_number: round.round_number,
        });
    }

    if game.status == GameStatus::Completed {
        return Err(GameError::GameCompleted);
    }

    let picks = store::fetch_picks(conn, round_id).await?;
    let known: HashSet<_> = picks.iter().map(|p| p.id).collect();

    let mut submitted = HashMap::with_capacity(results.len());
    for entry in results {
        if !known.contains(&entry.pick_id) {
            return Err(GameError::PickNotFound(entry.pick_id));
        }
        submitted.insert(entry.pick_id, entry.result);
    }

    if let Some(missing) = picks.iter().find(|p| !submitted.contains_key(&p.id)) {
        return Err(GameError::MissingResult { pick_id: missing.id });
    }

    let mut eliminated = 0;
    for pick in &picks {
        let result = submitted[&pick.id];
        store::set_pick_result(conn, pick.id, result).await?;

        if engine::eliminates(result, game.settings.postpone_as_win)
            && store::eliminate_participant(conn, pick.participant_id, round.round_number).await?
        {
            eliminated += 1;
        }
    }

    let picked: HashSet<_> = picks.iter().map(|p| p.participant_id).collect();
    let mut auto_assigned = 0;
    for participant in store::fetch_participants(conn, game.id).await? {
        if !participant.is_active || picked.contains(&participant.id) {
            continue;
        }
        store::insert_auto_pick(conn, game.id, round_id, participant.id, PickResult::Loss).await?;
        store::eliminate_participant(conn, participant.id, round.round_number).await?;
        auto_assigned += 1;
        eliminated += 1;
    }

    store::close_round(conn, round_id).await?;
    let survivors = store::count_active(conn, game.id).await?;

    log::info!(
        "Closed round {} of game {}: {} eliminated ({} without a pick), {} remain",
        round.round_number,
        game.id,
        eliminated,
        auto_assigned,
        survivors
    );

    Ok(CloseSummary {
        round_number: round.round_number,
        eliminated,
        survivors,
        auto_assigned,
    })
}

/// Run the advancement engine against the game's current state.
///
/// A game that is already completed is returned as-is without any write.
pub async fn advance_game(
    conn: &mut PgConnection,
    manager_id: UserId,
    game_id: GameId,
) -> GameResult<AdvanceOutcome> {
    let game = store::fetch_owned_game(conn, game_id, manager_id, true).await?;
    if game.status == GameStatus::Completed {
        return Ok(AdvanceOutcome::Completed {
            winner_name: game.winner_name.unwrap_or_default(),
        });
    }

    let latest = store::fetch_latest_round(conn, game_id)
        .await?
        .ok_or(GameError::NoRounds)?;
    if latest.status != RoundStatus::Closed {
        return Err(GameError::RoundNotClosed {
            round_number: latest.round_number,
        });
    }

    let input = AdvanceInput {
        current_round: latest.round_number,
        active: store::count_active(conn, game_id).await?,
        eliminated_this_round: store::count_eliminated_in_round(conn, game_id, latest.round_number)
            .await?,
    };
    let decision = engine::decide(&input, &game.settings);

    log::info!(
        "Advancing game {} after round {} ({} active, {} eliminated): {}",
        game_id,
        input.current_round,
        input.active,
        input.eliminated_this_round,
        decision.label()
    );

    match decision {
        AdvanceDecision::Complete(winners) => {
            let names = match winners {
                Winners::Survivors => store::active_names(conn, game_id).await?,
                Winners::EliminatedThisRound => {
                    let names =
                        store::names_eliminated_in_round(conn, game_id, latest.round_number)
                            .await?;
                    store::reactivate_round(conn, game_id, latest.round_number).await?;
                    names
                }
            };
            let winner_name = names.join(WINNER_SEPARATOR);
            store::complete_game(conn, game_id, &winner_name).await?;

            Ok(AdvanceOutcome::Completed { winner_name })
        }
        AdvanceDecision::OpenRound {
            round_number,
            rollover,
        } => {
            match rollover {
                Some(RolloverMode::Round) => {
                    store::reactivate_round(conn, game_id, latest.round_number).await?;
                }
                Some(RolloverMode::Game) => {
                    store::reactivate_all(conn, game_id).await?;
                    store::delete_rounds(conn, game_id).await?;
                }
                None => {}
            }
            let round = store::insert_round(conn, game_id, round_number).await?;

            Ok(AdvanceOutcome::NextRound {
                round_number: round.round_number,
                rollover,
            })
        }
    }
}

/// Reverse a closed round: restore its eliminations, clear its results and
/// open it again. Only the latest round of a game can be reopened.
pub async fn reopen_closed_round(
    conn: &mut PgConnection,
    manager_id: UserId,
    round_id: RoundId,
) -> GameResult<Round> {
    let (game, round) = lock_owned_round(conn, manager_id, round_id).await?;
    if round.status != RoundStatus::Closed {
        return Err(GameError::RoundNotClosed {
            round_number: round.round_number,
        });
    }

    let latest = store::fetch_latest_round(conn, game.id)
        .await?
        .ok_or(GameError::NoRounds)?;
    if latest.id != round.id {
        return Err(GameError::RoundNotLatest {
            round_number: round.round_number,
            latest: latest.round_number,
        });
    }

    let restored = store::reactivate_round(conn, game.id, round.round_number).await?;
    store::clear_round_results(conn, round_id).await?;
    if game.status == GameStatus::Completed {
        store::reactivate_game(conn, game.id).await?;
    }
    let reopened = store::reopen_round(conn, round_id).await?;

    log::warn!(
        "Manager {} reopened round {} of game {}: {} participant(s) restored{}",
        manager_id,
        round.round_number,
        game.id,
        restored,
        if game.status == GameStatus::Completed {
            ", completion reverted"
        } else {
            ""
        }
    );

    Ok(reopened)
}
