//! SQL over the games, participants, rounds and picks tables.
//!
//! Every function takes the connection it runs on, so a caller holding a
//! transaction gets all of its reads and writes inside that transaction.

use sqlx::{PgConnection, Row, postgres::PgRow};

use super::errors::{GameError, GameResult};
use super::models::{
    Game, GameId, GameSettings, NewGame, Participant, ParticipantId, Pick, PickId, PickResult,
    Round, RoundId,
};
use crate::auth::UserId;

const GAME_COLUMNS: &str = "id, manager_id, name, group_name, status, winner_mode, rollover_mode, \
     max_winners, postpone_as_win, winner_name, created_at, completed_at";

const PICK_SELECT: &str = "SELECT p.id, p.game_id, p.round_id, p.participant_id, \
     pa.name AS participant_name, p.team, p.result, p.auto_assigned \
     FROM picks p JOIN participants pa ON pa.id = p.participant_id";

fn game_from_row(row: &PgRow) -> GameResult<Game> {
    let max_winners: i32 = row.get("max_winners");
    Ok(Game {
        id: row.get("id"),
        manager_id: row.get("manager_id"),
        name: row.get("name"),
        group_name: row.get("group_name"),
        status: row.get::<String, _>("status").parse()?,
        settings: GameSettings {
            winner_mode: row.get::<String, _>("winner_mode").parse()?,
            rollover_mode: row.get::<String, _>("rollover_mode").parse()?,
            max_winners: max_winners.max(1) as u32,
            postpone_as_win: row.get("postpone_as_win"),
        },
        winner_name: row.get("winner_name"),
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
        completed_at: row
            .get::<Option<chrono::NaiveDateTime>, _>("completed_at")
            .map(|dt| dt.and_utc()),
    })
}

fn participant_from_row(row: &PgRow) -> Participant {
    Participant {
        id: row.get("id"),
        game_id: row.get("game_id"),
        name: row.get("name"),
        is_active: row.get("is_active"),
        eliminated_in_round: row.get("eliminated_in_round"),
    }
}

fn round_from_row(row: &PgRow) -> GameResult<Round> {
    Ok(Round {
        id: row.get("id"),
        game_id: row.get("game_id"),
        round_number: row.get("round_number"),
        status: row.get::<String, _>("status").parse()?,
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
        closed_at: row
            .get::<Option<chrono::NaiveDateTime>, _>("closed_at")
            .map(|dt| dt.and_utc()),
    })
}

fn pick_from_row(row: &PgRow) -> GameResult<Pick> {
    let result = row
        .get::<Option<String>, _>("result")
        .map(|r| r.parse::<PickResult>())
        .transpose()?;

    Ok(Pick {
        id: row.get("id"),
        game_id: row.get("game_id"),
        round_id: row.get("round_id"),
        participant_id: row.get("participant_id"),
        participant_name: row.get("participant_name"),
        team: row.get("team"),
        result,
        auto_assigned: row.get("auto_assigned"),
    })
}

fn unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

// ---------------------------------------------------------------------------
// Games
// ---------------------------------------------------------------------------

pub async fn insert_game(
    conn: &mut PgConnection,
    manager_id: UserId,
    game: &NewGame,
) -> GameResult<Game> {
    let sql = format!(
        "INSERT INTO games (manager_id, name, group_name, winner_mode, rollover_mode, max_winners, postpone_as_win)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {GAME_COLUMNS}"
    );
    let row = sqlx::query(&sql)
        .bind(manager_id)
        .bind(&game.name)
        .bind(&game.group_name)
        .bind(game.settings.winner_mode.as_str())
        .bind(game.settings.rollover_mode.as_str())
        .bind(
            i32::try_from(game.settings.max_winners)
                .map_err(|_| GameError::InvalidInput("maxWinners is too large".into()))?,
        )
        .bind(game.settings.postpone_as_win)
        .fetch_one(&mut *conn)
        .await?;

    game_from_row(&row)
}

/// Load a game owned by `manager_id`, optionally locking its row.
pub async fn fetch_owned_game(
    conn: &mut PgConnection,
    game_id: GameId,
    manager_id: UserId,
    for_update: bool,
) -> GameResult<Game> {
    let lock = if for_update { " FOR UPDATE" } else { "" };
    let sql = format!("SELECT {GAME_COLUMNS} FROM games WHERE id = $1 AND manager_id = $2{lock}");
    let row = sqlx::query(&sql)
        .bind(game_id)
        .bind(manager_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(GameError::NotFound(game_id))?;

    game_from_row(&row)
}

/// Load a game regardless of owner (public report)
pub async fn fetch_game(conn: &mut PgConnection, game_id: GameId) -> GameResult<Game> {
    let sql = format!("SELECT {GAME_COLUMNS} FROM games WHERE id = $1");
    let row = sqlx::query(&sql)
        .bind(game_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(GameError::NotFound(game_id))?;

    game_from_row(&row)
}

pub async fn list_games(conn: &mut PgConnection, manager_id: UserId) -> GameResult<Vec<Game>> {
    let sql = format!(
        "SELECT {GAME_COLUMNS} FROM games WHERE manager_id = $1 ORDER BY created_at DESC, id DESC"
    );
    let rows = sqlx::query(&sql)
        .bind(manager_id)
        .fetch_all(&mut *conn)
        .await?;

    rows.iter().map(game_from_row).collect()
}

pub async fn complete_game(
    conn: &mut PgConnection,
    game_id: GameId,
    winner_name: &str,
) -> GameResult<()> {
    sqlx::query(
        "UPDATE games SET status = 'completed', winner_name = $1, completed_at = NOW() WHERE id = $2",
    )
    .bind(winner_name)
    .bind(game_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Put a completed game back into play and forget its winners
pub async fn reactivate_game(conn: &mut PgConnection, game_id: GameId) -> GameResult<()> {
    sqlx::query(
        "UPDATE games SET status = 'active', winner_name = NULL, completed_at = NULL WHERE id = $1",
    )
    .bind(game_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Returns false when nothing matched
pub async fn delete_game(
    conn: &mut PgConnection,
    game_id: GameId,
    manager_id: UserId,
) -> GameResult<bool> {
    let result = sqlx::query("DELETE FROM games WHERE id = $1 AND manager_id = $2")
        .bind(game_id)
        .bind(manager_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// Participants
// ---------------------------------------------------------------------------

pub async fn insert_participant(
    conn: &mut PgConnection,
    game_id: GameId,
    name: &str,
) -> GameResult<Participant> {
    let row = sqlx::query(
        r#"
        INSERT INTO participants (game_id, name)
        VALUES ($1, $2)
        RETURNING id, game_id, name, is_active, eliminated_in_round
        "#,
    )
    .bind(game_id)
    .bind(name)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if unique_violation(&e) {
            GameError::DuplicateParticipant(name.to_string())
        } else {
            GameError::Database(e)
        }
    })?;

    Ok(participant_from_row(&row))
}

pub async fn fetch_participants(
    conn: &mut PgConnection,
    game_id: GameId,
) -> GameResult<Vec<Participant>> {
    let rows = sqlx::query(
        "SELECT id, game_id, name, is_active, eliminated_in_round
         FROM participants WHERE game_id = $1 ORDER BY name, id",
    )
    .bind(game_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.iter().map(participant_from_row).collect())
}

pub async fn fetch_participant(
    conn: &mut PgConnection,
    game_id: GameId,
    participant_id: ParticipantId,
) -> GameResult<Participant> {
    let row = sqlx::query(
        "SELECT id, game_id, name, is_active, eliminated_in_round
         FROM participants WHERE id = $1 AND game_id = $2",
    )
    .bind(participant_id)
    .bind(game_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(GameError::ParticipantNotFound(participant_id))?;

    Ok(participant_from_row(&row))
}

pub async fn count_active(conn: &mut PgConnection, game_id: GameId) -> GameResult<usize> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM participants WHERE game_id = $1 AND is_active")
            .bind(game_id)
            .fetch_one(&mut *conn)
            .await?;
    Ok(count as usize)
}

pub async fn count_eliminated_in_round(
    conn: &mut PgConnection,
    game_id: GameId,
    round_number: i32,
) -> GameResult<usize> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM participants WHERE game_id = $1 AND eliminated_in_round = $2",
    )
    .bind(game_id)
    .bind(round_number)
    .fetch_one(&mut *conn)
    .await?;
    Ok(count as usize)
}

pub async fn active_names(conn: &mut PgConnection, game_id: GameId) -> GameResult<Vec<String>> {
    Ok(sqlx::query_scalar(
        "SELECT name FROM participants WHERE game_id = $1 AND is_active ORDER BY name",
    )
    .bind(game_id)
    .fetch_all(&mut *conn)
    .await?)
}

pub async fn names_eliminated_in_round(
    conn: &mut PgConnection,
    game_id: GameId,
    round_number: i32,
) -> GameResult<Vec<String>> {
    Ok(sqlx::query_scalar(
        "SELECT name FROM participants WHERE game_id = $1 AND eliminated_in_round = $2 ORDER BY name",
    )
    .bind(game_id)
    .bind(round_number)
    .fetch_all(&mut *conn)
    .await?)
}

/// Mark an active participant eliminated; returns false if already out
pub async fn eliminate_participant(
    conn: &mut PgConnection,
    participant_id: ParticipantId,
    round_number: i32,
) -> GameResult<bool> {
    let result = sqlx::query(
        "UPDATE participants SET is_active = FALSE, eliminated_in_round = $1
         WHERE id = $2 AND is_active",
    )
    .bind(round_number)
    .bind(participant_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Undo every elimination recorded for `round_number`
pub async fn reactivate_round(
    conn: &mut PgConnection,
    game_id: GameId,
    round_number: i32,
) -> GameResult<u64> {
    let result = sqlx::query(
        "UPDATE participants SET is_active = TRUE, eliminated_in_round = NULL
         WHERE game_id = $1 AND eliminated_in_round = $2",
    )
    .bind(game_id)
    .bind(round_number)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn reactivate_all(conn: &mut PgConnection, game_id: GameId) -> GameResult<u64> {
    let result = sqlx::query(
        "UPDATE participants SET is_active = TRUE, eliminated_in_round = NULL WHERE game_id = $1",
    )
    .bind(game_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}

// ---------------------------------------------------------------------------
// Rounds
// ---------------------------------------------------------------------------

pub async fn insert_round(
    conn: &mut PgConnection,
    game_id: GameId,
    round_number: i32,
) -> GameResult<Round> {
    let row = sqlx::query(
        r#"
        INSERT INTO rounds (game_id, round_number, status)
        VALUES ($1, $2, 'open')
        RETURNING id, game_id, round_number, status, created_at, closed_at
        "#,
    )
    .bind(game_id)
    .bind(round_number)
    .fetch_one(&mut *conn)
    .await?;

    round_from_row(&row)
}

pub async fn fetch_rounds(conn: &mut PgConnection, game_id: GameId) -> GameResult<Vec<Round>> {
    let rows = sqlx::query(
        "SELECT id, game_id, round_number, status, created_at, closed_at
         FROM rounds WHERE game_id = $1 ORDER BY round_number",
    )
    .bind(game_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(round_from_row).collect()
}

pub async fn fetch_latest_round(
    conn: &mut PgConnection,
    game_id: GameId,
) -> GameResult<Option<Round>> {
    let row = sqlx::query(
        "SELECT id, game_id, round_number, status, created_at, closed_at
         FROM rounds WHERE game_id = $1 ORDER BY round_number DESC LIMIT 1",
    )
    .bind(game_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(round_from_row).transpose()
}

/// Load a round whose game belongs to `manager_id`.
///
/// Never locks; writers lock the owning game with [`fetch_owned_game`] and
/// read the round again under that lock.
pub async fn fetch_owned_round(
    conn: &mut PgConnection,
    round_id: RoundId,
    manager_id: UserId,
) -> GameResult<Round> {
    let row = sqlx::query(
        "SELECT r.id, r.game_id, r.round_number, r.status, r.created_at, r.closed_at
         FROM rounds r JOIN games g ON g.id = r.game_id
         WHERE r.id = $1 AND g.manager_id = $2",
    )
        .bind(round_id)
        .bind(manager_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(GameError::RoundNotFound(round_id))?;

    round_from_row(&row)
}

pub async fn close_round(conn: &mut PgConnection, round_id: RoundId) -> GameResult<()> {
    sqlx::query("UPDATE rounds SET status = 'closed', closed_at = NOW() WHERE id = $1")
        .bind(round_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn reopen_round(conn: &mut PgConnection, round_id: RoundId) -> GameResult<Round> {
    let row = sqlx::query(
        r#"
        UPDATE rounds SET status = 'open', closed_at = NULL WHERE id = $1
        RETURNING id, game_id, round_number, status, created_at, closed_at
        "#,
    )
    .bind(round_id)
    .fetch_one(&mut *conn)
    .await?;

    round_from_row(&row)
}

/// Drop every round and pick of a game
pub async fn delete_rounds(conn: &mut PgConnection, game_id: GameId) -> GameResult<()> {
    sqlx::query("DELETE FROM picks WHERE game_id = $1")
        .bind(game_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM rounds WHERE game_id = $1")
        .bind(game_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Picks
// ---------------------------------------------------------------------------

pub async fn fetch_picks(conn: &mut PgConnection, round_id: RoundId) -> GameResult<Vec<Pick>> {
    let sql = format!("{PICK_SELECT} WHERE p.round_id = $1 ORDER BY pa.name, p.id");
    let rows = sqlx::query(&sql)
        .bind(round_id)
        .fetch_all(&mut *conn)
        .await?;

    rows.iter().map(pick_from_row).collect()
}

pub async fn fetch_game_picks(conn: &mut PgConnection, game_id: GameId) -> GameResult<Vec<Pick>> {
    let sql = format!("{PICK_SELECT} WHERE p.game_id = $1 ORDER BY p.round_id, pa.name, p.id");
    let rows = sqlx::query(&sql)
        .bind(game_id)
        .fetch_all(&mut *conn)
        .await?;

    rows.iter().map(pick_from_row).collect()
}

/// Insert or replace a participant's pick for a round
pub async fn upsert_pick(
    conn: &mut PgConnection,
    game_id: GameId,
    round_id: RoundId,
    participant_id: ParticipantId,
    team: &str,
) -> GameResult<PickId> {
    let id: PickId = sqlx::query_scalar(
        r#"
        INSERT INTO picks (game_id, round_id, participant_id, team)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (game_id, round_id, participant_id)
        DO UPDATE SET team = EXCLUDED.team, result = NULL, auto_assigned = FALSE
        RETURNING id
        "#,
    )
    .bind(game_id)
    .bind(round_id)
    .bind(participant_id)
    .bind(team)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

pub async fn fetch_pick(conn: &mut PgConnection, pick_id: PickId) -> GameResult<Pick> {
    let sql = format!("{PICK_SELECT} WHERE p.id = $1");
    let row = sqlx::query(&sql)
        .bind(pick_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(GameError::PickNotFound(pick_id))?;

    pick_from_row(&row)
}

/// Record a teamless pick for a participant who never picked
pub async fn insert_auto_pick(
    conn: &mut PgConnection,
    game_id: GameId,
    round_id: RoundId,
    participant_id: ParticipantId,
    result: PickResult,
) -> GameResult<()> {
    sqlx::query(
        r#"
        INSERT INTO picks (game_id, round_id, participant_id, team, result, auto_assigned)
        VALUES ($1, $2, $3, NULL, $4, TRUE)
        "#,
    )
    .bind(game_id)
    .bind(round_id)
    .bind(participant_id)
    .bind(result.as_str())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn set_pick_result(
    conn: &mut PgConnection,
    pick_id: PickId,
    result: PickResult,
) -> GameResult<()> {
    sqlx::query("UPDATE picks SET result = $1 WHERE id = $2")
        .bind(result.as_str())
        .bind(pick_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Remove auto-assigned picks and clear every other result in the round
pub async fn clear_round_results(conn: &mut PgConnection, round_id: RoundId) -> GameResult<()> {
    sqlx::query("DELETE FROM picks WHERE round_id = $1 AND auto_assigned")
        .bind(round_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("UPDATE picks SET result = NULL WHERE round_id = $1")
        .bind(round_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
