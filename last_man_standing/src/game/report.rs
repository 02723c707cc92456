//! Public, read-only per-round summary of a game.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::models::{Game, GameId, GameStatus, Participant, Pick, Round, RoundStatus};

/// How many participants picked a team in one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamCount {
    pub team: String,
    pub picks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundReport {
    pub round_number: i32,
    pub status: RoundStatus,
    pub total_picks: usize,
    pub auto_assigned: usize,
    /// Most picked first
    pub team_counts: Vec<TeamCount>,
    /// Names of participants currently recorded as eliminated in this round
    pub eliminated: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameReport {
    pub game_id: GameId,
    pub name: String,
    pub group_name: Option<String>,
    pub status: GameStatus,
    pub winner_name: Option<String>,
    pub participants: usize,
    pub active: usize,
    pub rounds: Vec<RoundReport>,
}

/// Summarize one round from its picks and the game's participants
pub fn summarize_round(round: &Round, picks: &[Pick], participants: &[Participant]) -> RoundReport {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut total_picks = 0;
    let mut auto_assigned = 0;

    for pick in picks.iter().filter(|p| p.round_id == round.id) {
        total_picks += 1;
        if pick.auto_assigned {
            auto_assigned += 1;
        }
        if let Some(team) = pick.team.as_deref() {
            *counts.entry(team).or_default() += 1;
        }
    }

    let mut team_counts: Vec<TeamCount> = counts
        .into_iter()
        .map(|(team, picks)| TeamCount {
            team: team.to_string(),
            picks,
        })
        .collect();
    // Stable sort keeps alphabetical order among equal counts.
    team_counts.sort_by(|a, b| b.picks.cmp(&a.picks));

    let mut eliminated: Vec<String> = participants
        .iter()
        .filter(|p| p.eliminated_in_round == Some(round.round_number))
        .map(|p| p.name.clone())
        .collect();
    eliminated.sort();

    RoundReport {
        round_number: round.round_number,
        status: round.status,
        total_picks,
        auto_assigned,
        team_counts,
        eliminated,
    }
}

/// Build the full report
pub fn build_report(
    game: &Game,
    participants: &[Participant],
    rounds: &[Round],
    picks: &[Pick],
) -> GameReport {
    GameReport {
        game_id: game.id,
        name: game.name.clone(),
        group_name: game.group_name.clone(),
        status: game.status,
        winner_name: game.winner_name.clone(),
        participants: participants.len(),
        active: participants.iter().filter(|p| p.is_active).count(),
        rounds: rounds
            .iter()
            .map(|round| summarize_round(round, picks, participants))
            .collect(),
    }
}
