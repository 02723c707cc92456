//! Managed game data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt, str::FromStr};

use crate::auth::UserId;

/// Game ID type
pub type GameId = i64;
/// Round ID type
pub type RoundId = i64;
/// Participant ID type
pub type ParticipantId = i64;
/// Pick ID type
pub type PickId = i64;

/// Longest accepted game, group, participant or team name
pub const MAX_NAME_LEN: usize = 128;

/// Separator used when several winners are recorded in one column
pub const WINNER_SEPARATOR: &str = ", ";

/// Value stored in a TEXT column could not be mapped back to an enum
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Enums persisted as lowercase TEXT columns.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum!(
    /// Lifecycle of a game
    GameStatus, "game status" {
        /// Rounds are still being played
        Active => "active",
        /// Winner(s) recorded
        Completed => "completed",
    }
);

text_enum!(
    /// How many participants may share the win
    WinnerMode, "winner mode" {
        /// Last participant standing wins
        Single => "single",
        /// Up to `max_winners` participants share the win
        Multiple => "multiple",
    }
);

text_enum!(
    /// Recovery applied when everyone still in is eliminated at once
    RolloverMode, "rollover mode" {
        /// Undo the round's eliminations and play another round
        Round => "round",
        /// Reactivate everyone and restart from round 1
        Game => "game",
    }
);

text_enum!(
    /// Whether a round still accepts picks
    RoundStatus, "round status" {
        Open => "open",
        Closed => "closed",
    }
);

text_enum!(
    /// Outcome of a participant's pick
    PickResult, "pick result" {
        Win => "win",
        Loss => "loss",
        Draw => "draw",
        Postponed => "postponed",
    }
);

/// Rules of a game, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    pub winner_mode: WinnerMode,
    pub rollover_mode: RolloverMode,
    /// Only consulted in [`WinnerMode::Multiple`]
    pub max_winners: u32,
    /// A postponed fixture counts as a win instead of a loss
    pub postpone_as_win: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            winner_mode: WinnerMode::Single,
            rollover_mode: RolloverMode::Round,
            max_winners: 1,
            postpone_as_win: false,
        }
    }
}

/// Elimination competition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: GameId,
    pub manager_id: UserId,
    pub name: String,
    pub group_name: Option<String>,
    pub status: GameStatus,
    #[serde(flatten)]
    pub settings: GameSettings,
    /// Winner names joined by [`WINNER_SEPARATOR`]
    pub winner_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Entrant in a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,
    pub game_id: GameId,
    pub name: String,
    pub is_active: bool,
    /// Set exactly when `is_active` is false
    pub eliminated_in_round: Option<i32>,
}

/// Numbered elimination phase
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub id: RoundId,
    pub game_id: GameId,
    pub round_number: i32,
    pub status: RoundStatus,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// A participant's selection for one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pick {
    pub id: PickId,
    pub game_id: GameId,
    pub round_id: RoundId,
    pub participant_id: ParticipantId,
    pub participant_name: String,
    /// `None` for picks auto-assigned to participants who never picked
    pub team: Option<String>,
    pub result: Option<PickResult>,
    pub auto_assigned: bool,
}

/// Game with its participants and rounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDetail {
    #[serde(flatten)]
    pub game: Game,
    pub participants: Vec<Participant>,
    pub rounds: Vec<Round>,
}

/// Round with its picks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundDetail {
    #[serde(flatten)]
    pub round: Round,
    pub picks: Vec<Pick>,
}

/// Request to set up a new game
#[derive(Debug, Clone)]
pub struct NewGame {
    pub name: String,
    pub group_name: Option<String>,
    pub players: Vec<String>,
    pub settings: GameSettings,
}

impl NewGame {
    /// Trim names and check the request, returning the cleaned-up copy.
    pub fn normalized(self) -> Result<Self, String> {
        let name = normalize_name(&self.name).ok_or("Game name is required")?;
        let group_name = match self.group_name.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(group) if group.len() > MAX_NAME_LEN => {
                return Err("Group name is too long".to_string());
            }
            Some(group) => Some(group.to_string()),
        };

        let mut seen = HashSet::new();
        let mut players = Vec::with_capacity(self.players.len());
        for player in &self.players {
            let player = normalize_name(player).ok_or("Player names must be 1-128 characters")?;
            if !seen.insert(player.to_lowercase()) {
                return Err(format!("Duplicate player name: {player}"));
            }
            players.push(player);
        }

        if players.len() < 2 {
            return Err("A game needs at least 2 players".to_string());
        }

        if self.settings.max_winners == 0 {
            return Err("maxWinners must be at least 1".to_string());
        }
        if i32::try_from(self.settings.max_winners).is_err() {
            return Err(format!("maxWinners must be at most {}", i32::MAX));
        }

        Ok(Self {
            name,
            group_name,
            players,
            settings: self.settings,
        })
    }
}

/// Trim a display name, rejecting empty and overlong ones
pub fn normalize_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_NAME_LEN {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// One result submitted when closing a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickResultEntry {
    pub pick_id: PickId,
    pub result: PickResult,
}

/// What closing a round did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseSummary {
    pub round_number: i32,
    pub eliminated: usize,
    pub survivors: usize,
    pub auto_assigned: usize,
}

/// What advancing a game did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum AdvanceOutcome {
    /// Game is (or already was) completed
    Completed { winner_name: String },
    /// A new open round exists
    NextRound {
        round_number: i32,
        rollover: Option<RolloverMode>,
    },
}
