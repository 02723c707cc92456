//! Round advancement rules.
//!
//! Everything here is pure: the manager loads an [`AdvanceInput`] snapshot
//! inside its transaction, asks [`decide`] what to do, and applies the
//! returned [`AdvanceDecision`].

use super::models::{GameSettings, PickResult, RolloverMode, WinnerMode};

/// Whether a pick result knocks its participant out.
///
/// Losses and draws always eliminate; a postponed fixture eliminates unless
/// the game counts postponements as wins.
pub fn eliminates(result: PickResult, postpone_as_win: bool) -> bool {
    match result {
        PickResult::Win => false,
        PickResult::Loss | PickResult::Draw => true,
        PickResult::Postponed => !postpone_as_win,
    }
}

/// Participant counts after the latest round closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceInput {
    /// Number of the round that just closed
    pub current_round: i32,
    /// Participants still active
    pub active: usize,
    /// Participants whose `eliminated_in_round` is `current_round`
    pub eliminated_this_round: usize,
}

/// Who is declared the winner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winners {
    /// Everyone still active
    Survivors,
    /// Everyone knocked out together in the closing round
    EliminatedThisRound,
}

/// What advancing should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceDecision {
    /// Mark the game completed
    Complete(Winners),
    /// Apply the rollover (if any), then open `round_number`
    OpenRound {
        round_number: i32,
        rollover: Option<RolloverMode>,
    },
}

impl AdvanceDecision {
    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            AdvanceDecision::Complete(Winners::Survivors) => "completed",
            AdvanceDecision::Complete(Winners::EliminatedThisRound) => "completed_joint",
            AdvanceDecision::OpenRound { rollover: None, .. } => "next_round",
            AdvanceDecision::OpenRound {
                rollover: Some(RolloverMode::Round),
                ..
            } => "rollover_round",
            AdvanceDecision::OpenRound {
                rollover: Some(RolloverMode::Game),
                ..
            } => "rollover_game",
        }
    }
}

/// Decide the outcome of advancing a game whose latest round is closed.
pub fn decide(input: &AdvanceInput, settings: &GameSettings) -> AdvanceDecision {
    let max_winners = settings.max_winners.max(1) as usize;

    match settings.winner_mode {
        WinnerMode::Single => match input.active {
            1 => AdvanceDecision::Complete(Winners::Survivors),
            0 => rollover(input, settings.rollover_mode),
            _ => next_round(input),
        },
        WinnerMode::Multiple => {
            if (1..=max_winners).contains(&input.active) {
                AdvanceDecision::Complete(Winners::Survivors)
            } else if input.active == 0 && (1..=max_winners).contains(&input.eliminated_this_round)
            {
                AdvanceDecision::Complete(Winners::EliminatedThisRound)
            } else if input.active == 0 {
                rollover(input, settings.rollover_mode)
            } else {
                next_round(input)
            }
        }
    }
}

fn next_round(input: &AdvanceInput) -> AdvanceDecision {
    AdvanceDecision::OpenRound {
        round_number: input.current_round + 1,
        rollover: None,
    }
}

fn rollover(input: &AdvanceInput, mode: RolloverMode) -> AdvanceDecision {
    // Nothing to undo in the closing round: only a full restart helps.
    let mode = if input.eliminated_this_round == 0 {
        RolloverMode::Game
    } else {
        mode
    };

    match mode {
        RolloverMode::Round => AdvanceDecision::OpenRound {
            round_number: input.current_round + 1,
            rollover: Some(RolloverMode::Round),
        },
        RolloverMode::Game => AdvanceDecision::OpenRound {
            round_number: 1,
            rollover: Some(RolloverMode::Game),
        },
    }
}
