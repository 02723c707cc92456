//! Property-based tests for the round advancement engine.
//!
//! These tests drive `decide` through whole simulated games and check that the
//! participant bookkeeping the manager would apply never breaks.

use last_man_standing::game::{
    AdvanceDecision, AdvanceInput, GameSettings, PickResult, RolloverMode, WinnerMode, Winners,
    decide, eliminates,
};
use proptest::prelude::*;

fn winner_mode_strategy() -> impl Strategy<Value = WinnerMode> {
    prop_oneof![Just(WinnerMode::Single), Just(WinnerMode::Multiple)]
}

fn rollover_mode_strategy() -> impl Strategy<Value = RolloverMode> {
    prop_oneof![Just(RolloverMode::Round), Just(RolloverMode::Game)]
}

fn settings_strategy() -> impl Strategy<Value = GameSettings> {
    (
        winner_mode_strategy(),
        rollover_mode_strategy(),
        1u32..=5,
        any::<bool>(),
    )
        .prop_map(
            |(winner_mode, rollover_mode, max_winners, postpone_as_win)| GameSettings {
                winner_mode,
                rollover_mode,
                max_winners,
                postpone_as_win,
            },
        )
}

fn pick_result_strategy() -> impl Strategy<Value = PickResult> {
    prop_oneof![
        Just(PickResult::Win),
        Just(PickResult::Loss),
        Just(PickResult::Draw),
        Just(PickResult::Postponed),
    ]
}

/// Participant counts as the manager tracks them between rounds.
#[derive(Debug, Clone, Copy)]
struct Simulated {
    entrants: usize,
    active: usize,
    round: i32,
}

proptest! {
    #[test]
    fn test_win_never_eliminates(postpone_as_win in any::<bool>()) {
        prop_assert!(!eliminates(PickResult::Win, postpone_as_win));
    }

    #[test]
    fn test_postponed_follows_setting(result in pick_result_strategy()) {
        if result == PickResult::Postponed {
            prop_assert!(eliminates(result, false));
            prop_assert!(!eliminates(result, true));
        } else {
            prop_assert_eq!(eliminates(result, false), eliminates(result, true));
        }
    }

    #[test]
    fn test_more_than_max_survivors_always_opens_next_round(
        settings in settings_strategy(),
        round in 1i32..100,
        extra in 1usize..20,
        eliminated in 0usize..20,
    ) {
        let limit = match settings.winner_mode {
            WinnerMode::Single => 1,
            WinnerMode::Multiple => settings.max_winners as usize,
        };
        let input = AdvanceInput {
            current_round: round,
            active: limit + extra,
            eliminated_this_round: eliminated,
        };

        prop_assert_eq!(
            decide(&input, &settings),
            AdvanceDecision::OpenRound { round_number: round + 1, rollover: None }
        );
    }

    #[test]
    fn test_survivors_within_limit_complete(
        settings in settings_strategy(),
        round in 1i32..100,
        eliminated in 0usize..20,
    ) {
        let limit = match settings.winner_mode {
            WinnerMode::Single => 1,
            WinnerMode::Multiple => settings.max_winners as usize,
        };

        for active in 1..=limit {
            let input = AdvanceInput {
                current_round: round,
                active,
                eliminated_this_round: eliminated,
            };
            prop_assert_eq!(
                decide(&input, &settings),
                AdvanceDecision::Complete(Winners::Survivors)
            );
        }
    }

    #[test]
    fn test_rollover_targets_expected_round(
        settings in settings_strategy(),
        round in 1i32..100,
        eliminated in 0usize..20,
    ) {
        let input = AdvanceInput {
            current_round: round,
            active: 0,
            eliminated_this_round: eliminated,
        };

        match decide(&input, &settings) {
            AdvanceDecision::Complete(winners) => {
                prop_assert_eq!(settings.winner_mode, WinnerMode::Multiple);
                prop_assert_eq!(winners, Winners::EliminatedThisRound);
                prop_assert!(eliminated >= 1 && eliminated <= settings.max_winners as usize);
            }
            AdvanceDecision::OpenRound { round_number, rollover: Some(RolloverMode::Round) } => {
                prop_assert_eq!(settings.rollover_mode, RolloverMode::Round);
                prop_assert!(eliminated > 0);
                prop_assert_eq!(round_number, round + 1);
            }
            AdvanceDecision::OpenRound { round_number, rollover: Some(RolloverMode::Game) } => {
                prop_assert!(settings.rollover_mode == RolloverMode::Game || eliminated == 0);
                prop_assert_eq!(round_number, 1);
            }
            AdvanceDecision::OpenRound { rollover: None, .. } => {
                prop_assert!(false, "nobody active must never open a plain next round");
            }
        }
    }

    /// Play whole games where each round knocks out a random share of the
    /// field and apply every decision the way the manager does.
    #[test]
    fn test_simulated_games_keep_counts_consistent(
        settings in settings_strategy(),
        entrants in 2usize..40,
        losses in prop::collection::vec(0.0f64..=1.0, 1..40),
    ) {
        let mut state = Simulated { entrants, active: entrants, round: 1 };
        let mut completed = false;

        for share in losses {
            let eliminated = ((state.active as f64) * share).round() as usize;
            let eliminated = eliminated.min(state.active);
            state.active -= eliminated;

            let input = AdvanceInput {
                current_round: state.round,
                active: state.active,
                eliminated_this_round: eliminated,
            };

            match decide(&input, &settings) {
                AdvanceDecision::Complete(Winners::Survivors) => {
                    prop_assert!(state.active >= 1);
                    if settings.winner_mode == WinnerMode::Single {
                        prop_assert_eq!(state.active, 1);
                    }
                    completed = true;
                }
                AdvanceDecision::Complete(Winners::EliminatedThisRound) => {
                    // Joint winners are reactivated.
                    state.active += eliminated;
                    prop_assert!(state.active >= 1);
                    completed = true;
                }
                AdvanceDecision::OpenRound { round_number, rollover } => {
                    match rollover {
                        Some(RolloverMode::Round) => {
                            state.active += eliminated;
                            prop_assert_eq!(round_number, state.round + 1);
                        }
                        Some(RolloverMode::Game) => {
                            state.active = state.entrants;
                            prop_assert_eq!(round_number, 1);
                        }
                        None => {
                            prop_assert!(state.active >= 2);
                            prop_assert_eq!(round_number, state.round + 1);
                        }
                    }
                    state.round = round_number;
                    prop_assert!(state.active >= 1, "a new round always has someone to play");
                }
            }

            prop_assert!(state.active <= state.entrants);
            if completed {
                break;
            }
        }
    }
}
