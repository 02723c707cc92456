//! Managed last-man-standing games.
//!
//! A manager creates a game, records each participant's pick for the open
//! round, closes the round with results (losers are eliminated), then
//! advances the game. Advancing either declares the winner(s), rolls over
//! when everyone fell at once, or opens the next round. A closed round can be
//! reopened to correct mistakes.
//!
//! ## Example
//!
//! ```no_run
//! use last_man_standing::db::Database;
//! use last_man_standing::game::{GameManager, GameSettings, NewGame};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let games = GameManager::new(Arc::new(db.pool().clone()));
//!
//!     let manager_id = 1;
//!     let detail = games
//!         .create_game(
//!             manager_id,
//!             NewGame {
//!                 name: "Office LMS".to_string(),
//!                 group_name: None,
//!                 players: vec!["Alice".to_string(), "Bob".to_string()],
//!                 settings: GameSettings::default(),
//!             },
//!         )
//!         .await?;
//!
//!     println!("Created game {}", detail.game.id);
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod errors;
pub mod manager;
pub mod models;
pub mod report;
pub mod store;

pub use engine::{AdvanceDecision, AdvanceInput, Winners, decide, eliminates};
pub use errors::{ErrorKind, GameError, GameResult};
pub use manager::GameManager;
pub use models::{
    AdvanceOutcome, CloseSummary, Game, GameDetail, GameId, GameSettings, GameStatus, NewGame,
    Participant, ParticipantId, Pick, PickId, PickResult, PickResultEntry, RolloverMode, Round,
    RoundDetail, RoundId, RoundStatus, WinnerMode,
};
pub use report::{GameReport, RoundReport, TeamCount};
