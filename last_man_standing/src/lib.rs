//! # Last Man Standing
//!
//! Backend library for managed elimination games ("last man standing" and
//! sweepstakes knockouts).
//!
//! ## Core Modules
//!
//! - [`game`]: data model, round advancement engine, and the transactional
//!   [`GameManager`](game::GameManager)
//! - [`auth`]: manager accounts, JWT access tokens, capability checks
//! - [`db`]: PostgreSQL pool, migrations, timeouts

/// Database pool, configuration and repositories.
pub mod db;

/// Manager authentication and capability checks.
pub mod auth;

/// Managed games, rounds, picks and the advancement engine.
pub mod game;

pub use game::{GameError, GameManager, GameResult};
