//! This is the core module. Everything here is shared by the arena,
//! the evaluator and the self-play trainer.

/// game.rs has the payoff matrix registry.
mod game;
/// Re-export the game types.
pub use self::game::{GameId, GameSpec, Player};

/// Deterministic random numbers.
mod rng;
pub use self::rng::Mulberry32;

/// Numeric helpers for mixed strategies.
mod strategy;
/// Everything in there should be public.
pub use self::strategy::*;

/// Configuration errors.
mod error;
pub use self::error::ConfigError;
pub(crate) use self::error::{require_learning_rate, require_nonzero_duration, require_positive};
