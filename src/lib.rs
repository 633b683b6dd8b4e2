//! Matrix Arena is a library for repeated two player matrix games.
//!
//! Two learners play Rock-Paper-Scissors, Matching Pennies or the
//! Prisoner's Dilemma against each other over and over, and the library
//! records how their mixed strategies move. Every random choice comes from
//! a seeded `Mulberry32`, so any run can be reproduced exactly.

/// Games, the deterministic rng and the strategy math that everything
/// else is built on.
pub mod core;
/// Streaming simulation: online learners advanced tick by tick, with
/// observers and a registry of live runs.
pub mod arena;
/// Batch evaluation of learner pairings across seeds and episodes.
pub mod evaluation;
/// Self-play policy gradient training, single or across workers.
pub mod selfplay;
