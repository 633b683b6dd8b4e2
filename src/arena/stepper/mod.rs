//! `Stepper`s are the online-learning rules that drive both players in the
//! arena and in the evaluator. Each one owns its own state and maps the
//! opponent's current strategy to this player's next strategy.
//!
//! Three rules are provided: multiplicative weights (`Hedge`),
//! `RegretMatching` and `FictitiousPlay`.
mod fictitious;
mod hedge;
mod regret;

use std::{fmt, str::FromStr};

use ndarray::{ArrayView1, ArrayView2};

use crate::core::{ConfigError, Strategy};

/// Below this a sum is treated as zero.
pub const EPSILON: f64 = 1e-12;

/// This is the trait that every learning rule implements.
///
/// Steppers are pure state machines. They have no side effects beyond their
/// own state, and that state is owned by exactly one player in one run.
pub trait Stepper: Send {
    /// Produce the next strategy.
    ///
    /// # Arguments
    /// - `current` - The strategy this player is playing right now.
    /// - `opponent` - The opponent's current strategy.
    /// - `payoff` - This player's payoff matrix, rows are this player's
    ///   actions and columns are the opponent's.
    fn step(
        &mut self,
        current: ArrayView1<'_, f64>,
        opponent: ArrayView1<'_, f64>,
        payoff: ArrayView2<'_, f64>,
    ) -> Strategy;

    /// Which rule this is.
    fn algorithm(&self) -> Algorithm;
}

/// The learning rules selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Algorithm {
    #[cfg_attr(feature = "serde", serde(rename = "hedge"))]
    Hedge,
    #[cfg_attr(feature = "serde", serde(rename = "regret"))]
    RegretMatching,
    #[cfg_attr(feature = "serde", serde(rename = "fp"))]
    FictitiousPlay,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [
        Algorithm::Hedge,
        Algorithm::RegretMatching,
        Algorithm::FictitiousPlay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Hedge => "hedge",
            Algorithm::RegretMatching => "regret",
            Algorithm::FictitiousPlay => "fp",
        }
    }

    /// Build a fresh stepper for a player with `num_actions` actions.
    ///
    /// `learning_rate` is the Hedge step size and the fictitious play
    /// inverse temperature. Regret matching ignores it.
    pub fn build(&self, num_actions: usize, learning_rate: f64) -> Box<dyn Stepper> {
        match self {
            Algorithm::Hedge => Box::new(Hedge::new(num_actions, learning_rate)),
            Algorithm::RegretMatching => Box::new(RegretMatching::new(num_actions)),
            Algorithm::FictitiousPlay => Box::new(FictitiousPlay::new(num_actions, learning_rate)),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hedge" => Ok(Algorithm::Hedge),
            "regret" => Ok(Algorithm::RegretMatching),
            "fp" => Ok(Algorithm::FictitiousPlay),
            _ => Err(ConfigError::UnknownAlgorithm(s.to_string())),
        }
    }
}

pub use fictitious::FictitiousPlay;
pub use hedge::Hedge;
pub use regret::RegretMatching;
