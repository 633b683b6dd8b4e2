use crate::arena::Algorithm;
use crate::core::{ConfigError, GameId, require_learning_rate, require_positive};

pub const DEFAULT_EPISODES: usize = 10;
pub const DEFAULT_STEPS_PER_EPISODE: usize = 50;
pub const DEFAULT_LEARNING_RATE: f64 = 0.5;

/// Everything that determines the metric rows of an evaluation. Two
/// evaluations with equal configs produce identical rows.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct EvalConfig {
    pub game: GameId,
    pub alg_a: Algorithm,
    pub alg_b: Algorithm,
    pub seeds: Vec<u32>,
    pub episodes: usize,
    pub steps_per_ep: usize,
    pub lr: f64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            game: GameId::RockPaperScissors,
            alg_a: Algorithm::Hedge,
            alg_b: Algorithm::Hedge,
            seeds: vec![1],
            episodes: DEFAULT_EPISODES,
            steps_per_ep: DEFAULT_STEPS_PER_EPISODE,
            lr: DEFAULT_LEARNING_RATE,
        }
    }
}

impl EvalConfig {
    pub fn new(game: GameId, alg_a: Algorithm, alg_b: Algorithm) -> Self {
        Self {
            game,
            alg_a,
            alg_b,
            ..Self::default()
        }
    }

    pub fn with_seeds(mut self, seeds: Vec<u32>) -> Self {
        self.seeds = seeds;
        self
    }

    pub fn with_episodes(mut self, episodes: usize) -> Self {
        self.episodes = episodes;
        self
    }

    pub fn with_steps_per_ep(mut self, steps_per_ep: usize) -> Self {
        self.steps_per_ep = steps_per_ep;
        self
    }

    pub fn with_lr(mut self, lr: f64) -> Self {
        self.lr = lr;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.seeds.is_empty() {
            return Err(ConfigError::NoSeeds);
        }
        require_positive("episodes", self.episodes)?;
        require_positive("stepsPerEp", self.steps_per_ep)?;
        require_learning_rate(self.lr)
    }
}
