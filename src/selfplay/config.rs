use crate::core::{ConfigError, GameId, require_learning_rate, require_positive};

pub const DEFAULT_EPISODES: usize = 200;
pub const DEFAULT_STEPS_PER_EPISODE: usize = 50;
pub const DEFAULT_LEARNING_RATE: f64 = 0.05;
pub const DEFAULT_HIDDEN: usize = 16;
pub const DEFAULT_WORKERS: usize = 4;
pub const MAX_WORKERS: usize = 16;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct TrainConfig {
    pub game: GameId,
    pub seed: u32,
    pub episodes: usize,
    pub steps_per_ep: usize,
    pub lr: f64,
    pub hidden: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            game: GameId::RockPaperScissors,
            seed: 1,
            episodes: DEFAULT_EPISODES,
            steps_per_ep: DEFAULT_STEPS_PER_EPISODE,
            lr: DEFAULT_LEARNING_RATE,
            hidden: DEFAULT_HIDDEN,
        }
    }
}

impl TrainConfig {
    pub fn new(game: GameId, seed: u32) -> Self {
        Self {
            game,
            seed,
            ..Self::default()
        }
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

    pub fn with_hidden(mut self, hidden: usize) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("episodes", self.episodes)?;
        require_positive("stepsPerEp", self.steps_per_ep)?;
        require_positive("hidden", self.hidden)?;
        require_learning_rate(self.lr)
    }
}

/// `workers` independent trainers. Worker `i` uses seed
/// `train.seed + i` (wrapping), everything else is shared.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct DistributedConfig {
    pub workers: usize,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub train: TrainConfig,
}

impl Default for DistributedConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            train: TrainConfig::default(),
        }
    }
}

impl DistributedConfig {
    pub fn new(workers: usize, train: TrainConfig) -> Self {
        Self { workers, train }
    }

    pub fn base_seed(&self) -> u32 {
        self.train.seed
    }

    pub fn worker_seed(&self, index: usize) -> u32 {
        self.train.seed.wrapping_add(index as u32)
    }

    /// The config each worker trains with.
    pub fn worker_config(&self, index: usize) -> TrainConfig {
        TrainConfig {
            seed: self.worker_seed(index),
            ..self.train.clone()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_WORKERS).contains(&self.workers) {
            return Err(ConfigError::WorkersOutOfRange(self.workers));
        }
        self.train.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrainConfig::default();
        assert_eq!(200, config.episodes);
        assert_eq!(16, config.hidden);
        assert_eq!(0.05, config.lr);
        assert!(config.validate().is_ok());
        assert!(DistributedConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_hidden() {
        assert_eq!(
            Err(ConfigError::NonPositive {
                field: "hidden",
                value: 0
            }),
            TrainConfig::default().with_hidden(0).validate()
        );
    }

    #[test]
    fn test_worker_range() {
        for workers in [0, 17, 100] {
            assert_eq!(
                Err(ConfigError::WorkersOutOfRange(workers)),
                DistributedConfig::new(workers, TrainConfig::default()).validate()
            );
        }
        for workers in [1, 16] {
            assert!(
                DistributedConfig::new(workers, TrainConfig::default())
                    .validate()
                    .is_ok()
            );
        }
    }

    #[test]
    fn test_worker_seeds_wrap() {
        let config = DistributedConfig::new(3, TrainConfig::new(GameId::MatchingPennies, u32::MAX));
        assert_eq!(u32::MAX, config.worker_seed(0));
        assert_eq!(0, config.worker_seed(1));
        assert_eq!(1, config.worker_config(2).seed);
        assert_eq!(GameId::MatchingPennies, config.worker_config(2).game);
    }
}
