//! Self-play policy gradient training.
//!
//! Both players own a small tanh network and learn with REINFORCE against
//! each other. The distributed mode trains several independently seeded
//! trainers on rayon's thread pool and averages their logs.
//!
//! ```
//! use matrix_arena::core::GameId;
//! use matrix_arena::selfplay::{TrainConfig, TrainingOutcome, train};
//!
//! let config = TrainConfig::new(GameId::MatchingPennies, 7).with_episodes(5);
//! match train(config, Some(2)).unwrap() {
//!     TrainingOutcome::Distributed(run) => {
//!         assert_eq!(2, run.runs.len());
//!         assert_eq!(5, run.aggregated_logs.len());
//!     }
//!     TrainingOutcome::Single(_) => unreachable!(),
//! }
//! ```
mod config;
mod distributed;
mod policy;
mod trainer;

pub use config::{
    DEFAULT_EPISODES, DEFAULT_HIDDEN, DEFAULT_LEARNING_RATE, DEFAULT_STEPS_PER_EPISODE,
    DEFAULT_WORKERS, DistributedConfig, MAX_WORKERS, TrainConfig,
};
pub use distributed::{
    DistributedRun, TrainingOutcome, WorkerRun, aggregate_logs, train, train_distributed,
};
pub use policy::{Forward, Policy, PolicyGradient};
pub use trainer::{SelfPlayTrainer, TrainingLogEntry, TrainingRun};
