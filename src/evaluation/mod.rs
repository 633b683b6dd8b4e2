//! Batch evaluation of one pairing of learning rules.
//!
//! An `Evaluator` plays every (seed, episode) pair of its `EvalConfig`,
//! scores each episode as a `MetricRow`, and summarizes the rows with the
//! mean and population standard deviation of every metric.
//!
//! ```
//! use matrix_arena::arena::Algorithm;
//! use matrix_arena::core::GameId;
//! use matrix_arena::evaluation::{EvalConfig, Evaluator, NullSink};
//!
//! let config = EvalConfig::new(
//!     GameId::PrisonersDilemma,
//!     Algorithm::Hedge,
//!     Algorithm::FictitiousPlay,
//! )
//! .with_seeds(vec![1, 2])
//! .with_episodes(5);
//!
//! let report = Evaluator::new(config).unwrap().run(&mut NullSink);
//! assert_eq!(10, report.rows.len());
//! assert!(report.summary.coop_rate.is_some());
//! ```
mod config;
mod evaluator;
mod metrics;
mod sink;

pub use config::{
    DEFAULT_EPISODES, DEFAULT_LEARNING_RATE, DEFAULT_STEPS_PER_EPISODE, EvalConfig,
};
pub use evaluator::{EpisodeTrace, EvalReport, Evaluator, TraceStep};
pub use metrics::{MetricRow, MetricStat, SummaryRow};
#[cfg(feature = "serde")]
pub use sink::{JsonLinesSink, SinkRecord};
pub use sink::{MetricSink, NullSink, SinkError, SinkStorage, VecSink};
