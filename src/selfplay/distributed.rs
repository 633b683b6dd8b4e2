use rayon::prelude::*;
use tracing::{event, info_span};

use crate::core::ConfigError;

use super::{DistributedConfig, SelfPlayTrainer, TrainConfig, TrainingLogEntry, TrainingRun};

/// One worker's finished run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct WorkerRun {
    pub worker: usize,
    pub seed: u32,
    pub logs: Vec<TrainingLogEntry>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct DistributedRun {
    pub workers: usize,
    pub base_seed: u32,
    pub runs: Vec<WorkerRun>,
    pub aggregated_logs: Vec<TrainingLogEntry>,
}

/// Mean of every worker's log entry at each episode.
///
/// `win_a` is averaged over the workers that reported one and left out
/// when none did. Logs are aligned by position and cut to the shortest.
pub fn aggregate_logs(runs: &[WorkerRun]) -> Vec<TrainingLogEntry> {
    let episodes = runs.iter().map(|r| r.logs.len()).min().unwrap_or(0);
    (0..episodes)
        .map(|i| {
            let entries: Vec<&TrainingLogEntry> = runs.iter().map(|r| &r.logs[i]).collect();
            let n = entries.len() as f64;
            let wins: Vec<f64> = entries.iter().filter_map(|e| e.win_a).collect();
            TrainingLogEntry {
                episode: i + 1,
                avg_reward_a: entries.iter().map(|e| e.avg_reward_a).sum::<f64>() / n,
                avg_reward_b: entries.iter().map(|e| e.avg_reward_b).sum::<f64>() / n,
                win_a: (!wins.is_empty())
                    .then(|| wins.iter().sum::<f64>() / wins.len() as f64),
            }
        })
        .collect()
}

/// Train `config.workers` independent trainers in parallel and aggregate
/// their logs.
///
/// Workers share nothing, and results are collected in worker order, so
/// the output is the same however rayon schedules them.
pub fn train_distributed(config: &DistributedConfig) -> Result<DistributedRun, ConfigError> {
    config.validate()?;
    let span = info_span!(
        "train_distributed",
        workers = config.workers,
        base_seed = config.base_seed()
    );
    let _enter = span.enter();

    let trainers = (0..config.workers)
        .map(|i| SelfPlayTrainer::new(config.worker_config(i)))
        .collect::<Result<Vec<_>, _>>()?;

    let runs: Vec<WorkerRun> = trainers
        .into_par_iter()
        .enumerate()
        .map(|(worker, trainer)| {
            let TrainingRun { seed, logs } = trainer.train();
            event!(
                tracing::Level::INFO,
                worker,
                seed,
                final_reward_a = logs.last().map(|e| e.avg_reward_a),
                "Worker finished"
            );
            WorkerRun { worker, seed, logs }
        })
        .collect();

    Ok(DistributedRun {
        workers: config.workers,
        base_seed: config.base_seed(),
        aggregated_logs: aggregate_logs(&runs),
        runs,
    })
}

/// Either kind of training result. Check which one with a `match`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "mode", rename_all = "camelCase"))]
pub enum TrainingOutcome {
    Single(TrainingRun),
    Distributed(DistributedRun),
}

impl TrainingOutcome {
    /// The single run's log, or the aggregated one.
    pub fn logs(&self) -> &[TrainingLogEntry] {
        match self {
            TrainingOutcome::Single(run) => &run.logs,
            TrainingOutcome::Distributed(run) => &run.aggregated_logs,
        }
    }
}

/// Train once with `config`, or across `workers` trainers when given.
pub fn train(config: TrainConfig, workers: Option<usize>) -> Result<TrainingOutcome, ConfigError> {
    match workers {
        None => Ok(TrainingOutcome::Single(SelfPlayTrainer::new(config)?.train())),
        Some(workers) => Ok(TrainingOutcome::Distributed(train_distributed(
            &DistributedConfig::new(workers, config),
        )?)),
    }
}
