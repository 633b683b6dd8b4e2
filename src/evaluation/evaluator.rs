use tracing::{event, trace_span};
use uuid::Uuid;

use crate::arena::{Duel, StepOutcome};
use crate::core::{ConfigError, GameSpec, Mulberry32, Player, l2_distance, uniform};

use super::{EvalConfig, MetricRow, MetricSink, SummaryRow};

/// The result of one evaluation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct EvalReport {
    pub run_id: Uuid,
    pub config: EvalConfig,
    pub rows: Vec<MetricRow>,
    pub summary: SummaryRow,
    /// False if the sink failed part way and was dropped.
    pub persisted: bool,
}

/// One step of a traced episode. The strategies are the ones the actions
/// were sampled from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct TraceStep {
    pub t: usize,
    pub action_a: usize,
    pub action_b: usize,
    pub reward_a: f64,
    pub reward_b: f64,
    pub strategy_a: Vec<f64>,
    pub strategy_b: Vec<f64>,
}

/// The full history of one episode plus the metrics it produced.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct EpisodeTrace {
    pub metrics: MetricRow,
    pub steps: Vec<TraceStep>,
}

/// Runs every (seed, episode) pair of an `EvalConfig`.
///
/// Each seed gets its own `Mulberry32` stream and that seed's episodes
/// consume it in order, so a seed's rows only depend on the seed and the
/// config. Every episode starts from fresh steppers and uniform strategies.
#[derive(Debug, Clone)]
pub struct Evaluator {
    config: EvalConfig,
    game: &'static GameSpec,
}

impl Evaluator {
    pub fn new(config: EvalConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let game = config.game.spec();
        Ok(Self { config, game })
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Compute all the rows and the summary, handing each to `sink` as it
    /// is produced.
    ///
    /// A failing sink is dropped with a warning and the evaluation carries
    /// on. `EvalReport::persisted` tells the caller.
    pub fn run(&self, sink: &mut dyn MetricSink) -> EvalReport {
        let run_id = Uuid::new_v4();
        let span = trace_span!("Evaluator::run", %run_id, game = %self.config.game);
        let _enter = span.enter();

        let mut sink = Some(sink);
        let mut rows = Vec::with_capacity(self.config.seeds.len() * self.config.episodes);

        for &seed in &self.config.seeds {
            let mut rng = Mulberry32::new(seed);
            for ep in 0..self.config.episodes {
                let row = self.play_episode(seed, ep, &mut rng, |_, _, _| {});
                event!(
                    tracing::Level::DEBUG,
                    seed,
                    ep,
                    avg_reward_a = row.avg_reward_a,
                    "Episode evaluated"
                );
                if let Some(s) = sink.as_mut() {
                    if let Err(error) = s.insert_metric_row(&run_id, &row) {
                        event!(tracing::Level::WARN, ?error, "Dropping failed metric sink");
                        sink = None;
                    }
                }
                rows.push(row);
            }
        }

        let summary = SummaryRow::from_rows(&rows);
        if let Some(s) = sink.as_mut() {
            if let Err(error) = s.insert_summary_row(&run_id, &summary) {
                event!(tracing::Level::WARN, ?error, "Dropping failed metric sink");
                sink = None;
            }
        }

        event!(
            tracing::Level::INFO,
            rows = rows.len(),
            "Evaluation complete"
        );
        EvalReport {
            run_id,
            config: self.config.clone(),
            rows,
            summary,
            persisted: sink.is_some(),
        }
    }

    /// Replay one episode of `seed` step by step.
    ///
    /// The earlier episodes of the seed are replayed silently first, so the
    /// trace matches the row `run` produces for the same (seed, episode).
    pub fn trace(&self, seed: u32, episode: usize) -> EpisodeTrace {
        let mut rng = Mulberry32::new(seed);
        for ep in 0..episode {
            self.play_episode(seed, ep, &mut rng, |_, _, _| {});
        }

        let mut steps = Vec::with_capacity(self.config.steps_per_ep);
        let metrics = self.play_episode(seed, episode, &mut rng, |t, outcome, duel| {
            steps.push(TraceStep {
                t,
                action_a: outcome.action_a,
                action_b: outcome.action_b,
                reward_a: outcome.reward_a,
                reward_b: outcome.reward_b,
                strategy_a: duel.strategy(Player::A).to_vec(),
                strategy_b: duel.strategy(Player::B).to_vec(),
            });
        });
        EpisodeTrace { metrics, steps }
    }

    fn play_episode<F>(&self, seed: u32, ep: usize, rng: &mut Mulberry32, mut on_step: F) -> MetricRow
    where
        F: FnMut(usize, &StepOutcome, &Duel),
    {
        let mut duel = Duel::new(
            self.game,
            self.config.alg_a,
            self.config.alg_b,
            self.config.lr,
        );
        let cooperate = self.game.cooperative_action();
        let mut total_a = 0.0;
        let mut cooperated = 0usize;

        for t in 0..self.config.steps_per_ep {
            let outcome = duel.step(rng);
            total_a += outcome.reward_a;
            if outcome.action_a == cooperate {
                cooperated += 1;
            }
            on_step(t, &outcome, &duel);
        }

        let steps = self.config.steps_per_ep as f64;
        let avg_reward_a = total_a / steps;
        if self.game.zero_sum {
            let final_a = duel.strategy(Player::A);
            MetricRow {
                seed,
                ep,
                win_a: Some((avg_reward_a + 1.0) / 2.0),
                avg_reward_a,
                coop_rate: None,
                l2_dist: Some(l2_distance(final_a.view(), uniform(final_a.len()).view())),
            }
        } else {
            MetricRow {
                seed,
                ep,
                win_a: None,
                avg_reward_a,
                coop_rate: Some(cooperated as f64 / steps),
                l2_dist: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use crate::arena::Algorithm;
    use crate::core::GameId;
    use crate::evaluation::{NullSink, SinkError, VecSink};

    use super::*;

    fn config(game: GameId) -> EvalConfig {
        EvalConfig::new(game, Algorithm::Hedge, Algorithm::RegretMatching)
            .with_seeds(vec![1, 2, 3])
            .with_episodes(4)
            .with_steps_per_ep(30)
    }

    #[test_log::test]
    fn test_identical_configs_identical_rows() {
        let one = Evaluator::new(config(GameId::MatchingPennies)).unwrap();
        let two = Evaluator::new(config(GameId::MatchingPennies)).unwrap();
        let first = one.run(&mut NullSink);
        let second = two.run(&mut NullSink);
        assert_eq!(first.rows, second.rows);
        assert_ne!(first.run_id, second.run_id);
        assert_eq!(12, first.rows.len());
    }

    #[test]
    fn test_seed_rows_independent_of_other_seeds() {
        let all = Evaluator::new(config(GameId::RockPaperScissors))
            .unwrap()
            .run(&mut NullSink);
        let only_two = Evaluator::new(config(GameId::RockPaperScissors).with_seeds(vec![2]))
            .unwrap()
            .run(&mut NullSink);
        let seed_two: Vec<MetricRow> = all.rows.into_iter().filter(|r| r.seed == 2).collect();
        assert_eq!(seed_two, only_two.rows);
    }

    #[test]
    fn test_pd_rows_fill_coop_rate() {
        let report = Evaluator::new(config(GameId::PrisonersDilemma))
            .unwrap()
            .run(&mut NullSink);
        for row in &report.rows {
            let coop = row.coop_rate.unwrap();
            assert!((0.0..=1.0).contains(&coop));
            assert!(row.win_a.is_none());
            assert!(row.l2_dist.is_none());
        }
        assert!(report.summary.coop_rate.is_some());
        assert!(report.summary.win_a.is_none());
    }

    #[test]
    fn test_zero_sum_rows_fill_win_and_distance() {
        for game in [GameId::RockPaperScissors, GameId::MatchingPennies] {
            let report = Evaluator::new(config(game)).unwrap().run(&mut NullSink);
            for row in &report.rows {
                let win = row.win_a.unwrap();
                assert_abs_diff_eq!((row.avg_reward_a + 1.0) / 2.0, win, epsilon = 1e-12);
                assert!(row.l2_dist.unwrap() >= 0.0);
                assert!(row.coop_rate.is_none());
            }
        }
    }

    #[test]
    fn test_rows_reach_sink_in_order() {
        let storage = VecSink::new_storage();
        let report = Evaluator::new(config(GameId::PrisonersDilemma))
            .unwrap()
            .run(&mut VecSink::new(storage.clone()));
        assert!(report.persisted);

        let storage = storage.lock().unwrap();
        let rows: Vec<MetricRow> = storage.metric_rows.iter().map(|(_, r)| r.clone()).collect();
        assert_eq!(report.rows, rows);
        assert_eq!(1, storage.summary_rows.len());
        assert_eq!(report.run_id, storage.summary_rows[0].0);
    }

    #[test]
    fn test_trace_matches_row() {
        let evaluator = Evaluator::new(config(GameId::PrisonersDilemma)).unwrap();
        let report = evaluator.run(&mut NullSink);
        let trace = evaluator.trace(3, 2);

        let row = report
            .rows
            .iter()
            .find(|r| r.seed == 3 && r.ep == 2)
            .unwrap();
        assert_eq!(row, &trace.metrics);
        assert_eq!(30, trace.steps.len());

        let mean: f64 = trace.steps.iter().map(|s| s.reward_a).sum::<f64>() / 30.0;
        assert_abs_diff_eq!(row.avg_reward_a, mean, epsilon = 1e-12);
        for step in &trace.steps {
            assert_abs_diff_eq!(1.0, step.strategy_a.iter().sum::<f64>(), epsilon = 1e-9);
        }
    }

    /// Accepts one metric row then fails, counting every call it gets.
    #[derive(Default)]
    struct BrokenSink {
        metric_calls: usize,
        summary_calls: usize,
    }

    impl MetricSink for BrokenSink {
        fn insert_metric_row(&mut self, _run_id: &Uuid, _row: &MetricRow) -> Result<(), SinkError> {
            self.metric_calls += 1;
            if self.metric_calls >= 2 {
                return Err(SinkError::Io(std::io::Error::other("disk full")));
            }
            Ok(())
        }

        fn insert_summary_row(&mut self, _run_id: &Uuid, _row: &SummaryRow) -> Result<(), SinkError> {
            self.summary_calls += 1;
            Ok(())
        }
    }

    #[test_log::test]
    fn test_failing_sink_is_dropped() {
        let mut sink = BrokenSink::default();
        let report = Evaluator::new(config(GameId::MatchingPennies))
            .unwrap()
            .run(&mut sink);

        assert!(!report.persisted);
        assert_eq!(12, report.rows.len());
        assert_eq!(12, report.summary.rows);
        // Nothing after the failing call.
        assert_eq!(2, sink.metric_calls);
        assert_eq!(0, sink.summary_calls);

        let clean = Evaluator::new(config(GameId::MatchingPennies))
            .unwrap()
            .run(&mut NullSink);
        assert_eq!(clean.rows, report.rows);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert_eq!(
            Some(ConfigError::NoSeeds),
            Evaluator::new(config(GameId::MatchingPennies).with_seeds(vec![])).err()
        );
    }
}
