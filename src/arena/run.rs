use std::time::Duration;

use ndarray::Array2;
use tracing::{event, trace_span};
use uuid::Uuid;

use crate::core::{GameId, GameSpec, Mulberry32, Player};

use super::{
    duel::Duel,
    errors::ArenaError,
    observer::{ObserverSet, SubscriptionId, TickObserver},
    stepper::Algorithm,
};

/// Lifecycle of an arena run.
///
/// `Created -> Running -> (Stopped | Disconnected)`. Both end states are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum ArenaStatus {
    Created,
    Running,
    Stopped,
    Disconnected,
}

impl ArenaStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, ArenaStatus::Stopped | ArenaStatus::Disconnected)
    }
}

/// Everything a listener gets after a tick.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ArenaSnapshot {
    pub run_id: Uuid,
    pub game: GameId,
    pub status: ArenaStatus,
    /// Total simulation steps played so far.
    pub iteration: u64,
    /// Rewards realized on the most recent step, zero before the first.
    pub last_reward_a: f64,
    pub last_reward_b: f64,
    pub strategy_a: Vec<f64>,
    pub strategy_b: Vec<f64>,
    /// `joint_counts[i][j]` is how often A played `i` while B played `j`.
    pub joint_counts: Vec<Vec<u64>>,
}

impl ArenaSnapshot {
    /// The joint action counts as frequencies. All zero before any step.
    pub fn joint_frequencies(&self) -> Vec<Vec<f64>> {
        let total = self.iteration.max(1) as f64;
        self.joint_counts
            .iter()
            .map(|row| row.iter().map(|c| *c as f64 / total).collect())
            .collect()
    }
}

/// One live arena simulation: both players learn with Hedge and play the
/// game over and over, a batch of steps per tick.
///
/// `ArenaRun` is synchronous. `tick` can be driven directly, or the run can
/// be wrapped in an `ArenaHandle` which schedules ticks on a tokio task.
pub struct ArenaRun {
    id: Uuid,
    game: &'static GameSpec,
    seed: u32,
    learning_rate: f64,
    steps_per_tick: usize,
    tick_interval: Duration,
    status: ArenaStatus,
    iteration: u64,
    duel: Duel,
    joint_counts: Array2<u64>,
    last_rewards: (f64, f64),
    rng: Mulberry32,
    observers: ObserverSet,
}

impl ArenaRun {
    pub(crate) fn new(
        game: &'static GameSpec,
        seed: u32,
        learning_rate: f64,
        steps_per_tick: usize,
        tick_interval: Duration,
        observers: ObserverSet,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            game,
            seed,
            learning_rate,
            steps_per_tick,
            tick_interval,
            status: ArenaStatus::Created,
            iteration: 0,
            duel: Duel::new(game, Algorithm::Hedge, Algorithm::Hedge, learning_rate),
            joint_counts: Array2::zeros((
                game.num_actions(Player::A),
                game.num_actions(Player::B),
            )),
            last_rewards: (0.0, 0.0),
            rng: Mulberry32::new(seed),
            observers,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn game(&self) -> &'static GameSpec {
        self.game
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn status(&self) -> ArenaStatus {
        self.status
    }

    pub fn steps_per_tick(&self) -> usize {
        self.steps_per_tick
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn num_observers(&self) -> usize {
        self.observers.len()
    }

    /// Move from `Created` to `Running`, with both players reset to
    /// uniform Hedge weights and the rng reset to the seed.
    pub fn start(&mut self) -> Result<(), ArenaError> {
        match self.status {
            ArenaStatus::Created => {
                self.duel = Duel::new(
                    self.game,
                    Algorithm::Hedge,
                    Algorithm::Hedge,
                    self.learning_rate,
                );
                self.joint_counts.fill(0);
                self.iteration = 0;
                self.last_rewards = (0.0, 0.0);
                self.rng = Mulberry32::new(self.seed);
                self.status = ArenaStatus::Running;
                event!(
                    tracing::Level::INFO,
                    run_id = %self.id,
                    game = %self.game.id,
                    seed = self.seed,
                    "Arena run started"
                );
                Ok(())
            }
            ArenaStatus::Running => Ok(()),
            ArenaStatus::Stopped | ArenaStatus::Disconnected => {
                Err(ArenaError::AlreadyFinished(self.id))
            }
        }
    }

    /// Play a single simulation step without notifying anyone.
    fn step(&mut self) {
        let outcome = self.duel.step(&mut self.rng);
        self.joint_counts[[outcome.action_a, outcome.action_b]] += 1;
        self.last_rewards = (outcome.reward_a, outcome.reward_b);
        self.iteration += 1;
    }

    /// Advance `steps_per_tick` steps then hand the snapshot to every
    /// observer. Observers that fail are detached; the tick itself still
    /// succeeds.
    pub fn tick(&mut self) -> Result<ArenaSnapshot, ArenaError> {
        if self.status != ArenaStatus::Running {
            return Err(ArenaError::NotRunning(self.id));
        }
        let span = trace_span!("ArenaRun::tick", run_id = %self.id);
        let _enter = span.enter();

        for _ in 0..self.steps_per_tick {
            self.step();
        }

        let snapshot = self.snapshot();
        let dropped = self.observers.notify(&snapshot);
        event!(
            tracing::Level::TRACE,
            iteration = self.iteration,
            dropped,
            "Arena tick"
        );
        Ok(snapshot)
    }

    /// The current state without advancing anything.
    pub fn snapshot(&self) -> ArenaSnapshot {
        ArenaSnapshot {
            run_id: self.id,
            game: self.game.id,
            status: self.status,
            iteration: self.iteration,
            last_reward_a: self.last_rewards.0,
            last_reward_b: self.last_rewards.1,
            strategy_a: self.duel.strategy(Player::A).to_vec(),
            strategy_b: self.duel.strategy(Player::B).to_vec(),
            joint_counts: self
                .joint_counts
                .rows()
                .into_iter()
                .map(|row| row.to_vec())
                .collect(),
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn TickObserver>) -> SubscriptionId {
        self.observers.add(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.remove(id)
    }

    /// Halt the run and release its observers.
    pub fn stop(&mut self) -> Result<(), ArenaError> {
        self.finish(ArenaStatus::Stopped)
    }

    /// The owning connection went away. Like `stop` but recorded
    /// differently.
    pub fn disconnect(&mut self) -> Result<(), ArenaError> {
        self.finish(ArenaStatus::Disconnected)
    }

    fn finish(&mut self, status: ArenaStatus) -> Result<(), ArenaError> {
        if self.status.is_finished() {
            return Err(ArenaError::AlreadyFinished(self.id));
        }
        self.status = status;
        self.observers.clear();
        event!(
            tracing::Level::INFO,
            run_id = %self.id,
            ?status,
            iteration = self.iteration,
            "Arena run finished"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use crate::arena::ArenaRunBuilder;

    use super::*;

    #[test_log::test]
    fn test_lifecycle() {
        let mut run = ArenaRunBuilder::default()
            .game(GameId::MatchingPennies)
            .build()
            .unwrap();
        assert_eq!(ArenaStatus::Created, run.status());
        assert_eq!(Err(ArenaError::NotRunning(run.id())), run.tick());

        run.start().unwrap();
        assert_eq!(ArenaStatus::Running, run.status());
        run.tick().unwrap();

        run.stop().unwrap();
        assert_eq!(ArenaStatus::Stopped, run.status());
        assert_eq!(Err(ArenaError::NotRunning(run.id())), run.tick());
        assert_eq!(Err(ArenaError::AlreadyFinished(run.id())), run.stop());
        assert_eq!(Err(ArenaError::AlreadyFinished(run.id())), run.start());
    }

    #[test]
    fn test_disconnect_releases_observers() {
        let mut run = ArenaRunBuilder::default()
            .game(GameId::RockPaperScissors)
            .observers(vec![Box::new(crate::arena::VecObserver::new(
                crate::arena::VecObserver::new_storage(),
            ))])
            .build()
            .unwrap();
        run.start().unwrap();
        run.disconnect().unwrap();
        assert_eq!(ArenaStatus::Disconnected, run.status());
        assert_eq!(0, run.num_observers());
    }

    #[test]
    fn test_snapshot_does_not_advance() {
        let mut run = ArenaRunBuilder::default()
            .game(GameId::RockPaperScissors)
            .seed(5)
            .build()
            .unwrap();
        run.start().unwrap();
        let ticked = run.tick().unwrap();
        assert_eq!(ticked, run.snapshot());
        assert_eq!(run.snapshot(), run.snapshot());
        assert_eq!(10, ticked.iteration);
    }

    #[test]
    fn test_same_seed_same_snapshots() {
        let build = || {
            let mut run = ArenaRunBuilder::default()
                .game(GameId::PrisonersDilemma)
                .seed(42)
                .steps_per_tick(7)
                .build()
                .unwrap();
            run.start().unwrap();
            run
        };
        let mut one = build();
        let mut two = build();
        for _ in 0..20 {
            let a = one.tick().unwrap();
            let b = two.tick().unwrap();
            assert_eq!(a.joint_counts, b.joint_counts);
            assert_eq!(a.strategy_a, b.strategy_a);
            assert_eq!(a.last_reward_a, b.last_reward_a);
        }
    }

    #[test]
    fn test_hedge_self_play_rps_is_uniform() {
        let mut run = ArenaRunBuilder::default()
            .game(GameId::RockPaperScissors)
            .seed(2024)
            .learning_rate(0.5)
            .steps_per_tick(1_000)
            .build()
            .unwrap();
        run.start().unwrap();
        let snapshot = run.tick().unwrap();
        assert_eq!(1_000, snapshot.iteration);

        for row in snapshot.joint_frequencies() {
            for cell in row {
                assert_abs_diff_eq!(1.0 / 9.0, cell, epsilon = 0.05);
            }
        }
    }

    #[test]
    fn test_joint_frequencies_before_play() {
        let run = ArenaRunBuilder::default()
            .game(GameId::MatchingPennies)
            .build()
            .unwrap();
        let freq = run.snapshot().joint_frequencies();
        assert_eq!(vec![vec![0.0, 0.0], vec![0.0, 0.0]], freq);
    }
}
