use ndarray::Array1;
use tracing::{event, trace_span};

use crate::core::{ConfigError, GameSpec, Mulberry32, Player};

use super::{Forward, Policy, TrainConfig};

/// One line of the training log.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct TrainingLogEntry {
    /// Starts at 1.
    pub episode: usize,
    pub avg_reward_a: f64,
    pub avg_reward_b: f64,
    /// Only for zero-sum games.
    pub win_a: Option<f64>,
}

/// The log of a finished single trainer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct TrainingRun {
    pub seed: u32,
    pub logs: Vec<TrainingLogEntry>,
}

struct Transition {
    observation: Array1<f64>,
    forward: Forward,
    action: usize,
    reward: f64,
}

/// `[1, one_hot(previous)]`, all zero after the bias on the first step.
fn observation(previous: Option<usize>, num_actions: usize) -> Array1<f64> {
    let mut obs = Array1::zeros(num_actions + 1);
    obs[0] = 1.0;
    if let Some(action) = previous {
        obs[action + 1] = 1.0;
    }
    obs
}

/// Two independent REINFORCE learners playing each other.
///
/// Each player sees the opponent's previous action and treats the opponent
/// as part of the environment. After each episode both policies take one
/// gradient step, using the episode's mean reward as the baseline.
pub struct SelfPlayTrainer {
    config: TrainConfig,
    game: &'static GameSpec,
    policy_a: Policy,
    policy_b: Policy,
    rng: Mulberry32,
    logs: Vec<TrainingLogEntry>,
}

impl SelfPlayTrainer {
    pub fn new(config: TrainConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let game = config.game.spec();
        let num_a = game.num_actions(Player::A);
        let num_b = game.num_actions(Player::B);

        let mut rng = Mulberry32::new(config.seed);
        let policy_a = Policy::new(num_b + 1, config.hidden, num_a, &mut rng);
        let policy_b = Policy::new(num_a + 1, config.hidden, num_b, &mut rng);

        Ok(Self {
            logs: Vec::with_capacity(config.episodes),
            config,
            game,
            policy_a,
            policy_b,
            rng,
        })
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn policy(&self, player: Player) -> &Policy {
        match player {
            Player::A => &self.policy_a,
            Player::B => &self.policy_b,
        }
    }

    pub fn logs(&self) -> &[TrainingLogEntry] {
        &self.logs
    }

    pub fn episodes_done(&self) -> usize {
        self.logs.len()
    }

    /// What `player` would play on the first step of an episode.
    pub fn opening_probs(&self, player: Player) -> Array1<f64> {
        let obs = observation(None, self.game.num_actions(player.opponent()));
        self.policy(player).action_probs(obs.view())
    }

    /// Roll out one episode, update both policies and log the episode.
    pub fn train_episode(&mut self) -> TrainingLogEntry {
        let steps = self.config.steps_per_ep;
        let num_a = self.game.num_actions(Player::A);
        let num_b = self.game.num_actions(Player::B);

        let mut traj_a = Vec::with_capacity(steps);
        let mut traj_b = Vec::with_capacity(steps);
        let mut previous: Option<(usize, usize)> = None;

        for _ in 0..steps {
            let obs_a = observation(previous.map(|(_, b)| b), num_b);
            let obs_b = observation(previous.map(|(a, _)| a), num_a);

            let (action_a, forward_a) = self.policy_a.act(obs_a.view(), &mut self.rng);
            let (action_b, forward_b) = self.policy_b.act(obs_b.view(), &mut self.rng);
            let (reward_a, reward_b) = self.game.payoff(action_a, action_b);

            traj_a.push(Transition {
                observation: obs_a,
                forward: forward_a,
                action: action_a,
                reward: reward_a,
            });
            traj_b.push(Transition {
                observation: obs_b,
                forward: forward_b,
                action: action_b,
                reward: reward_b,
            });
            previous = Some((action_a, action_b));
        }

        let avg_reward_a = Self::reinforce(&mut self.policy_a, &traj_a, self.config.lr);
        let avg_reward_b = Self::reinforce(&mut self.policy_b, &traj_b, self.config.lr);

        let entry = TrainingLogEntry {
            episode: self.logs.len() + 1,
            avg_reward_a,
            avg_reward_b,
            win_a: self.game.zero_sum.then(|| (avg_reward_a + 1.0) / 2.0),
        };
        event!(
            tracing::Level::TRACE,
            episode = entry.episode,
            avg_reward_a,
            avg_reward_b,
            "Trained episode"
        );
        self.logs.push(entry.clone());
        entry
    }

    /// One policy gradient step from a whole episode. Returns the mean
    /// reward, which is also the baseline.
    fn reinforce(policy: &mut Policy, trajectory: &[Transition], lr: f64) -> f64 {
        let steps = trajectory.len() as f64;
        let baseline = trajectory.iter().map(|t| t.reward).sum::<f64>() / steps;

        let mut grad = policy.zero_gradient();
        for t in trajectory {
            policy.accumulate(
                &mut grad,
                t.observation.view(),
                &t.forward,
                t.action,
                t.reward - baseline,
            );
        }
        policy.apply(&grad, lr / steps);
        baseline
    }

    /// Train all the configured episodes that are left.
    pub fn train(mut self) -> TrainingRun {
        let span = trace_span!("SelfPlayTrainer::train", seed = self.config.seed, game = %self.config.game);
        let _enter = span.enter();

        while self.logs.len() < self.config.episodes {
            let entry = self.train_episode();
            if entry.episode % 50 == 0 {
                event!(
                    tracing::Level::DEBUG,
                    episode = entry.episode,
                    avg_reward_a = entry.avg_reward_a,
                    avg_reward_b = entry.avg_reward_b,
                    "Training progress"
                );
            }
        }
        TrainingRun {
            seed: self.config.seed,
            logs: self.logs,
        }
    }
}
