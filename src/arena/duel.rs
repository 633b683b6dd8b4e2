use crate::core::{GameSpec, Mulberry32, Player, Strategy, sample_action, uniform};

use super::stepper::{Algorithm, Stepper};

/// What happened in one step of play.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub action_a: usize,
    pub action_b: usize,
    pub reward_a: f64,
    pub reward_b: f64,
}

/// Two steppers playing a repeated matrix game against each other.
///
/// Every step both players update from the pair of strategies that was in
/// play before the step, then A samples an action and then B does, each
/// with one draw from the shared rng.
pub struct Duel {
    game: &'static GameSpec,
    stepper_a: Box<dyn Stepper>,
    stepper_b: Box<dyn Stepper>,
    strategy_a: Strategy,
    strategy_b: Strategy,
}

impl Duel {
    /// Fresh steppers for both players, both starting uniform.
    pub fn new(
        game: &'static GameSpec,
        algorithm_a: Algorithm,
        algorithm_b: Algorithm,
        learning_rate: f64,
    ) -> Self {
        let num_a = game.num_actions(Player::A);
        let num_b = game.num_actions(Player::B);
        Self {
            game,
            stepper_a: algorithm_a.build(num_a, learning_rate),
            stepper_b: algorithm_b.build(num_b, learning_rate),
            strategy_a: uniform(num_a),
            strategy_b: uniform(num_b),
        }
    }

    pub fn game(&self) -> &'static GameSpec {
        self.game
    }

    pub fn strategy(&self, player: Player) -> &Strategy {
        match player {
            Player::A => &self.strategy_a,
            Player::B => &self.strategy_b,
        }
    }

    /// Update both strategies then sample and score one joint action.
    pub fn step(&mut self, rng: &mut Mulberry32) -> StepOutcome {
        let next_a = self.stepper_a.step(
            self.strategy_a.view(),
            self.strategy_b.view(),
            self.game.payoff_for(Player::A),
        );
        let next_b = self.stepper_b.step(
            self.strategy_b.view(),
            self.strategy_a.view(),
            self.game.payoff_for(Player::B),
        );
        self.strategy_a = next_a;
        self.strategy_b = next_b;

        let action_a = sample_action(self.strategy_a.view(), rng);
        let action_b = sample_action(self.strategy_b.view(), rng);
        let (reward_a, reward_b) = self.game.payoff(action_a, action_b);

        StepOutcome {
            action_a,
            action_b,
            reward_a,
            reward_b,
        }
    }
}
