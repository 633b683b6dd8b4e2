use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::core::{Strategy, expected_payoff, normalize};

use super::{Algorithm, Stepper};

/// Weights are rescaled so the largest is one once it leaves
/// `[RESCALE_BELOW, RESCALE_ABOVE]`. Scaling every weight by the same
/// factor leaves the normalized strategy unchanged.
const RESCALE_ABOVE: f64 = 1e100;
const RESCALE_BELOW: f64 = 1e-100;

/// Multiplicative weights. Each step every action's weight is multiplied by
/// `exp((lr / s) * u_i)` where `u` is the expected payoff against the
/// opponent and `s = max(1, max_i |u_i|)` keeps the exponent bounded.
#[derive(Debug, Clone)]
pub struct Hedge {
    weights: Array1<f64>,
    learning_rate: f64,
}

impl Hedge {
    pub const DEFAULT_LEARNING_RATE: f64 = 0.5;

    /// All weights start at one, so the first strategy is uniform.
    pub fn new(num_actions: usize, learning_rate: f64) -> Self {
        Self {
            weights: Array1::ones(num_actions),
            learning_rate,
        }
    }

    pub fn weights(&self) -> ArrayView1<'_, f64> {
        self.weights.view()
    }

    /// The strategy implied by the current weights.
    pub fn strategy(&self) -> Strategy {
        normalize(self.weights.view())
    }
}

impl Stepper for Hedge {
    fn step(
        &mut self,
        _current: ArrayView1<'_, f64>,
        opponent: ArrayView1<'_, f64>,
        payoff: ArrayView2<'_, f64>,
    ) -> Strategy {
        let u = expected_payoff(payoff, opponent);
        let scale = u.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
        let eta = self.learning_rate / scale;

        self.weights
            .zip_mut_with(&u, |w, u_i| *w *= (eta * u_i).exp());

        let max = self.weights.iter().cloned().fold(0.0_f64, f64::max);
        if max > RESCALE_ABOVE || (max > 0.0 && max < RESCALE_BELOW) {
            self.weights.mapv_inplace(|w| w / max);
        }

        normalize(self.weights.view())
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::Hedge
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    use crate::core::{GameId, GameSpec, Player, uniform};

    use super::*;

    #[test]
    fn test_starts_uniform() {
        let hedge = Hedge::new(3, 0.5);
        assert_eq!(uniform(3), hedge.strategy());
    }

    #[test]
    fn test_single_update() {
        let spec = GameSpec::get(GameId::RockPaperScissors);
        let mut hedge = Hedge::new(3, 0.5);
        // Opponent plays pure rock: u = [0, 1, -1], s = 1.
        let next = hedge.step(
            uniform(3).view(),
            array![1.0, 0.0, 0.0].view(),
            spec.payoff_for(Player::A),
        );
        let w = array![1.0, 0.5_f64.exp(), (-0.5_f64).exp()];
        let expected = &w / w.sum();
        for (a, b) in next.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-15);
        }
        assert_abs_diff_eq!(0.5_f64.exp(), hedge.weights()[1], epsilon = 1e-15);
    }

    #[test]
    fn test_payoff_scale_bounds_exponent() {
        let payoff = array![[1000.0, 0.0], [0.0, 0.0]];
        let mut hedge = Hedge::new(2, 0.5);
        hedge.step(
            uniform(2).view(),
            array![1.0, 0.0].view(),
            payoff.view(),
        );
        // u = [1000, 0] and s = 1000 so the exponent is exactly lr.
        assert_abs_diff_eq!(0.5_f64.exp(), hedge.weights()[0], epsilon = 1e-12);
    }

    #[test]
    fn test_uniform_self_play_rps_stays_uniform() {
        let spec = GameSpec::get(GameId::RockPaperScissors);
        let mut hedge = Hedge::new(3, 0.5);
        let mut p = uniform(3);
        for _ in 0..100 {
            p = hedge.step(p.view(), uniform(3).view(), spec.payoff_for(Player::A));
        }
        for v in p.iter() {
            assert_abs_diff_eq!(1.0 / 3.0, *v, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_long_run_rescales() {
        let payoff = array![[1.0, 1.0], [0.0, 0.0]];
        let mut hedge = Hedge::new(2, 0.5);
        let mut p = uniform(2);
        for _ in 0..10_000 {
            p = hedge.step(p.view(), uniform(2).view(), payoff.view());
        }
        assert!(hedge.weights().iter().all(|w| w.is_finite()));
        assert_abs_diff_eq!(1.0, p[0], epsilon = 1e-12);
    }

    #[test]
    fn test_all_negative_payoffs_keep_learning() {
        // Every weight shrinks each step, only their ratio carries the
        // strategy.
        let payoff = array![[-1.0, -1.0], [-2.0, -2.0]];
        let mut hedge = Hedge::new(2, 0.5);
        let mut p = uniform(2);
        for _ in 0..5000 {
            p = hedge.step(p.view(), uniform(2).view(), payoff.view());
        }
        assert!(p[0] > 0.99, "strategy stalled at {p}");
        let max = hedge.weights().iter().cloned().fold(0.0_f64, f64::max);
        assert!(max >= RESCALE_BELOW && max <= RESCALE_ABOVE);
    }
}
