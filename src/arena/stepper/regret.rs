use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::core::{Strategy, expected_payoff, uniform};

use super::{Algorithm, EPSILON, Stepper};

/// Regret matching. Keeps the cumulative positive regret of every action
/// and plays proportionally to it.
///
/// Each step `R_i <- max(0, R_i + u_i - u_bar)` where `u_bar` is the
/// expected payoff of the strategy currently being played. When no action
/// has any regret the strategy is uniform.
#[derive(Debug, Clone)]
pub struct RegretMatching {
    regrets: Array1<f64>,
}

impl RegretMatching {
    pub fn new(num_actions: usize) -> Self {
        Self {
            regrets: Array1::zeros(num_actions),
        }
    }

    pub fn regrets(&self) -> ArrayView1<'_, f64> {
        self.regrets.view()
    }

    /// The strategy implied by the accumulated regret.
    pub fn strategy(&self) -> Strategy {
        let total = self.regrets.sum();
        if total <= EPSILON {
            uniform(self.regrets.len())
        } else {
            self.regrets.mapv(|r| r / total)
        }
    }
}

impl Stepper for RegretMatching {
    fn step(
        &mut self,
        current: ArrayView1<'_, f64>,
        opponent: ArrayView1<'_, f64>,
        payoff: ArrayView2<'_, f64>,
    ) -> Strategy {
        let u = expected_payoff(payoff, opponent);
        let u_bar = current.dot(&u);

        self.regrets
            .zip_mut_with(&u, |r, u_i| *r = (*r + (u_i - u_bar)).max(0.0));

        self.strategy()
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::RegretMatching
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    use crate::core::{GameId, GameSpec, Mulberry32, Player, normalize};

    use super::*;

    #[test]
    fn test_equal_payoffs_keep_zero_regret() {
        // Dyadic probabilities keep u_bar exactly equal to the payoff.
        let payoff = array![[2.0, 2.0, 2.0], [2.0, 2.0, 2.0], [2.0, 2.0, 2.0]];
        let current = array![0.5, 0.25, 0.25];
        let mut rm = RegretMatching::new(3);
        for _ in 0..50 {
            let p = rm.step(current.view(), array![0.0, 1.0, 0.0].view(), payoff.view());
            assert!(rm.regrets().iter().all(|r| *r == 0.0));
            assert_eq!(uniform(3), p);
        }
    }

    #[test]
    fn test_regret_never_negative() {
        let spec = GameSpec::get(GameId::RockPaperScissors);
        let mut rng = Mulberry32::new(2024);
        let mut rm = RegretMatching::new(3);
        let mut p = uniform(3);
        for _ in 0..1_000 {
            let opp = normalize(ndarray::Array1::from_shape_fn(3, |_| rng.next_f64()).view());
            p = rm.step(p.view(), opp.view(), spec.payoff_for(Player::A));
            assert!(rm.regrets().iter().all(|r| *r >= 0.0));
            assert_abs_diff_eq!(1.0, p.sum(), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_regret_update() {
        let spec = GameSpec::get(GameId::RockPaperScissors);
        let mut rm = RegretMatching::new(3);
        // Against pure rock from uniform: u = [0, 1, -1], u_bar = 0.
        let p = rm.step(
            uniform(3).view(),
            array![1.0, 0.0, 0.0].view(),
            spec.payoff_for(Player::A),
        );
        assert_eq!(array![0.0, 1.0, 0.0], rm.regrets());
        assert_eq!(array![0.0, 1.0, 0.0], p);
    }
}
