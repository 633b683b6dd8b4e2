use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::core::{Strategy, expected_payoff, softmax, uniform};

use super::{Algorithm, EPSILON, Stepper};

/// Fictitious play with a soft best response.
///
/// Tracks the running sum of every strategy the opponent has played and
/// responds with `softmax(u, tau)` to the empirical frequency, where the
/// temperature is `tau = 1 / max(lr, eps)`.
#[derive(Debug, Clone)]
pub struct FictitiousPlay {
    opponent_sum: Option<Array1<f64>>,
    steps: u64,
    learning_rate: f64,
    num_actions: usize,
}

impl FictitiousPlay {
    pub fn new(num_actions: usize, learning_rate: f64) -> Self {
        Self {
            opponent_sum: None,
            steps: 0,
            learning_rate,
            num_actions,
        }
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// The opponent's empirical strategy so far: the running sum divided by
    /// the number of steps. `None` before the first step.
    pub fn empirical(&self) -> Option<Strategy> {
        let steps = self.steps as f64;
        self.opponent_sum.as_ref().map(|sum| sum.mapv(|s| s / steps))
    }

    /// Inverse temperature applied to the payoffs.
    fn inverse_temperature(&self) -> f64 {
        self.learning_rate.max(EPSILON)
    }
}

impl Stepper for FictitiousPlay {
    fn step(
        &mut self,
        _current: ArrayView1<'_, f64>,
        opponent: ArrayView1<'_, f64>,
        payoff: ArrayView2<'_, f64>,
    ) -> Strategy {
        match self.opponent_sum.as_mut() {
            Some(sum) => *sum += &opponent,
            None => self.opponent_sum = Some(opponent.to_owned()),
        }
        self.steps += 1;

        match self.empirical() {
            Some(q) => softmax(
                expected_payoff(payoff, q.view()).view(),
                self.inverse_temperature(),
            ),
            None => uniform(self.num_actions),
        }
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::FictitiousPlay
    }
}
