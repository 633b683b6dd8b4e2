use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::core::{Mulberry32, sample_action, softmax};

/// The activations of one forward pass, kept for the backward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Forward {
    pub hidden: Array1<f64>,
    pub probs: Array1<f64>,
}

/// A two layer policy network: `tanh` hidden layer and a softmax over the
/// player's actions.
///
/// `w1` is `hidden x input`, `w2` is `actions x hidden`.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    pub w1: Array2<f64>,
    pub b1: Array1<f64>,
    pub w2: Array2<f64>,
    pub b2: Array1<f64>,
}

/// Accumulated gradients, one tensor per parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyGradient {
    pub w1: Array2<f64>,
    pub b1: Array1<f64>,
    pub w2: Array2<f64>,
    pub b2: Array1<f64>,
}

/// Uniform in `[-1/sqrt(fan_in), 1/sqrt(fan_in)]`.
fn init_weights(rows: usize, fan_in: usize, rng: &mut Mulberry32) -> Array2<f64> {
    let bound = 1.0 / (fan_in as f64).sqrt();
    Array2::from_shape_fn((rows, fan_in), |_| (2.0 * rng.next_f64() - 1.0) * bound)
}

/// Outer product `a b^T`.
fn outer(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> Array2<f64> {
    &a.insert_axis(Axis(1)) * &b.insert_axis(Axis(0))
}

impl Policy {
    /// Draws `w1` then `w2` from `rng`, row by row. Biases start at zero.
    pub fn new(input: usize, hidden: usize, actions: usize, rng: &mut Mulberry32) -> Self {
        let w1 = init_weights(hidden, input, rng);
        let w2 = init_weights(actions, hidden, rng);
        Self {
            w1,
            b1: Array1::zeros(hidden),
            w2,
            b2: Array1::zeros(actions),
        }
    }

    pub fn input_size(&self) -> usize {
        self.w1.ncols()
    }

    pub fn hidden_size(&self) -> usize {
        self.w1.nrows()
    }

    pub fn num_actions(&self) -> usize {
        self.w2.nrows()
    }

    pub fn forward(&self, observation: ArrayView1<'_, f64>) -> Forward {
        let hidden = (self.w1.dot(&observation) + &self.b1).mapv(f64::tanh);
        let logits = self.w2.dot(&hidden) + &self.b2;
        let probs = softmax(logits.view(), 1.0);
        Forward { hidden, probs }
    }

    pub fn action_probs(&self, observation: ArrayView1<'_, f64>) -> Array1<f64> {
        self.forward(observation).probs
    }

    /// Forward pass then one draw from `rng`.
    pub fn act(&self, observation: ArrayView1<'_, f64>, rng: &mut Mulberry32) -> (usize, Forward) {
        let forward = self.forward(observation);
        let action = sample_action(forward.probs.view(), rng);
        (action, forward)
    }

    pub fn zero_gradient(&self) -> PolicyGradient {
        PolicyGradient {
            w1: Array2::zeros(self.w1.raw_dim()),
            b1: Array1::zeros(self.b1.raw_dim()),
            w2: Array2::zeros(self.w2.raw_dim()),
            b2: Array1::zeros(self.b2.raw_dim()),
        }
    }

    /// Add the REINFORCE gradient of `log pi(action | observation)` scaled
    /// by `advantage` into `grad`.
    pub fn accumulate(
        &self,
        grad: &mut PolicyGradient,
        observation: ArrayView1<'_, f64>,
        forward: &Forward,
        action: usize,
        advantage: f64,
    ) {
        let mut dlogits = forward.probs.mapv(|p| -p);
        dlogits[action] += 1.0;
        dlogits *= advantage;

        grad.w2 += &outer(dlogits.view(), forward.hidden.view());
        grad.b2 += &dlogits;

        let dhidden = self.w2.t().dot(&dlogits);
        let dpre = dhidden * forward.hidden.mapv(|h| 1.0 - h * h);

        grad.w1 += &outer(dpre.view(), observation);
        grad.b1 += &dpre;
    }

    /// Gradient ascent: `param += scale * grad` for every tensor.
    pub fn apply(&mut self, grad: &PolicyGradient, scale: f64) {
        self.w1.scaled_add(scale, &grad.w1);
        self.b1.scaled_add(scale, &grad.b1);
        self.w2.scaled_add(scale, &grad.w2);
        self.b2.scaled_add(scale, &grad.b2);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    use super::*;

    #[test]
    fn test_shapes_and_init_bounds() {
        let mut rng = Mulberry32::new(3);
        let policy = Policy::new(4, 16, 3, &mut rng);
        assert_eq!((16, 4), policy.w1.dim());
        assert_eq!((3, 16), policy.w2.dim());
        assert!(policy.w1.iter().all(|w| w.abs() <= 0.5));
        assert!(policy.w2.iter().all(|w| w.abs() <= 0.25));
        assert!(policy.b1.iter().all(|b| *b == 0.0));
        assert_eq!(4, policy.input_size());
        assert_eq!(16, policy.hidden_size());
        assert_eq!(3, policy.num_actions());
    }

    #[test]
    fn test_same_seed_same_network() {
        let one = Policy::new(3, 8, 2, &mut Mulberry32::new(9));
        let two = Policy::new(3, 8, 2, &mut Mulberry32::new(9));
        assert_eq!(one, two);
    }

    #[test]
    fn test_probs_are_a_distribution() {
        let policy = Policy::new(3, 8, 2, &mut Mulberry32::new(1));
        let probs = policy.action_probs(array![1.0, 0.0, 1.0].view());
        assert_eq!(2, probs.len());
        assert_abs_diff_eq!(1.0, probs.sum(), epsilon = 1e-12);
    }

    #[test]
    fn test_zero_advantage_zero_gradient() {
        let policy = Policy::new(3, 4, 2, &mut Mulberry32::new(2));
        let obs = array![1.0, 1.0, 0.0];
        let forward = policy.forward(obs.view());
        let mut grad = policy.zero_gradient();
        policy.accumulate(&mut grad, obs.view(), &forward, 1, 0.0);
        assert_eq!(policy.zero_gradient(), grad);
    }

    #[test]
    fn test_bias_gradient_matches_finite_difference() {
        let policy = Policy::new(3, 5, 2, &mut Mulberry32::new(4));
        let obs = array![1.0, 0.0, 1.0];
        let action = 0;
        let forward = policy.forward(obs.view());
        let mut grad = policy.zero_gradient();
        policy.accumulate(&mut grad, obs.view(), &forward, action, 1.0);

        let log_prob = |p: &Policy| p.action_probs(obs.view())[action].ln();
        let h = 1e-6;
        for i in 0..5 {
            let mut plus = policy.clone();
            plus.b1[i] += h;
            let mut minus = policy.clone();
            minus.b1[i] -= h;
            let numeric = (log_prob(&plus) - log_prob(&minus)) / (2.0 * h);
            assert_abs_diff_eq!(numeric, grad.b1[i], epsilon = 1e-6);
        }
        for (j, k) in [(0, 0), (1, 3)] {
            let mut plus = policy.clone();
            plus.w2[[j, k]] += h;
            let mut minus = policy.clone();
            minus.w2[[j, k]] -= h;
            let numeric = (log_prob(&plus) - log_prob(&minus)) / (2.0 * h);
            assert_abs_diff_eq!(numeric, grad.w2[[j, k]], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_ascent_raises_chosen_action() {
        let mut policy = Policy::new(3, 8, 2, &mut Mulberry32::new(6));
        let obs = array![1.0, 0.0, 0.0];
        let before = policy.action_probs(obs.view())[1];
        let forward = policy.forward(obs.view());
        let mut grad = policy.zero_gradient();
        policy.accumulate(&mut grad, obs.view(), &forward, 1, 1.0);
        policy.apply(&grad, 0.1);
        assert!(policy.action_probs(obs.view())[1] > before);
    }
}
