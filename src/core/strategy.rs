//! Numeric helpers for mixed strategies.
//!
//! A strategy is an `Array1<f64>` of non-negative entries summing to one.
//! Every helper here is total: degenerate inputs fall back to the uniform
//! distribution rather than producing `NaN`.
use ndarray::{Array1, ArrayView1, ArrayView2};

use super::Mulberry32;

/// A mixed strategy over one player's actions.
pub type Strategy = Array1<f64>;

/// The uniform distribution over `n` actions.
pub fn uniform(n: usize) -> Strategy {
    if n == 0 {
        return Array1::zeros(0);
    }
    Array1::from_elem(n, 1.0 / n as f64)
}

/// Convert non-negative weights into a probability vector.
///
/// If the weights sum to zero or less (or to something that isn't finite)
/// the uniform distribution of the same length is returned.
pub fn normalize(weights: ArrayView1<'_, f64>) -> Strategy {
    let total: f64 = weights.sum();
    if total > 0.0 && total.is_finite() {
        weights.mapv(|w| w / total)
    } else {
        uniform(weights.len())
    }
}

/// Expected payoff of each of my actions against the opponent's mixed
/// strategy: `u[i] = sum_j matrix[i][j] * opponent[j]`.
pub fn expected_payoff(matrix: ArrayView2<'_, f64>, opponent: ArrayView1<'_, f64>) -> Array1<f64> {
    matrix.dot(&opponent)
}

/// Softmax of `values * scale`, shifted by the max for numerical stability.
pub fn softmax(values: ArrayView1<'_, f64>, scale: f64) -> Strategy {
    let max = values
        .iter()
        .map(|v| v * scale)
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return uniform(values.len());
    }
    let exps = values.mapv(|v| (v * scale - max).exp());
    normalize(exps.view())
}

/// Draw one action index by inverse-CDF sampling using exactly one draw
/// from the rng.
///
/// If rounding leaves the cumulative sum short of the draw the last index
/// is returned, so this never goes out of bounds.
pub fn sample_action(strategy: ArrayView1<'_, f64>, rng: &mut Mulberry32) -> usize {
    let draw = rng.next_f64();
    let mut cumulative = 0.0;
    for (idx, p) in strategy.iter().enumerate() {
        cumulative += p;
        if draw < cumulative {
            return idx;
        }
    }
    strategy.len().saturating_sub(1)
}

/// Euclidean distance between two vectors of the same length.
pub fn l2_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
