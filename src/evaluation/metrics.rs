/// Metrics for one (seed, episode) pair.
///
/// Zero-sum games fill `win_a` and `l2_dist`, the prisoner's dilemma fills
/// `coop_rate`. The unused fields stay `None` (`null` when serialized).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct MetricRow {
    pub seed: u32,
    pub ep: usize,
    pub win_a: Option<f64>,
    pub avg_reward_a: f64,
    pub coop_rate: Option<f64>,
    pub l2_dist: Option<f64>,
}

/// Mean and population standard deviation of one metric.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricStat {
    pub mean: f64,
    pub std: f64,
}

impl MetricStat {
    /// `None` for an empty input.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        Some(Self {
            mean,
            std: variance.sqrt(),
        })
    }
}

/// Statistics of every metric across all the rows of one evaluation.
/// A metric that was `None` in every row is `None` here too.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SummaryRow {
    pub rows: usize,
    pub win_a: Option<MetricStat>,
    pub avg_reward_a: Option<MetricStat>,
    pub coop_rate: Option<MetricStat>,
    pub l2_dist: Option<MetricStat>,
}

impl SummaryRow {
    pub fn from_rows(rows: &[MetricRow]) -> Self {
        let stat = |metric: fn(&MetricRow) -> Option<f64>| {
            let values: Vec<f64> = rows.iter().filter_map(metric).collect();
            MetricStat::from_values(&values)
        };
        Self {
            rows: rows.len(),
            win_a: stat(|r| r.win_a),
            avg_reward_a: stat(|r| Some(r.avg_reward_a)),
            coop_rate: stat(|r| r.coop_rate),
            l2_dist: stat(|r| r.l2_dist),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn row(ep: usize, avg_reward_a: f64, coop_rate: Option<f64>) -> MetricRow {
        MetricRow {
            seed: 1,
            ep,
            win_a: None,
            avg_reward_a,
            coop_rate,
            l2_dist: None,
        }
    }

    #[test]
    fn test_population_std() {
        let rows = vec![
            row(0, 0.2, Some(1.0)),
            row(1, 0.4, Some(1.0)),
            row(2, 0.6, Some(1.0)),
        ];
        let summary = SummaryRow::from_rows(&rows);
        let reward = summary.avg_reward_a.unwrap();
        assert_abs_diff_eq!(0.4, reward.mean, epsilon = 1e-12);
        assert_abs_diff_eq!(0.163_299_316, reward.std, epsilon = 1e-9);

        let coop = summary.coop_rate.unwrap();
        assert_eq!(1.0, coop.mean);
        assert_eq!(0.0, coop.std);
        assert_eq!(3, summary.rows);
    }

    #[test]
    fn test_all_null_metric_is_null() {
        let summary = SummaryRow::from_rows(&[row(0, 1.0, None)]);
        assert!(summary.win_a.is_none());
        assert!(summary.coop_rate.is_none());
        assert!(summary.l2_dist.is_none());
    }

    #[test]
    fn test_partially_null_metric_skips_nulls() {
        let rows = vec![row(0, 0.0, Some(0.25)), row(1, 0.0, None), row(2, 0.0, Some(0.75))];
        let coop = SummaryRow::from_rows(&rows).coop_rate.unwrap();
        assert_eq!(0.5, coop.mean);
        assert_eq!(0.25, coop.std);
    }

    #[test]
    fn test_empty() {
        assert!(MetricStat::from_values(&[]).is_none());
        assert_eq!(0, SummaryRow::from_rows(&[]).rows);
    }
}
