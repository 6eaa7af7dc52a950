//! Descriptive statistics per column.
//!
//! Moments use the bias-adjusted estimators familiar from spreadsheet and
//! dataframe tooling: sample standard deviation (`n - 1`), adjusted
//! Fisher-Pearson skewness and excess kurtosis. Quantiles interpolate
//! linearly between order statistics (type 7), not the median-unbiased
//! estimator of `statrs::statistics::OrderStatistics`.

use crate::table::TimeSeriesTable;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Summary statistics of one column's non-missing values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    /// Column name.
    pub series: String,

    /// Number of non-missing observations.
    pub count: usize,

    /// Arithmetic mean.
    pub mean: Option<f64>,

    /// Sample standard deviation (requires two observations).
    pub std: Option<f64>,

    /// Minimum.
    pub min: Option<f64>,

    /// 25th percentile.
    pub q25: Option<f64>,

    /// Median.
    pub median: Option<f64>,

    /// 75th percentile.
    pub q75: Option<f64>,

    /// Maximum.
    pub max: Option<f64>,

    /// Adjusted sample skewness (requires three observations).
    pub skewness: Option<f64>,

    /// Adjusted sample excess kurtosis (requires four observations).
    pub excess_kurtosis: Option<f64>,
}

impl DescriptiveStats {
    /// Column labels matching [`DescriptiveStats::values`].
    pub const FIELDS: [&'static str; 10] = [
        "count", "mean", "std", "min", "25%", "50%", "75%", "max", "skewness", "kurtosis",
    ];

    /// Compute statistics for a slice of observations.
    pub fn from_values(series: impl Into<String>, values: &[Option<f64>]) -> Self {
        let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();

        let mean = (n > 0).then(|| sorted.iter().mean());
        let moment = |k: i32| -> Option<f64> {
            mean.map(|m| sorted.iter().map(|x| (x - m).powi(k)).sum::<f64>() / n as f64)
        };
        let m2 = (n > 0).then(|| sorted.iter().population_variance());
        let std = (n >= 2).then(|| sorted.iter().std_dev());

        let nf = n as f64;
        let skewness = match (m2, moment(3)) {
            (Some(m2), Some(m3)) if n >= 3 && m2 > 0.0 => {
                let g1 = m3 / m2.powf(1.5);
                Some(g1 * (nf * (nf - 1.0)).sqrt() / (nf - 2.0))
            }
            _ => None,
        };
        let excess_kurtosis = match (m2, moment(4)) {
            (Some(m2), Some(m4)) if n >= 4 && m2 > 0.0 => {
                let g2 = m4 / (m2 * m2) - 3.0;
                Some(((nf + 1.0) * g2 + 6.0) * (nf - 1.0) / ((nf - 2.0) * (nf - 3.0)))
            }
            _ => None,
        };

        Self {
            series: series.into(),
            count: n,
            mean,
            std,
            min: sorted.first().copied(),
            q25: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted.last().copied(),
            skewness,
            excess_kurtosis,
        }
    }

    /// Values in [`DescriptiveStats::FIELDS`] order.
    pub fn values(&self) -> Vec<Option<f64>> {
        vec![
            Some(self.count as f64),
            self.mean,
            self.std,
            self.min,
            self.q25,
            self.median,
            self.q75,
            self.max,
            self.skewness,
            self.excess_kurtosis,
        ]
    }
}

/// Linear-interpolation quantile of pre-sorted data.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    Some(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}

/// Descriptive statistics for every column of a table, in column order.
pub fn describe(table: &TimeSeriesTable) -> Vec<DescriptiveStats> {
    table
        .columns()
        .iter()
        .map(|c| DescriptiveStats::from_values(c.name.clone(), &c.values))
        .collect()
}
