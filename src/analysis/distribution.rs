//! Distribution statistics for one numeric column.

use serde::Serialize;

use crate::dataset::Dataset;
use crate::{RailcastError, Result};

/// Upper bound on histogram bins, fixed or automatic.
pub const MAX_BINS: usize = 200;

/// Minimum, quartiles and maximum
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FiveNumberSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl FiveNumberSummary {
    #[must_use]
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Tukey fences `(q1 - k·IQR, q3 + k·IQR)`.
    #[must_use]
    pub fn fences(&self, multiplier: f64) -> (f64, f64) {
        (self.q1 - multiplier * self.iqr(), self.q3 + multiplier * self.iqr())
    }
}

/// Equal-width histogram; `edges` has one more entry than `counts`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

/// How the histogram bin count is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinRule {
    /// Narrower of the Freedman–Diaconis and Sturges widths
    Auto,
    Fixed(usize),
}

impl BinRule {
    /// `0` means automatic.
    #[must_use]
    pub fn from_count(bins: usize) -> Self {
        if bins == 0 { Self::Auto } else { Self::Fixed(bins) }
    }
}

/// Shape of a numeric column.
#[derive(Debug, Clone, Serialize)]
pub struct Distribution {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation, absent below two values
    pub std_dev: Option<f64>,
    /// Adjusted Fisher–Pearson skewness, absent below three values
    pub skew: Option<f64>,
    pub summary: FiveNumberSummary,
    pub whisker_multiplier: f64,
    /// Furthest values inside the fences
    pub whiskers: (f64, f64),
    /// Values beyond the fences, ascending
    pub outliers: Vec<f64>,
    pub histogram: Histogram,
}

impl Distribution {
    /// Describe `column` of `dataset`, ignoring empty cells.
    pub fn of_column(dataset: &Dataset, column: &str, bins: BinRule, whisker_multiplier: f64) -> Result<Self> {
        let values = dataset.numeric_values(column)?;
        Self::from_values(column, values, bins, whisker_multiplier)
    }

    pub fn from_values(column: &str, mut values: Vec<f64>, bins: BinRule, whisker_multiplier: f64) -> Result<Self> {
        if !whisker_multiplier.is_finite() || whisker_multiplier <= 0.0 {
            return Err(RailcastError::validation(format!(
                "Whisker multiplier must be a positive number, got {whisker_multiplier}"
            )));
        }
        if let BinRule::Fixed(bins) = bins
            && bins > MAX_BINS
        {
            return Err(RailcastError::validation(format!(
                "Histogram bins cannot exceed {MAX_BINS}, got {bins}"
            )));
        }
        if values.is_empty() {
            return Err(RailcastError::validation(format!(
                "Column {column} has no numeric values"
            )));
        }
        values.sort_by(f64::total_cmp);

        let n = values.len();
        let mean = values.iter().sum::<f64>() / n as f64;
        let summary = FiveNumberSummary {
            min: values[0],
            q1: quantile(&values, 0.25),
            median: quantile(&values, 0.5),
            q3: quantile(&values, 0.75),
            max: values[n - 1],
        };

        let (low_fence, high_fence) = summary.fences(whisker_multiplier);
        let in_fences = |v: &f64| (low_fence..=high_fence).contains(v);
        let whiskers = (
            values.iter().copied().find(|v| in_fences(v)).unwrap_or(summary.q1),
            values.iter().copied().rev().find(|v| in_fences(v)).unwrap_or(summary.q3),
        );
        let outliers = values.iter().copied().filter(|v| !in_fences(v)).collect();

        Ok(Self {
            column: column.to_string(),
            count: n,
            mean,
            std_dev: sample_std_dev(&values, mean),
            skew: skewness(&values, mean),
            histogram: histogram(&values, &summary, bins),
            summary,
            whisker_multiplier,
            whiskers,
            outliers,
        })
    }
}

/// Linear-interpolated quantile of ascending `sorted`.
#[must_use]
pub fn quantile(sorted: &[f64], p: f64) -> f64 {
    let position = (sorted.len() - 1) as f64 * p;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}

fn sample_std_dev(values: &[f64], mean: f64) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((sum_sq / (n - 1) as f64).sqrt())
}

/// `sqrt(n(n-1))/(n-2) · m3/m2^1.5` with biased central moments.
#[must_use]
pub fn skewness(values: &[f64], mean: f64) -> Option<f64> {
    let n = values.len() as f64;
    if values.len() < 3 {
        return None;
    }
    let m2 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let m3 = values.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / n;
    if m2 <= f64::EPSILON * mean.abs().max(1.0) {
        return Some(0.0);
    }
    Some((n * (n - 1.0)).sqrt() / (n - 2.0) * m3 / m2.powf(1.5))
}

fn histogram(sorted: &[f64], summary: &FiveNumberSummary, rule: BinRule) -> Histogram {
    let (min, max) = (summary.min, summary.max);
    let range = max - min;

    if range == 0.0 {
        return Histogram {
            edges: vec![min - 0.5, max + 0.5],
            counts: vec![sorted.len()],
        };
    }

    let bins = match rule {
        BinRule::Fixed(bins) => bins.max(1),
        BinRule::Auto => {
            let n = sorted.len() as f64;
            let sturges = range / (n.log2() + 1.0);
            let freedman_diaconis = 2.0 * summary.iqr() / n.cbrt();
            let width = if freedman_diaconis > 0.0 {
                freedman_diaconis.min(sturges)
            } else {
                sturges
            };
            ((range / width).ceil() as usize).clamp(1, MAX_BINS)
        }
    };

    let width = range / bins as f64;
    let edges = (0..=bins).map(|i| min + width * i as f64).collect();
    let mut counts = vec![0; bins];
    for value in sorted {
        let index = (((value - min) / width) as usize).min(bins - 1);
        counts[index] += 1;
    }

    Histogram { edges, counts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn describe(values: &[f64]) -> Distribution {
        Distribution::from_values("delay", values.to_vec(), BinRule::Auto, 1.5).unwrap()
    }

    #[test]
    fn test_summary_and_skew() {
        let dist = describe(&[10.0, 1.0, 3.0, 2.0, 4.0]);
        assert_eq!(dist.count, 5);
        assert_eq!(dist.mean, 4.0);
        assert_eq!(
            dist.summary,
            FiveNumberSummary { min: 1.0, q1: 2.0, median: 3.0, q3: 4.0, max: 10.0 }
        );
        assert!((dist.skew.unwrap() - 1.697_056).abs() < 1e-5);
        assert!((dist.std_dev.unwrap() - 12.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_whiskers_and_outliers() {
        let dist = describe(&[1.0, 2.0, 3.0, 4.0, 10.0]);
        assert_eq!(dist.whiskers, (1.0, 4.0));
        assert_eq!(dist.outliers, vec![10.0]);
    }

    #[test]
    fn test_auto_histogram() {
        let dist = describe(&[1.0, 2.0, 3.0, 4.0, 10.0]);
        assert_eq!(dist.histogram.counts, vec![3, 1, 0, 1]);
        assert_eq!(dist.histogram.edges, vec![1.0, 3.25, 5.5, 7.75, 10.0]);
    }

    #[test]
    fn test_fixed_histogram_closes_last_bin() {
        let dist = Distribution::from_values("delay", vec![0.0, 1.0, 2.0, 3.0, 4.0], BinRule::Fixed(2), 1.5)
            .unwrap();
        assert_eq!(dist.histogram.counts, vec![2, 3]);
    }

    #[test]
    fn test_constant_column() {
        let dist = describe(&[5.0, 5.0, 5.0, 5.0]);
        assert_eq!(dist.skew, Some(0.0));
        assert_eq!(dist.std_dev, Some(0.0));
        assert_eq!(dist.histogram.counts, vec![4]);
        assert!(dist.outliers.is_empty());
    }

    #[rstest]
    #[case(&[7.0], None, None)]
    #[case(&[1.0, 3.0], Some(2f64.sqrt()), None)]
    #[case(&[1.0, 2.0, 3.0], Some(1.0), Some(0.0))]
    fn test_small_samples(#[case] values: &[f64], #[case] std_dev: Option<f64>, #[case] skew: Option<f64>) {
        let dist = describe(values);
        assert_eq!(dist.std_dev, std_dev);
        assert_eq!(dist.skew, skew);
    }

    #[test]
    fn test_empty_column_is_an_error() {
        let err = Distribution::from_values("delay", vec![], BinRule::Auto, 1.5).unwrap_err();
        assert!(matches!(err, RailcastError::Validation { .. }));
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.5)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_rejects_bad_whisker_multiplier(#[case] multiplier: f64) {
        let err = Distribution::from_values("delay", vec![1.0, 2.0], BinRule::Auto, multiplier).unwrap_err();
        assert!(matches!(err, RailcastError::Validation { .. }));
    }

    #[test]
    fn test_rejects_too_many_bins() {
        let values = vec![1.0, 2.0, 3.0];
        assert!(Distribution::from_values("delay", values.clone(), BinRule::Fixed(MAX_BINS), 1.5).is_ok());
        let err = Distribution::from_values("delay", values, BinRule::Fixed(100_000_000_000_000), 1.5).unwrap_err();
        assert!(err.to_string().contains("cannot exceed 200"));
    }

    #[rstest]
    #[case(0.0, 1.0)]
    #[case(0.25, 1.75)]
    #[case(0.5, 2.5)]
    #[case(1.0, 4.0)]
    fn test_quantile(#[case] p: f64, #[case] expected: f64) {
        assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0], p), expected);
    }
}
