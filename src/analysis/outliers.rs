//! Unusual services: rows whose value falls outside a column's Tukey fences.

use tracing::info;

use super::distribution::{BinRule, Distribution};
use crate::Result;
use crate::dataset::Dataset;

/// Rows flagged as unusual for one column.
#[derive(Debug, Clone)]
pub struct OutlierReport {
    pub column: String,
    pub lower_fence: f64,
    pub upper_fence: f64,
    /// Rows with a value in `column` considered
    pub examined: usize,
    /// The flagged rows, in dataset order
    pub rows: Dataset,
}

impl OutlierReport {
    #[must_use]
    pub fn share(&self) -> f64 {
        if self.examined == 0 {
            0.0
        } else {
            self.rows.len() as f64 / self.examined as f64
        }
    }
}

/// Flag the rows of `dataset` whose `column` lies beyond `q1 - k·IQR` or `q3 + k·IQR`.
pub fn find_outliers(dataset: &Dataset, column: &str, multiplier: f64) -> Result<OutlierReport> {
    let distribution = Distribution::of_column(dataset, column, BinRule::Fixed(1), multiplier)?;
    let (lower_fence, upper_fence) = distribution.summary.fences(multiplier);
    let index = dataset.require_column(column)?;

    let rows = dataset.filter_rows(|row| {
        row[index]
            .trim()
            .parse::<f64>()
            .is_ok_and(|v| !v.is_nan() && (v < lower_fence || v > upper_fence))
    });

    info!(
        "{} of {} rows are outside [{:.2}, {:.2}] for {}",
        rows.len(),
        distribution.count,
        lower_fence,
        upper_fence,
        column
    );

    Ok(OutlierReport {
        column: column.to_string(),
        lower_fence,
        upper_fence,
        examined: distribution.count,
        rows,
    })
}
