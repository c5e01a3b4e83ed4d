//! Summary statistics over a full latency window.

use serde::{Deserialize, Serialize};

/// Decimal places used when writing the summary file.
pub const SUMMARY_PRECISION: usize = 3;

/// Mean, population standard deviation, max and min of one window, in ms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub count: usize,
    pub mean: f64,
    pub stddev: f64,
    pub max: f64,
    pub min: f64,
}

impl LatencySummary {
    /// Compute the summary. Returns `None` for an empty window.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let (min, max) = samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        Some(Self {
            count: samples.len(),
            mean,
            stddev: variance.sqrt(),
            max,
            min,
        })
    }

    /// `mean,stddev,max,min` with no trailing newline.
    pub fn to_csv(&self) -> String {
        let p = SUMMARY_PRECISION;
        format!(
            "{:.p$},{:.p$},{:.p$},{:.p$}",
            self.mean, self.stddev, self.max, self.min
        )
    }
}
