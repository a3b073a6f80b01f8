// Timing Statistics
//
// Statistical post-processing over per-test execution-time samples: the
// percentiles, confidence intervals, and outlier counts shown on the
// dashboard. All inputs and outputs are milliseconds.

use serde::{Deserialize, Serialize};

/// Critical value of the standard normal distribution for a 95% interval
const Z_95: f64 = 1.96;

/// Summary statistics over a set of timing samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingStats {
    pub samples: usize,
    pub mean_ms: f64,
    pub median_ms: f64,
    /// Sample standard deviation (n - 1)
    pub std_dev_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p90_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    /// 95% confidence interval for the mean, normal approximation
    pub ci95_low_ms: f64,
    pub ci95_high_ms: f64,
    /// Samples outside the 1.5 x IQR fences
    pub outliers: usize,
    /// Derived from the mean; 0.0 when the mean is 0
    pub ops_per_second: f64,
}

/// Summarize a slice of timing samples. Returns `None` for an empty slice.
pub fn summarize(samples: &[f64]) -> Option<TimingStats> {
    if samples.is_empty() {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    let mean = mean(&sorted);
    let std_dev = std_dev(&sorted, mean);
    let half_width = if n > 1 {
        Z_95 * std_dev / (n as f64).sqrt()
    } else {
        0.0
    };

    Some(TimingStats {
        samples: n,
        mean_ms: mean,
        median_ms: percentile(&sorted, 50.0),
        std_dev_ms: std_dev,
        min_ms: sorted[0],
        max_ms: sorted[n - 1],
        p90_ms: percentile(&sorted, 90.0),
        p95_ms: percentile(&sorted, 95.0),
        p99_ms: percentile(&sorted, 99.0),
        ci95_low_ms: mean - half_width,
        ci95_high_ms: mean + half_width,
        outliers: iqr_outliers(&sorted),
        ops_per_second: if mean > 0.0 { 1000.0 / mean } else { 0.0 },
    })
}

fn mean(samples: &[f64]) -> f64 {
    samples.iter().sum::<f64>() / samples.len() as f64
}

fn std_dev(samples: &[f64], mean: f64) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let variance = samples
        .iter()
        .map(|value| {
            let diff = value - mean;
            diff * diff
        })
        .sum::<f64>()
        / (samples.len() - 1) as f64;
    variance.sqrt()
}

/// Percentile over a sorted slice, linearly interpolating between the two
/// closest ranks. `p` is in the range 0..=100.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = rank - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

/// Count samples outside the 1.5 x IQR fences of a sorted slice
pub fn iqr_outliers(sorted: &[f64]) -> usize {
    if sorted.len() < 4 {
        return 0;
    }
    let q1 = percentile(sorted, 25.0);
    let q3 = percentile(sorted, 75.0);
    let iqr = q3 - q1;
    let low_fence = q1 - 1.5 * iqr;
    let high_fence = q3 + 1.5 * iqr;
    sorted
        .iter()
        .filter(|&&value| value < low_fence || value > high_fence)
        .count()
}
