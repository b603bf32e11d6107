//! Small statistics helpers shared by the aggregator and the predictor.
//!
//! Everything here is total: empty input yields 0.0 rather than NaN.

/// Compute the mean of a data slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Compute population standard deviation (divides by `n`, not `n - 1`).
pub fn population_std_dev(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    // Constant input has zero spread; skip the rounding noise in the mean
    if data.iter().all(|&x| x == data[0]) {
        return 0.0;
    }
    let m = mean(data);
    let variance = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64;
    variance.sqrt()
}

/// Mean of the last `period` values, or of all values when fewer are available.
pub fn tail_mean(data: &[f64], period: usize) -> f64 {
    let start = data.len().saturating_sub(period);
    mean(&data[start..])
}

/// Relative change from `base` to `value`. Returns `None` when `base` is zero.
pub fn relative_change(value: f64, base: f64) -> Option<f64> {
    if base == 0.0 {
        None
    } else {
        Some((value - base) / base)
    }
}
