use analysis_core::{stats, AnalysisError, BuzzSummary, PriceBar};
use serde::{Deserialize, Serialize};

/// Short moving-average window
pub const SMA_SHORT: usize = 5;
/// Long moving-average window
pub const SMA_LONG: usize = 20;
/// How many bars back momentum is measured against
pub const MOMENTUM_LOOKBACK: usize = 5;
/// Window for the average volume baseline (includes the latest bar)
pub const VOLUME_WINDOW: usize = 5;
/// Buzz intensity is divided by this before being reported
pub const BUZZ_NORMALIZER: f64 = 1000.0;

/// Inputs to the direction score, computed from bars and buzz
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub latest_close: f64,
    pub sma_short: f64,
    pub sma_long: f64,
    pub price_momentum: f64,
    pub volume_trend: f64,
    /// (close - SMA5) / SMA5
    pub sma_short_deviation: f64,
    /// (close - SMA20) / SMA20
    pub sma_long_deviation: f64,
    pub sentiment_score: f64,
    pub sentiment_magnitude: f64,
    pub buzz_intensity: f64,
}

impl FeatureSet {
    fn values(&self) -> [f64; 10] {
        [
            self.latest_close,
            self.sma_short,
            self.sma_long,
            self.price_momentum,
            self.volume_trend,
            self.sma_short_deviation,
            self.sma_long_deviation,
            self.sentiment_score,
            self.sentiment_magnitude,
            self.buzz_intensity,
        ]
    }
}

/// Bars at the end of the series that any feature reads
const READ_WINDOW: usize = if SMA_LONG > MOMENTUM_LOOKBACK + 1 {
    SMA_LONG
} else {
    MOMENTUM_LOOKBACK + 1
};

/// Checks the closes that feed a feature. Older bars are never read.
fn validate(bars: &[PriceBar]) -> Result<(), AnalysisError> {
    if bars.is_empty() {
        return Err(AnalysisError::InsufficientData("no price bars".to_string()));
    }
    let start = bars.len().saturating_sub(READ_WINDOW);
    for (i, bar) in bars.iter().enumerate().skip(start) {
        if !bar.close.is_finite() || bar.close <= 0.0 {
            return Err(AnalysisError::InvalidData(format!(
                "bar {} has unusable close {}",
                i, bar.close
            )));
        }
    }
    Ok(())
}

/// (close[n-1] - close[n-1-lookback]) / close[n-1-lookback], or 0 without enough history
fn momentum(closes: &[f64], lookback: usize) -> f64 {
    let n = closes.len();
    if n <= lookback {
        return 0.0;
    }
    stats::relative_change(closes[n - 1], closes[n - 1 - lookback]).unwrap_or(0.0)
}

/// Latest volume against the mean of the last `window` volumes
fn volume_trend(volumes: &[f64], window: usize) -> f64 {
    if volumes.len() < window {
        return 0.0;
    }
    let latest = volumes[volumes.len() - 1];
    stats::relative_change(latest, stats::tail_mean(volumes, window)).unwrap_or(0.0)
}

/// Compute the prediction features. The last bar is the most recent.
pub fn extract_features(bars: &[PriceBar], buzz: &BuzzSummary) -> Result<FeatureSet, AnalysisError> {
    validate(bars)?;

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();
    let latest_close = closes[closes.len() - 1];

    let sma_short = stats::tail_mean(&closes, SMA_SHORT);
    let sma_long = stats::tail_mean(&closes, SMA_LONG);

    let sma_short_deviation = stats::relative_change(latest_close, sma_short)
        .ok_or_else(|| AnalysisError::CalculationError("SMA5 is zero".to_string()))?;
    let sma_long_deviation = stats::relative_change(latest_close, sma_long)
        .ok_or_else(|| AnalysisError::CalculationError("SMA20 is zero".to_string()))?;

    let features = FeatureSet {
        latest_close,
        sma_short,
        sma_long,
        price_momentum: momentum(&closes, MOMENTUM_LOOKBACK),
        volume_trend: volume_trend(&volumes, VOLUME_WINDOW),
        sma_short_deviation,
        sma_long_deviation,
        sentiment_score: buzz.overall_sentiment.score,
        sentiment_magnitude: buzz.overall_sentiment.magnitude,
        buzz_intensity: buzz.buzz_metrics.intensity / BUZZ_NORMALIZER,
    };

    if features.values().iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::CalculationError(format!(
            "non-finite feature in {:?}",
            features
        )));
    }

    Ok(features)
}
