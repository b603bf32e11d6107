use analysis_core::{
    BuzzSummary, Direction, PredictionFactors, PredictionResult, PriceBar, PREDICTION_TIMEFRAME,
};
use chrono::Utc;

use crate::features::{extract_features, FeatureSet};

/// Fewest bars a prediction is attempted with
pub const MIN_BARS: usize = 10;

/// Score beyond ± this value is called bullish/bearish
const DIRECTION_THRESHOLD: f64 = 0.02;
/// Ceiling on directional confidence
const MAX_CONFIDENCE: f64 = 0.9;
/// Confidence reported for a neutral call
const NEUTRAL_CONFIDENCE: f64 = 0.5;
/// Converts a score into an expected percentage move (heuristic, not fitted)
const EXPECTED_CHANGE_SCALE: f64 = 5.0;

/// Linear weights applied to the features
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionWeights {
    pub price_momentum: f64,
    pub volume_trend: f64,
    pub sma_short_deviation: f64,
    pub sma_long_deviation: f64,
    pub sentiment_score: f64,
    pub sentiment_magnitude: f64,
}

impl Default for PredictionWeights {
    fn default() -> Self {
        Self {
            price_momentum: 0.30,
            volume_trend: 0.20,
            sma_short_deviation: 0.20,
            sma_long_deviation: 0.10,
            sentiment_score: 0.15,
            sentiment_magnitude: 0.05,
        }
    }
}

impl PredictionWeights {
    pub fn score(&self, f: &FeatureSet) -> f64 {
        self.price_momentum * f.price_momentum
            + self.volume_trend * f.volume_trend
            + self.sma_short_deviation * f.sma_short_deviation
            + self.sma_long_deviation * f.sma_long_deviation
            + self.sentiment_score * f.sentiment_score
            + self.sentiment_magnitude * f.sentiment_magnitude
    }
}

/// Heuristic short-term direction estimator over price history and buzz
#[derive(Debug, Clone)]
pub struct PricePredictor {
    weights: PredictionWeights,
    min_bars: usize,
}

impl Default for PricePredictor {
    fn default() -> Self {
        Self::new(PredictionWeights::default())
    }
}

impl PricePredictor {
    pub fn new(weights: PredictionWeights) -> Self {
        Self {
            weights,
            min_bars: MIN_BARS,
        }
    }

    /// Require more history than the default minimum. Values below the minimum are ignored.
    pub fn with_min_bars(mut self, min_bars: usize) -> Self {
        self.min_bars = min_bars.max(MIN_BARS);
        self
    }

    pub fn min_bars(&self) -> usize {
        self.min_bars
    }

    /// Map a score to a direction and confidence
    pub fn classify(score: f64) -> (Direction, f64) {
        if score > DIRECTION_THRESHOLD {
            (Direction::Bullish, MAX_CONFIDENCE.min(0.5 + score.abs() * 10.0))
        } else if score < -DIRECTION_THRESHOLD {
            (Direction::Bearish, MAX_CONFIDENCE.min(0.5 + score.abs() * 10.0))
        } else {
            (Direction::Neutral, NEUTRAL_CONFIDENCE)
        }
    }

    /// Predict direction. Never fails: short or malformed history yields the empty prediction.
    pub fn predict(&self, symbol: &str, bars: &[PriceBar], buzz: &BuzzSummary) -> PredictionResult {
        if bars.len() < self.min_bars {
            tracing::debug!(
                "{}: {} bars, need {} for a prediction",
                symbol,
                bars.len(),
                self.min_bars
            );
            return PredictionResult::empty(symbol);
        }

        let features = match extract_features(bars, buzz) {
            Ok(features) => features,
            Err(e) => {
                tracing::error!("Price prediction failed for {}: {}", symbol, e);
                return PredictionResult::empty(symbol);
            }
        };

        let score = self.weights.score(&features);
        let (direction, confidence) = Self::classify(score);

        PredictionResult {
            symbol: symbol.to_string(),
            direction,
            confidence,
            score,
            expected_change_percent: score * EXPECTED_CHANGE_SCALE,
            timeframe: PREDICTION_TIMEFRAME.to_string(),
            factors: PredictionFactors {
                price_momentum: features.price_momentum,
                volume_trend: features.volume_trend,
                technical_indicators: features.sma_short_deviation + features.sma_long_deviation,
                sentiment_impact: features.sentiment_score,
                buzz_impact: features.buzz_intensity,
            },
            predicted_at: Utc::now(),
        }
    }
}
