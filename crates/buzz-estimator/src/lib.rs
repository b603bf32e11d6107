pub mod narrative;

pub use narrative::{template_report, NarrativeGenerator};

use analysis_core::{
    AiSummary, BuzzSummary, PredictionResult, PriceBar, PriceHistorySource, SocialPost,
    SocialSource, StockSnapshot,
};
use chrono::Utc;
use llm_client::{build_generator, LlmConfig};
use price_predictor::{PricePredictor, MIN_BARS};
use sentiment_analysis::{BuzzAggregator, LlmSentimentBackend, SentimentClassifier};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;

const DEFAULT_SOCIAL_LIMIT: usize = 100;
const DEFAULT_HISTORY_DAYS: i64 = 30;

/// Estimator settings
#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    /// `None` runs without a model: lexical sentiment and templated summaries
    pub llm: Option<LlmConfig>,
    pub min_bars: usize,
    /// Posts requested per symbol from a [`SocialSource`]
    pub social_limit: usize,
    /// Days of history requested from a [`PriceHistorySource`]
    pub history_days: i64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            llm: None,
            min_bars: MIN_BARS,
            social_limit: DEFAULT_SOCIAL_LIMIT,
            history_days: DEFAULT_HISTORY_DAYS,
        }
    }
}

impl EstimatorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            llm: LlmConfig::from_lookup(&lookup),
            min_bars: lookup("BUZZ_MIN_BARS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.min_bars),
            social_limit: lookup("BUZZ_SOCIAL_LIMIT")
                .and_then(|v| v.parse().ok())
                .filter(|limit| *limit > 0)
                .unwrap_or(defaults.social_limit),
            history_days: lookup("BUZZ_HISTORY_DAYS")
                .and_then(|v| v.parse().ok())
                .filter(|days| *days > 0)
                .unwrap_or(defaults.history_days),
        }
    }

    /// `None` when the day count does not fit in a duration
    pub fn history_window(&self) -> Option<chrono::Duration> {
        chrono::Duration::try_days(self.history_days)
    }
}

/// Buzz summary and price-direction estimate for one symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Estimate {
    pub symbol: String,
    pub buzz: BuzzSummary,
    pub prediction: PredictionResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<AiSummary>,
}

/// One symbol's worth of input for [`BuzzEstimator::estimate_many`].
///
/// A request carrying a snapshot also gets a narrative summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EstimateRequest {
    pub symbol: String,
    #[serde(default)]
    pub posts: Vec<SocialPost>,
    #[serde(default)]
    pub bars: Vec<PriceBar>,
    #[serde(default)]
    pub snapshot: Option<StockSnapshot>,
}

pub struct BuzzEstimator {
    aggregator: BuzzAggregator,
    predictor: PricePredictor,
    narrator: NarrativeGenerator,
    config: EstimatorConfig,
}

impl BuzzEstimator {
    pub fn new(classifier: SentimentClassifier, predictor: PricePredictor) -> Self {
        let config = EstimatorConfig {
            min_bars: predictor.min_bars(),
            ..EstimatorConfig::default()
        };
        Self {
            aggregator: BuzzAggregator::new(classifier),
            predictor,
            narrator: NarrativeGenerator::template_only(),
            config,
        }
    }

    pub fn with_narrator(mut self, narrator: NarrativeGenerator) -> Self {
        self.narrator = narrator;
        self
    }

    /// Wire the estimator from config. One text generator is shared by the
    /// sentiment backend and the narrator.
    pub fn from_config(config: &EstimatorConfig) -> Self {
        let predictor = PricePredictor::default().with_min_bars(config.min_bars);

        let generator = config.llm.as_ref().and_then(|llm| match build_generator(llm) {
            Ok(generator) => Some((generator, llm.timeout)),
            Err(e) => {
                tracing::warn!("Could not build text generator, running without a model: {}", e);
                None
            }
        });

        let (classifier, narrator) = match generator {
            Some((generator, timeout)) => {
                let backend = LlmSentimentBackend::new(generator.clone(), timeout);
                (
                    SentimentClassifier::with_primary(Arc::new(backend)).with_budget(timeout),
                    NarrativeGenerator::new(Some(generator), timeout),
                )
            }
            None => (SentimentClassifier::lexical_only(), NarrativeGenerator::template_only()),
        };

        tracing::debug!(
            "Estimator ready (model sentiment: {}, min bars: {})",
            classifier.has_primary(),
            predictor.min_bars()
        );

        Self {
            aggregator: BuzzAggregator::new(classifier),
            predictor,
            narrator,
            config: config.clone(),
        }
    }

    /// Classify the posts, aggregate buzz, then predict direction from the bars
    pub async fn estimate(&self, symbol: &str, posts: &[SocialPost], bars: &[PriceBar]) -> Estimate {
        tracing::info!("Estimating {} ({} posts, {} bars)", symbol, posts.len(), bars.len());

        let buzz = self.aggregator.analyze(symbol, posts).await;
        let prediction = self.predictor.predict(symbol, bars, &buzz);

        tracing::info!(
            "{}: sentiment {} ({:.3}), direction {} ({:.0}% confidence)",
            symbol,
            buzz.overall_sentiment.label.as_str(),
            buzz.overall_sentiment.score,
            prediction.direction.as_str(),
            prediction.confidence * 100.0
        );

        Estimate {
            symbol: symbol.to_string(),
            buzz,
            prediction,
            summary: None,
        }
    }

    /// Fetch posts and bars through the collaborators, then estimate.
    ///
    /// Bars cover the configured history window. A failing source counts as
    /// no data for that input.
    pub async fn estimate_from_sources(
        &self,
        symbol: &str,
        social: &dyn SocialSource,
        prices: &dyn PriceHistorySource,
    ) -> Estimate {
        let posts = match social.fetch_posts(symbol, self.config.social_limit).await {
            Ok(posts) => posts,
            Err(e) => {
                tracing::warn!("Failed to fetch social posts for {}: {}", symbol, e);
                Vec::new()
            }
        };

        let to = Utc::now();
        let from = self
            .config
            .history_window()
            .and_then(|window| to.checked_sub_signed(window));
        let bars = match from {
            Some(from) => match prices.get_bars(symbol, from, to).await {
                Ok(bars) => bars,
                Err(e) => {
                    tracing::warn!("Failed to fetch price history for {}: {}", symbol, e);
                    Vec::new()
                }
            },
            None => {
                tracing::warn!(
                    "History window of {} days is out of range, skipping price history for {}",
                    self.config.history_days,
                    symbol
                );
                Vec::new()
            }
        };

        self.estimate(symbol, &posts, &bars).await
    }

    pub async fn summarize(
        &self,
        symbol: &str,
        snapshot: &StockSnapshot,
        buzz: &BuzzSummary,
        prediction: &PredictionResult,
    ) -> AiSummary {
        self.narrator.summarize(symbol, snapshot, buzz, prediction).await
    }

    async fn run_request(&self, request: EstimateRequest) -> Estimate {
        let mut estimate = self.estimate(&request.symbol, &request.posts, &request.bars).await;
        if let Some(snapshot) = &request.snapshot {
            let summary = self
                .summarize(&request.symbol, snapshot, &estimate.buzz, &estimate.prediction)
                .await;
            estimate.summary = Some(summary);
        }
        estimate
    }

    /// Estimate several symbols concurrently, at most `concurrency` at a time.
    /// Results come back in completion order.
    pub async fn estimate_many(
        self: Arc<Self>,
        requests: Vec<EstimateRequest>,
        concurrency: usize,
    ) -> Vec<Estimate> {
        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut handles = Vec::with_capacity(requests.len());

        for request in requests {
            let estimator = self.clone();
            let semaphore = semaphore.clone();
            let tx = tx.clone();

            let handle = tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return;
                };
                let estimate = estimator.run_request(request).await;
                let _ = tx.send(estimate);
            });
            handles.push(handle);
        }
        drop(tx);

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Estimate task failed: {}", e);
            }
        }

        let mut estimates = Vec::new();
        while let Some(estimate) = rx.recv().await {
            estimates.push(estimate);
        }
        estimates
    }
}

impl Default for BuzzEstimator {
    fn default() -> Self {
        Self::new(SentimentClassifier::default(), PricePredictor::default())
    }
}
