use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::{AnalysisError, PriceBar, SentimentResult, SocialPost};

/// A capability that turns raw text into a sentiment result.
///
/// Both the model-backed analyzer and the local lexical estimator implement
/// this, so the classifier can treat them as interchangeable branches.
#[async_trait]
pub trait SentimentBackend: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<SentimentResult, AnalysisError>;

    fn name(&self) -> &'static str;
}

/// Source of social posts for a ticker
#[async_trait]
pub trait SocialSource: Send + Sync {
    async fn fetch_posts(&self, symbol: &str, limit: usize) -> Result<Vec<SocialPost>, AnalysisError>;
}

/// Source of daily price history, oldest bar first
#[async_trait]
pub trait PriceHistorySource: Send + Sync {
    async fn get_bars(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PriceBar>, AnalysisError>;
}
