use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Score threshold for the overall and per-platform sentiment label (±0.2).
pub const LABEL_THRESHOLD: f64 = 0.2;

/// Score threshold for distribution buckets and the lexical label (±0.1).
///
/// Kept separate from [`LABEL_THRESHOLD`]: a mean of 0.15 is labelled neutral
/// overall while the posts behind it may still land in the positive bucket.
pub const BUCKET_THRESHOLD: f64 = 0.1;

/// Number of ranked topics kept on a buzz summary
pub const TRENDING_TOPIC_LIMIT: usize = 5;

/// Source platform of a social post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Platform {
    Reddit,
    Twitter,
    Discord,
    News,
    Other,
}

impl From<String> for Platform {
    fn from(tag: String) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "reddit" => Platform::Reddit,
            "twitter" | "x" => Platform::Twitter,
            "discord" => Platform::Discord,
            "news" => Platform::News,
            _ => Platform::Other,
        }
    }
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Reddit => "reddit",
            Platform::Twitter => "twitter",
            Platform::Discord => "discord",
            Platform::News => "news",
            Platform::Other => "other",
        }
    }
}

/// A social media post about a ticker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SocialPost {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_platform")]
    pub platform: Platform,
}

fn default_platform() -> Platform {
    Platform::Other
}

/// Sentiment label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Label a score against a symmetric threshold: `> t` positive, `< -t` negative.
    pub fn classify(score: f64, threshold: f64) -> Self {
        if score > threshold {
            SentimentLabel::Positive
        } else if score < -threshold {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    /// Strict parse of a label word; anything else is `None`.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "positive" => Some(SentimentLabel::Positive),
            "negative" => Some(SentimentLabel::Negative),
            "neutral" => Some(SentimentLabel::Neutral),
            _ => None,
        }
    }

    /// Fixed score assigned to a model-produced label
    pub fn to_score(&self) -> f64 {
        match self {
            SentimentLabel::Positive => 0.8,
            SentimentLabel::Negative => -0.8,
            SentimentLabel::Neutral => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

/// Dominant emotion expressed in a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Emotion {
    Fear,
    Greed,
    Optimism,
    Pessimism,
    Neutral,
}

impl From<String> for Emotion {
    fn from(tag: String) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "fear" => Emotion::Fear,
            "greed" => Emotion::Greed,
            "optimism" => Emotion::Optimism,
            "pessimism" => Emotion::Pessimism,
            _ => Emotion::Neutral,
        }
    }
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Fear => "fear",
            Emotion::Greed => "greed",
            Emotion::Optimism => "optimism",
            Emotion::Pessimism => "pessimism",
            Emotion::Neutral => "neutral",
        }
    }
}

/// Sentiment of a single piece of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SentimentResult {
    /// Polarity, -1.0 to 1.0
    pub score: f64,
    /// Strength regardless of polarity, 0.0 to 1.0
    pub magnitude: f64,
    pub label: SentimentLabel,
    /// 0.0 to 1.0
    pub confidence: f64,
    pub topics: Vec<String>,
    pub emotion: Emotion,
    pub summary: String,
}

impl SentimentResult {
    /// Result used when no backend could analyze the text
    pub fn failed() -> Self {
        Self {
            score: 0.0,
            magnitude: 0.0,
            label: SentimentLabel::Neutral,
            confidence: 0.0,
            topics: Vec::new(),
            emotion: Emotion::Neutral,
            summary: "Analysis failed".to_string(),
        }
    }
}

/// Aggregate sentiment over all posts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct OverallSentiment {
    pub score: f64,
    pub magnitude: f64,
    pub label: SentimentLabel,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct BuzzMetrics {
    /// post count × |mean sentiment|
    pub intensity: f64,
    /// Number of posts analyzed
    pub volume: usize,
    /// Population standard deviation of per-post scores
    pub sentiment_volatility: f64,
    pub dominant_emotion: Emotion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct TopicCount {
    pub topic: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SentimentDistribution {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl SentimentDistribution {
    /// Bucket a single score using [`BUCKET_THRESHOLD`]
    pub fn record(&mut self, score: f64) {
        match SentimentLabel::classify(score, BUCKET_THRESHOLD) {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Negative => self.negative += 1,
            SentimentLabel::Neutral => self.neutral += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }
}

/// Mean sentiment for the posts of one platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PlatformSentiment {
    pub platform: Platform,
    pub score: f64,
    pub label: SentimentLabel,
    pub posts: usize,
}

/// Aggregate social buzz for a ticker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct BuzzSummary {
    pub symbol: String,
    pub overall_sentiment: OverallSentiment,
    pub buzz_metrics: BuzzMetrics,
    pub trending_topics: Vec<TopicCount>,
    pub sentiment_distribution: SentimentDistribution,
    #[serde(default)]
    pub platform_breakdown: Vec<PlatformSentiment>,
    pub analyzed_at: DateTime<Utc>,
}

impl BuzzSummary {
    /// Summary for a symbol with no posts
    pub fn empty(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            overall_sentiment: OverallSentiment {
                score: 0.0,
                magnitude: 0.0,
                label: SentimentLabel::Neutral,
                confidence: 0.0,
            },
            buzz_metrics: BuzzMetrics {
                intensity: 0.0,
                volume: 0,
                sentiment_volatility: 0.0,
                dominant_emotion: Emotion::Neutral,
            },
            trending_topics: Vec::new(),
            sentiment_distribution: SentimentDistribution::default(),
            platform_breakdown: Vec::new(),
            analyzed_at: Utc::now(),
        }
    }
}

/// Daily price bar (oldest first when in a sequence)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PriceBar {
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    pub close: f64,
    #[serde(default)]
    pub volume: u64,
}

impl PriceBar {
    pub fn new(close: f64, volume: u64) -> Self {
        Self {
            timestamp: None,
            close,
            volume,
        }
    }
}

/// Predicted short-term price direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Bullish => "bullish",
            Direction::Bearish => "bearish",
            Direction::Neutral => "neutral",
        }
    }
}

/// Breakdown of the inputs behind a prediction
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PredictionFactors {
    pub price_momentum: f64,
    pub volume_trend: f64,
    /// Sum of the SMA5 and SMA20 deviations
    pub technical_indicators: f64,
    pub sentiment_impact: f64,
    /// Buzz intensity / 1000 (reported only, not weighted)
    pub buzz_impact: f64,
}

/// Heuristic price-direction estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PredictionResult {
    pub symbol: String,
    pub direction: Direction,
    pub confidence: f64,
    pub score: f64,
    /// `score × 5`; a rough scaling, not a fitted estimate
    pub expected_change_percent: f64,
    pub timeframe: String,
    pub factors: PredictionFactors,
    pub predicted_at: DateTime<Utc>,
}

/// Horizon every prediction refers to
pub const PREDICTION_TIMEFRAME: &str = "24h";

impl PredictionResult {
    /// Prediction returned when there is not enough (or unusable) price history
    pub fn empty(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            direction: Direction::Neutral,
            confidence: 0.0,
            score: 0.0,
            expected_change_percent: 0.0,
            timeframe: PREDICTION_TIMEFRAME.to_string(),
            factors: PredictionFactors::default(),
            predicted_at: Utc::now(),
        }
    }
}

/// Current quote snapshot used for narrative reports
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct StockSnapshot {
    pub price: f64,
    #[serde(default)]
    pub change: f64,
    #[serde(default)]
    pub change_percent: f64,
    #[serde(default)]
    pub volume: Option<u64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Buy,
    Hold,
    Sell,
}

impl Recommendation {
    /// Lenient parse: model replies often read "buy - strong momentum"
    pub fn parse(text: &str) -> Self {
        let lower = text.trim().to_lowercase();
        if lower.starts_with("buy") {
            Recommendation::Buy
        } else if lower.starts_with("sell") {
            Recommendation::Sell
        } else {
            Recommendation::Hold
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn parse(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "high" => ConfidenceLevel::High,
            "low" => ConfidenceLevel::Low,
            _ => ConfidenceLevel::Medium,
        }
    }
}

/// Short market report for a ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct NarrativeReport {
    pub market_overview: String,
    pub sentiment_analysis: String,
    pub technical_analysis: String,
    pub risk_assessment: String,
    pub recommendation: Recommendation,
    pub confidence_level: ConfidenceLevel,
    pub key_factors: Vec<String>,
}

/// Where a narrative report came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    Generated,
    Template,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AiSummary {
    pub symbol: String,
    pub summary: NarrativeReport,
    pub source: SummarySource,
    pub generated_at: DateTime<Utc>,
}
