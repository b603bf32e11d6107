//! Buzz aggregation: folds per-post sentiment into a ticker-level summary.

use analysis_core::{
    stats, BuzzMetrics, BuzzSummary, Emotion, OverallSentiment, PlatformSentiment,
    SentimentDistribution, SentimentLabel, SentimentResult, SocialPost, TopicCount,
    LABEL_THRESHOLD, TRENDING_TOPIC_LIMIT,
};
use chrono::Utc;

use crate::classifier::SentimentClassifier;

/// Upper bound on the overall confidence
const MAX_CONFIDENCE: f64 = 0.9;

/// Count items keeping first-seen order, so later stable sorts and
/// max-by-count break ties in favour of whatever appeared first.
fn ordered_counts<T: PartialEq + Clone>(items: impl IntoIterator<Item = T>) -> Vec<(T, usize)> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(seen, _)| *seen == item) {
            Some((_, count)) => *count += 1,
            None => counts.push((item, 1)),
        }
    }
    counts
}

fn trending_topics(results: &[SentimentResult]) -> Vec<TopicCount> {
    let mut counts = ordered_counts(results.iter().flat_map(|r| r.topics.iter().cloned()));
    // sort_by is stable
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(TRENDING_TOPIC_LIMIT)
        .map(|(topic, count)| TopicCount { topic, count })
        .collect()
}

fn dominant_emotion(results: &[SentimentResult]) -> Emotion {
    let counts = ordered_counts(results.iter().map(|r| r.emotion));
    let mut best: Option<(Emotion, usize)> = None;
    for (emotion, count) in counts {
        // Strictly greater keeps the earliest on ties
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((emotion, count));
        }
    }
    best.map(|(emotion, _)| emotion).unwrap_or(Emotion::Neutral)
}

fn platform_breakdown(posts: &[SocialPost], scores: &[f64]) -> Vec<PlatformSentiment> {
    let platforms = ordered_counts(posts.iter().map(|p| p.platform));
    platforms
        .into_iter()
        .map(|(platform, count)| {
            let platform_scores: Vec<f64> = posts
                .iter()
                .zip(scores)
                .filter(|(post, _)| post.platform == platform)
                .map(|(_, &score)| score)
                .collect();
            let score = stats::mean(&platform_scores);
            PlatformSentiment {
                platform,
                score,
                label: SentimentLabel::classify(score, LABEL_THRESHOLD),
                posts: count,
            }
        })
        .collect()
}

/// Build a buzz summary from posts that have already been classified.
///
/// `results[i]` must belong to `posts[i]`; extra entries on either side are ignored.
pub fn summarize(symbol: &str, posts: &[SocialPost], results: &[SentimentResult]) -> BuzzSummary {
    let len = posts.len().min(results.len());
    if len == 0 {
        return BuzzSummary::empty(symbol);
    }
    let posts = &posts[..len];
    let results = &results[..len];

    let scores: Vec<f64> = results.iter().map(|r| r.score).collect();
    let avg_sentiment = stats::mean(&scores);

    let mut distribution = SentimentDistribution::default();
    for &score in &scores {
        distribution.record(score);
    }

    BuzzSummary {
        symbol: symbol.to_string(),
        overall_sentiment: OverallSentiment {
            score: avg_sentiment,
            magnitude: avg_sentiment.abs(),
            label: SentimentLabel::classify(avg_sentiment, LABEL_THRESHOLD),
            confidence: MAX_CONFIDENCE.min(0.5 + avg_sentiment.abs() * 0.4),
        },
        buzz_metrics: BuzzMetrics {
            intensity: len as f64 * avg_sentiment.abs(),
            volume: len,
            sentiment_volatility: stats::population_std_dev(&scores),
            dominant_emotion: dominant_emotion(results),
        },
        trending_topics: trending_topics(results),
        sentiment_distribution: distribution,
        platform_breakdown: platform_breakdown(posts, &scores),
        analyzed_at: Utc::now(),
    }
}

/// Classifies every post and aggregates the results
#[derive(Clone, Default)]
pub struct BuzzAggregator {
    classifier: SentimentClassifier,
}

impl BuzzAggregator {
    pub fn new(classifier: SentimentClassifier) -> Self {
        Self { classifier }
    }

    pub async fn analyze(&self, symbol: &str, posts: &[SocialPost]) -> BuzzSummary {
        if posts.is_empty() {
            return BuzzSummary::empty(symbol);
        }

        let results = self
            .classifier
            .classify_all(posts.iter().map((|p| p.content.as_str()) as fn(&SocialPost) -> &str))
            .await;

        let summary = summarize(symbol, posts, &results);
        tracing::debug!(
            "{}: {} posts, mean sentiment {:.3} ({})",
            symbol,
            summary.buzz_metrics.volume,
            summary.overall_sentiment.score,
            summary.overall_sentiment.label.as_str()
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmSentimentBackend;
    use analysis_core::Platform;
    use async_trait::async_trait;
    use chrono::Utc;
    use llm_client::{LlmResult, TextGenerator};
    use std::sync::Arc;
    use std::time::Duration;

    struct HungGenerator;

    #[async_trait]
    impl TextGenerator for HungGenerator {
        async fn generate(&self, _prompt: &str) -> LlmResult<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("{}".to_string())
        }

        fn backend_name(&self) -> &'static str {
            "hung"
        }
    }

    fn post(id: &str, content: &str, platform: Platform) -> SocialPost {
        SocialPost {
            id: id.to_string(),
            author: "tester".to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
            platform,
        }
    }

    fn result(score: f64, topics: &[&str], emotion: Emotion) -> SentimentResult {
        SentimentResult {
            score,
            magnitude: score.abs(),
            label: SentimentLabel::classify(score, 0.1),
            confidence: 0.8,
            topics: topics.iter().map(|t| t.to_string()).collect(),
            emotion,
            summary: String::new(),
        }
    }

    fn posts(n: usize) -> Vec<SocialPost> {
        (0..n).map(|i| post(&i.to_string(), "text", Platform::Reddit)).collect()
    }

    #[test]
    fn test_empty_input() {
        let summary = summarize("TSLA", &[], &[]);
        assert_eq!(summary.symbol, "TSLA");
        assert_eq!(summary.buzz_metrics.volume, 0);
        assert_eq!(summary.sentiment_distribution, SentimentDistribution::default());
        assert!(summary.trending_topics.is_empty());
        assert_eq!(summary.buzz_metrics.dominant_emotion, Emotion::Neutral);
        assert_eq!(summary.overall_sentiment.confidence, 0.0);
    }

    #[test]
    fn test_all_positive_posts() {
        let results: Vec<_> = (0..4).map(|_| result(0.8, &[], Emotion::Optimism)).collect();
        let summary = summarize("NVDA", &posts(4), &results);

        assert_eq!(summary.overall_sentiment.label, SentimentLabel::Positive);
        assert!((summary.overall_sentiment.confidence - 0.82).abs() < 1e-12);
        assert!((summary.overall_sentiment.score - 0.8).abs() < 1e-12);
        assert_eq!(summary.buzz_metrics.sentiment_volatility, 0.0);
        assert!((summary.buzz_metrics.intensity - 3.2).abs() < 1e-12);
        assert_eq!(summary.sentiment_distribution.positive, 4);
        assert_eq!(summary.buzz_metrics.dominant_emotion, Emotion::Optimism);
    }

    #[test]
    fn test_confidence_saturates() {
        // |mean| = 1.0 would give 0.9 exactly; anything stronger is capped
        let results: Vec<_> = (0..2).map(|_| result(-1.0, &[], Emotion::Fear)).collect();
        let summary = summarize("GME", &posts(2), &results);
        assert_eq!(summary.overall_sentiment.confidence, 0.9);
        assert_eq!(summary.overall_sentiment.label, SentimentLabel::Negative);
    }

    #[test]
    fn test_label_and_bucket_thresholds_differ() {
        // Mean of 0.15: neutral overall, but every post is in the positive bucket
        let results: Vec<_> = (0..3).map(|_| result(0.15, &[], Emotion::Neutral)).collect();
        let summary = summarize("AMD", &posts(3), &results);
        assert_eq!(summary.overall_sentiment.label, SentimentLabel::Neutral);
        assert_eq!(summary.sentiment_distribution.positive, 3);
        assert_eq!(summary.sentiment_distribution.neutral, 0);
    }

    #[test]
    fn test_volatility_is_population_std_dev() {
        let results = vec![
            result(0.8, &[], Emotion::Neutral),
            result(-0.8, &[], Emotion::Neutral),
        ];
        let summary = summarize("SPY", &posts(2), &results);
        assert!((summary.buzz_metrics.sentiment_volatility - 0.8).abs() < 1e-12);
        assert_eq!(summary.overall_sentiment.score, 0.0);
        assert_eq!(summary.buzz_metrics.intensity, 0.0);
    }

    #[test]
    fn test_trending_topics_rank_and_ties() {
        let results = vec![
            result(0.8, &["earnings", "ai", "tariffs"], Emotion::Neutral),
            result(0.0, &["ai", "vision pro"], Emotion::Neutral),
            result(0.0, &["buyback", "iphone", "services"], Emotion::Neutral),
            result(0.0, &["tariffs"], Emotion::Neutral),
        ];
        let summary = summarize("AAPL", &posts(4), &results);
        let topics: Vec<(&str, usize)> = summary
            .trending_topics
            .iter()
            .map(|t| (t.topic.as_str(), t.count))
            .collect();

        assert_eq!(
            topics,
            vec![
                ("ai", 2),
                ("tariffs", 2),
                ("earnings", 1),
                ("vision pro", 1),
                ("buyback", 1),
            ]
        );
    }

    #[test]
    fn test_dominant_emotion_tie_goes_to_first_seen() {
        let results = vec![
            result(0.0, &[], Emotion::Greed),
            result(0.0, &[], Emotion::Fear),
            result(0.0, &[], Emotion::Fear),
            result(0.0, &[], Emotion::Greed),
        ];
        let summary = summarize("COIN", &posts(4), &results);
        assert_eq!(summary.buzz_metrics.dominant_emotion, Emotion::Greed);
    }

    #[test]
    fn test_distribution_sums_to_volume() {
        let scores = [0.8, -0.8, 0.0, 0.1, -0.1, 0.35, -0.05, 0.7, -0.9];
        let results: Vec<_> = scores.iter().map(|&s| result(s, &[], Emotion::Neutral)).collect();
        let summary = summarize("PLTR", &posts(scores.len()), &results);
        assert_eq!(summary.sentiment_distribution.total(), summary.buzz_metrics.volume);
        assert_eq!(summary.sentiment_distribution.positive, 3);
        assert_eq!(summary.sentiment_distribution.negative, 2);
        assert_eq!(summary.sentiment_distribution.neutral, 4);
    }

    #[test]
    fn test_platform_breakdown() {
        let posts = vec![
            post("1", "a", Platform::Twitter),
            post("2", "b", Platform::Reddit),
            post("3", "c", Platform::Twitter),
        ];
        let results = vec![
            result(0.8, &[], Emotion::Neutral),
            result(-0.8, &[], Emotion::Neutral),
            result(0.0, &[], Emotion::Neutral),
        ];
        let summary = summarize("MSFT", &posts, &results);
        let platforms: Vec<Platform> = summary.platform_breakdown.iter().map(|p| p.platform).collect();
        assert_eq!(platforms, vec![Platform::Twitter, Platform::Reddit]);

        let twitter = &summary.platform_breakdown[0];
        assert_eq!(twitter.posts, 2);
        assert!((twitter.score - 0.4).abs() < 1e-12);
        assert_eq!(twitter.label, SentimentLabel::Positive);

        let reddit = &summary.platform_breakdown[1];
        assert_eq!(reddit.label, SentimentLabel::Negative);
    }

    #[tokio::test]
    async fn test_aggregator_with_lexical_classifier() {
        let aggregator = BuzzAggregator::default();
        let posts = vec![
            post("1", "Huge rally today, very bullish on this", Platform::Reddit),
            post("2", "Earnings beat and strong guidance", Platform::Twitter),
            post("3", "Company files quarterly report", Platform::News),
        ];
        let summary = aggregator.analyze("AAPL", &posts).await;

        assert_eq!(summary.buzz_metrics.volume, 3);
        assert_eq!(summary.sentiment_distribution.total(), 3);
        assert_eq!(summary.sentiment_distribution.positive, 2);
        assert_eq!(summary.sentiment_distribution.neutral, 1);
        // Lexical results carry no topics or emotion
        assert!(summary.trending_topics.is_empty());
        assert_eq!(summary.buzz_metrics.dominant_emotion, Emotion::Neutral);
    }

    #[tokio::test]
    async fn test_aggregator_empty_posts() {
        let summary = BuzzAggregator::default().analyze("AAPL", &[]).await;
        assert_eq!(summary.buzz_metrics.volume, 0);
        assert_eq!(summary.sentiment_distribution.total(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_model_costs_one_timeout_per_batch() {
        let timeout = Duration::from_secs(10);
        let backend = LlmSentimentBackend::new(Arc::new(HungGenerator), timeout);
        let classifier = SentimentClassifier::with_primary(Arc::new(backend)).with_budget(timeout);
        let aggregator = BuzzAggregator::new(classifier);
        let posts: Vec<SocialPost> = (0..100)
            .map(|i| post(&i.to_string(), "Huge rally, very bullish", Platform::Reddit))
            .collect();

        let start = tokio::time::Instant::now();
        let summary = aggregator.analyze("AAPL", &posts).await;

        assert!(start.elapsed() < Duration::from_secs(11));
        assert_eq!(summary.buzz_metrics.volume, 100);
        // Every post was scored by the lexical fallback
        assert_eq!(summary.sentiment_distribution.positive, 100);
        assert!(summary.trending_topics.is_empty());
    }
}
