//! Narrative market report for a ticker, model-written when possible and
//! templated from the numbers otherwise.

use analysis_core::{
    AiSummary, BuzzSummary, ConfidenceLevel, Direction, NarrativeReport, PredictionResult,
    Recommendation, StockSnapshot, SummarySource,
};
use chrono::Utc;
use llm_client::{
    generate_with_timeout, parse_json_reply, LlmError, LlmResult, TextGenerator,
    DEFAULT_TIMEOUT_SECS,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Buzz intensity below this reads as "low"
const LOW_BUZZ_INTENSITY: f64 = 2.0;
/// Buzz intensity at or above this reads as "high"
const HIGH_BUZZ_INTENSITY: f64 = 10.0;

const TEMPLATE_KEY_FACTORS: [&str; 3] = ["Price momentum", "Volume trends", "Market sentiment"];

#[derive(Debug, Deserialize)]
struct ReportReply {
    market_overview: String,
    sentiment_analysis: String,
    technical_analysis: String,
    risk_assessment: String,
    recommendation: String,
    confidence_level: String,
    #[serde(default)]
    key_factors: Vec<String>,
}

fn buzz_level(intensity: f64) -> &'static str {
    if intensity >= HIGH_BUZZ_INTENSITY {
        "high"
    } else if intensity >= LOW_BUZZ_INTENSITY {
        "moderate"
    } else {
        "low"
    }
}

fn or_na<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string())
}

fn build_prompt(
    symbol: &str,
    snapshot: &StockSnapshot,
    buzz: &BuzzSummary,
    prediction: &PredictionResult,
) -> String {
    let topics: Vec<&str> = buzz.trending_topics.iter().map(|t| t.topic.as_str()).collect();

    format!(
        r#"Generate a comprehensive market analysis for {symbol} based on the following data:

Stock Data:
- Current Price: ${price:.2}
- Change: {change:.2} ({change_percent:.2}%)
- Volume: {volume}
- Market Cap: {market_cap}

Sentiment Analysis:
- Overall Sentiment: {label}
- Sentiment Score: {score:.3}
- Buzz Intensity: {intensity:.1}
- Trending Topics: [{topics}]

Price Prediction:
- Direction: {direction}
- Confidence: {confidence:.1}%
- Expected Change: {expected:.2}%

Provide a professional analysis in JSON format with:
{{
    "market_overview": "Brief market overview",
    "sentiment_analysis": "Detailed sentiment breakdown",
    "technical_analysis": "Technical indicators summary",
    "risk_assessment": "Key risks and considerations",
    "recommendation": "buy|hold|sell with reasoning",
    "confidence_level": "high|medium|low",
    "key_factors": ["factor1", "factor2", "factor3"]
}}"#,
        price = snapshot.price,
        change = snapshot.change,
        change_percent = snapshot.change_percent,
        volume = or_na(snapshot.volume),
        market_cap = or_na(snapshot.market_cap),
        label = buzz.overall_sentiment.label.as_str(),
        score = buzz.overall_sentiment.score,
        intensity = buzz.buzz_metrics.intensity,
        topics = topics.join(", "),
        direction = prediction.direction.as_str(),
        confidence = prediction.confidence * 100.0,
        expected = prediction.expected_change_percent,
    )
}

fn parse_report(raw: &str) -> LlmResult<NarrativeReport> {
    let reply: ReportReply = parse_json_reply(raw)?;
    if reply.market_overview.trim().is_empty() {
        return Err(LlmError::InvalidResponse("empty market overview".to_string()));
    }

    Ok(NarrativeReport {
        market_overview: reply.market_overview,
        sentiment_analysis: reply.sentiment_analysis,
        technical_analysis: reply.technical_analysis,
        risk_assessment: reply.risk_assessment,
        recommendation: Recommendation::parse(&reply.recommendation),
        confidence_level: ConfidenceLevel::parse(&reply.confidence_level),
        key_factors: reply.key_factors,
    })
}

/// Report built purely from the numeric fields
pub fn template_report(
    symbol: &str,
    snapshot: &StockSnapshot,
    buzz: &BuzzSummary,
    prediction: &PredictionResult,
) -> NarrativeReport {
    let technical_analysis = match prediction.direction {
        Direction::Bullish => format!(
            "Technical indicators lean bullish with {:.2}% price momentum.",
            prediction.factors.price_momentum * 100.0
        ),
        Direction::Bearish => format!(
            "Technical indicators lean bearish with {:.2}% price momentum.",
            prediction.factors.price_momentum * 100.0
        ),
        Direction::Neutral => "Technical indicators show mixed signals.".to_string(),
    };

    NarrativeReport {
        market_overview: format!(
            "{} is currently trading at ${:.2} with {:.2}% change.",
            symbol, snapshot.price, snapshot.change_percent
        ),
        sentiment_analysis: format!(
            "Social media sentiment is {} with {} buzz activity.",
            buzz.overall_sentiment.label.as_str(),
            buzz_level(buzz.buzz_metrics.intensity)
        ),
        technical_analysis,
        risk_assessment: "Consider market volatility and external factors.".to_string(),
        recommendation: Recommendation::Hold,
        confidence_level: ConfidenceLevel::Medium,
        key_factors: TEMPLATE_KEY_FACTORS.iter().map(|f| f.to_string()).collect(),
    }
}

/// Writes the narrative report, through a model when one is configured
#[derive(Clone)]
pub struct NarrativeGenerator {
    generator: Option<Arc<dyn TextGenerator>>,
    timeout: Duration,
}

impl Default for NarrativeGenerator {
    fn default() -> Self {
        Self {
            generator: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl NarrativeGenerator {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// Generator that always uses the template
    pub fn template_only() -> Self {
        Self::default()
    }

    pub async fn summarize(
        &self,
        symbol: &str,
        snapshot: &StockSnapshot,
        buzz: &BuzzSummary,
        prediction: &PredictionResult,
    ) -> AiSummary {
        if let Some(generator) = &self.generator {
            let prompt = build_prompt(symbol, snapshot, buzz, prediction);
            let generated = generate_with_timeout(generator.as_ref(), &prompt, self.timeout)
                .await
                .and_then(|raw| parse_report(&raw));

            match generated {
                Ok(summary) => {
                    return AiSummary {
                        symbol: symbol.to_string(),
                        summary,
                        source: SummarySource::Generated,
                        generated_at: Utc::now(),
                    };
                }
                Err(e) => tracing::warn!("AI summary generation failed for {}: {}", symbol, e),
            }
        }

        AiSummary {
            symbol: symbol.to_string(),
            summary: template_report(symbol, snapshot, buzz, prediction),
            source: SummarySource::Template,
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::SentimentLabel;
    use async_trait::async_trait;

    struct CannedGenerator(Option<String>);

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, prompt: &str) -> LlmResult<String> {
            assert!(prompt.contains("Generate a comprehensive market analysis for NVDA"));
            self.0
                .clone()
                .ok_or_else(|| LlmError::ServiceUnavailable("quota exceeded".into()))
        }

        fn backend_name(&self) -> &'static str {
            "canned"
        }
    }

    fn snapshot() -> StockSnapshot {
        StockSnapshot {
            price: 875.5,
            change: 12.25,
            change_percent: 1.42,
            volume: Some(41_000_000),
            market_cap: None,
        }
    }

    fn buzz(intensity: f64) -> BuzzSummary {
        let mut buzz = BuzzSummary::empty("NVDA");
        buzz.overall_sentiment.label = SentimentLabel::Positive;
        buzz.overall_sentiment.score = 0.5;
        buzz.buzz_metrics.intensity = intensity;
        buzz
    }

    fn generator(reply: Option<&str>) -> NarrativeGenerator {
        NarrativeGenerator::new(
            Some(Arc::new(CannedGenerator(reply.map(str::to_string)))),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_default_uses_model_timeout() {
        let narrator = NarrativeGenerator::default();
        assert!(narrator.generator.is_none());
        assert_eq!(narrator.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(NarrativeGenerator::template_only().timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_template_without_generator() {
        let summary = NarrativeGenerator::template_only()
            .summarize("NVDA", &snapshot(), &buzz(4.0), &PredictionResult::empty("NVDA"))
            .await;

        assert_eq!(summary.source, SummarySource::Template);
        assert_eq!(
            summary.summary.market_overview,
            "NVDA is currently trading at $875.50 with 1.42% change."
        );
        assert_eq!(
            summary.summary.sentiment_analysis,
            "Social media sentiment is positive with moderate buzz activity."
        );
        assert_eq!(summary.summary.technical_analysis, "Technical indicators show mixed signals.");
        assert_eq!(summary.summary.recommendation, Recommendation::Hold);
        assert_eq!(summary.summary.confidence_level, ConfidenceLevel::Medium);
        assert_eq!(summary.summary.key_factors.len(), 3);
    }

    #[tokio::test]
    async fn test_generated_report() {
        let reply = r#"{
            "market_overview": "NVDA extends gains.",
            "sentiment_analysis": "Retail chatter is upbeat.",
            "technical_analysis": "Above both moving averages.",
            "risk_assessment": "Valuation stretched.",
            "recommendation": "Buy on strength",
            "confidence_level": "High",
            "key_factors": ["AI demand", "Data center"]
        }"#;
        let summary = generator(Some(reply))
            .summarize("NVDA", &snapshot(), &buzz(4.0), &PredictionResult::empty("NVDA"))
            .await;

        assert_eq!(summary.source, SummarySource::Generated);
        assert_eq!(summary.summary.market_overview, "NVDA extends gains.");
        assert_eq!(summary.summary.recommendation, Recommendation::Buy);
        assert_eq!(summary.summary.confidence_level, ConfidenceLevel::High);
        assert_eq!(summary.summary.key_factors, vec!["AI demand", "Data center"]);
    }

    #[tokio::test]
    async fn test_unparsable_reply_uses_template() {
        let summary = generator(Some("NVDA looks great, buy it!"))
            .summarize("NVDA", &snapshot(), &buzz(0.5), &PredictionResult::empty("NVDA"))
            .await;
        assert_eq!(summary.source, SummarySource::Template);
        assert!(summary.summary.sentiment_analysis.contains("low buzz"));
    }

    #[tokio::test]
    async fn test_generator_error_uses_template() {
        let summary = generator(None)
            .summarize("NVDA", &snapshot(), &buzz(25.0), &PredictionResult::empty("NVDA"))
            .await;
        assert_eq!(summary.source, SummarySource::Template);
        assert!(summary.summary.sentiment_analysis.contains("high buzz"));
    }

    #[test]
    fn test_prompt_contents() {
        let mut prediction = PredictionResult::empty("NVDA");
        prediction.direction = Direction::Bullish;
        prediction.confidence = 0.75;
        prediction.expected_change_percent = 0.4;
        let mut buzz = buzz(3.0);
        buzz.trending_topics = vec![
            analysis_core::TopicCount { topic: "ai".into(), count: 3 },
            analysis_core::TopicCount { topic: "earnings".into(), count: 1 },
        ];

        let prompt = build_prompt("NVDA", &snapshot(), &buzz, &prediction);
        assert!(prompt.contains("- Current Price: $875.50"));
        assert!(prompt.contains("- Volume: 41000000"));
        assert!(prompt.contains("- Market Cap: N/A"));
        assert!(prompt.contains("- Trending Topics: [ai, earnings]"));
        assert!(prompt.contains("- Direction: bullish"));
        assert!(prompt.contains("- Confidence: 75.0%"));
    }

    #[test]
    fn test_directional_template_lines() {
        let mut prediction = PredictionResult::empty("NVDA");
        prediction.direction = Direction::Bearish;
        prediction.factors.price_momentum = -0.0312;
        let report = template_report("NVDA", &snapshot(), &buzz(1.0), &prediction);
        assert_eq!(
            report.technical_analysis,
            "Technical indicators lean bearish with -3.12% price momentum."
        );
    }
}
