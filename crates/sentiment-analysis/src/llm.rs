use analysis_core::{AnalysisError, Emotion, SentimentBackend, SentimentLabel, SentimentResult};
use async_trait::async_trait;
use llm_client::{generate_with_timeout, parse_json_reply, TextGenerator};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Shape the model is asked to return
#[derive(Debug, Deserialize)]
struct SentimentReply {
    sentiment: String,
    confidence: f64,
    magnitude: f64,
    #[serde(default)]
    key_topics: Vec<String>,
    #[serde(default)]
    emotion: Option<Emotion>,
    #[serde(default)]
    summary: String,
}

fn build_prompt(text: &str) -> String {
    format!(
        r#"Analyze the sentiment of this financial text and provide a detailed analysis.

Text: {text}

Respond in JSON format with the following structure:
{{
    "sentiment": "positive|negative|neutral",
    "confidence": 0.0-1.0,
    "magnitude": 0.0-1.0,
    "key_topics": ["topic1", "topic2"],
    "emotion": "fear|greed|optimism|pessimism|neutral",
    "summary": "Brief summary of the sentiment"
}}

Focus on financial context and market implications."#
    )
}

/// Turn a raw completion into a validated result
fn parse_reply(raw: &str) -> Result<SentimentResult, AnalysisError> {
    let reply: SentimentReply =
        parse_json_reply(raw).map_err(|e| AnalysisError::ApiError(e.to_string()))?;

    let label = SentimentLabel::parse(&reply.sentiment).ok_or_else(|| {
        AnalysisError::InvalidData(format!("unexpected sentiment label '{}'", reply.sentiment))
    })?;

    let topics = reply
        .key_topics
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    Ok(SentimentResult {
        score: label.to_score(),
        magnitude: reply.magnitude.clamp(0.0, 1.0),
        label,
        confidence: reply.confidence.clamp(0.0, 1.0),
        topics,
        emotion: reply.emotion.unwrap_or(Emotion::Neutral),
        summary: reply.summary,
    })
}

/// Model-backed sentiment analysis through an injected [`TextGenerator`]
pub struct LlmSentimentBackend {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl LlmSentimentBackend {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }
}

#[async_trait]
impl SentimentBackend for LlmSentimentBackend {
    async fn analyze(&self, text: &str) -> Result<SentimentResult, AnalysisError> {
        let prompt = build_prompt(text);
        let raw = generate_with_timeout(self.generator.as_ref(), &prompt, self.timeout)
            .await
            .map_err(|e| AnalysisError::ApiError(format!("{} sentiment call failed: {}", self.generator.backend_name(), e)))?;
        parse_reply(&raw)
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}
