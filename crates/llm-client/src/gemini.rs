use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{LlmError, LlmResult};
use crate::provider::TextGenerator;
use crate::LlmConfig;

const BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Client for the Gemini `generateContent` REST endpoint
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> LlmResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            api_key,
            model,
        })
    }

    pub fn from_config(config: &LlmConfig) -> LlmResult<Self> {
        let mut client = Self::new(config.api_key.clone(), config.model.clone(), config.timeout)?;
        if let Some(url) = &config.base_url {
            client.base_url = url.trim_end_matches('/').to_string();
        }
        Ok(client)
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    // Key travels in a header so it never shows up in a request URL or a reqwest error
    fn request(&self, body: &GenerateRequest) -> reqwest::RequestBuilder {
        self.client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(body)
    }
}

/// Concatenate the text parts of the first candidate
fn first_candidate_text(response: GenerateResponse) -> LlmResult<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(LlmError::InvalidResponse("Empty response from Gemini".into()));
    }
    Ok(text)
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> LlmResult<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt.to_string() }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: 0.2,
            },
        };

        let response = self.request(&request).send().await?;

        if !response.status().is_success() {
            return Err(LlmError::ServiceUnavailable(format!(
                "Gemini status: {}",
                response.status()
            )));
        }

        let body = response.json::<GenerateResponse>().await?;
        first_candidate_text(body)
    }

    fn backend_name(&self) -> &'static str {
        "gemini"
    }
}
