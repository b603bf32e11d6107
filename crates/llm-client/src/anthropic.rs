use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{LlmError, LlmResult};
use crate::provider::TextGenerator;
use crate::LlmConfig;

const BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 800;

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Client for the Anthropic Messages API
#[derive(Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl AnthropicClient {
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
}

fn collect_text(response: MessagesResponse) -> LlmResult<String> {
    let text: String = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .map(|block| block.text)
        .collect();

    if text.trim().is_empty() {
        return Err(LlmError::InvalidResponse("Empty response from Anthropic".into()));
    }
    Ok(text)
}

#[async_trait]
impl TextGenerator for AnthropicClient {
    async fn generate(&self, prompt: &str) -> LlmResult<String> {
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LlmError::ServiceUnavailable(format!(
                "Anthropic status: {}",
                response.status()
            )));
        }

        let body = response.json::<MessagesResponse>().await?;
        collect_text(body)
    }

    fn backend_name(&self) -> &'static str {
        "anthropic"
    }
}
