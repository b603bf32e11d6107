use async_trait::async_trait;
use std::time::Duration;

use crate::error::{LlmError, LlmResult};

/// Backend-agnostic interface for text completion.
///
/// Implemented by the hosted-model HTTP clients; tests substitute canned fakes.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send a prompt and return the raw completion text.
    async fn generate(&self, prompt: &str) -> LlmResult<String>;

    fn backend_name(&self) -> &'static str;
}

/// Run a completion bounded by `timeout`. Dropping the inner future cancels the request.
pub async fn generate_with_timeout(
    generator: &dyn TextGenerator,
    prompt: &str,
    timeout: Duration,
) -> LlmResult<String> {
    match tokio::time::timeout(timeout, generator.generate(prompt)).await {
        Ok(result) => result,
        Err(_) => Err(LlmError::Timeout(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowGenerator;

    #[async_trait]
    impl TextGenerator for SlowGenerator {
        async fn generate(&self, _prompt: &str) -> LlmResult<String> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("too late".to_string())
        }

        fn backend_name(&self) -> &'static str {
            "slow"
        }
    }

    struct EchoGenerator;

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn generate(&self, prompt: &str) -> LlmResult<String> {
            Ok(prompt.to_uppercase())
        }

        fn backend_name(&self) -> &'static str {
            "echo"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_reported() {
        let result = generate_with_timeout(&SlowGenerator, "hi", Duration::from_secs(2)).await;
        assert!(matches!(result, Err(LlmError::Timeout(d)) if d == Duration::from_secs(2)));
    }

    #[tokio::test]
    async fn test_fast_completion_passes_through() {
        let result = generate_with_timeout(&EchoGenerator, "hi", Duration::from_secs(2)).await;
        assert_eq!(result.unwrap(), "HI");
    }
}
