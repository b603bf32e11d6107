use analysis_core::{SentimentBackend, SentimentResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::lexicon::LexicalEstimator;

/// Per-post sentiment classifier.
///
/// Holds an optional primary backend (normally model-backed) and a fallback
/// that implements the same contract. `classify` never fails: primary, then
/// fallback, then [`SentimentResult::failed`].
///
/// With a budget set, the primary gets one shared deadline per call to
/// [`SentimentClassifier::classify_all`]. Once it passes, every remaining
/// text goes straight to the fallback.
#[derive(Clone)]
pub struct SentimentClassifier {
    primary: Option<Arc<dyn SentimentBackend>>,
    fallback: Arc<dyn SentimentBackend>,
    budget: Option<Duration>,
}

impl SentimentClassifier {
    pub fn new(primary: Option<Arc<dyn SentimentBackend>>, fallback: Arc<dyn SentimentBackend>) -> Self {
        Self {
            primary,
            fallback,
            budget: None,
        }
    }

    /// Classifier that only uses the local lexical estimator
    pub fn lexical_only() -> Self {
        Self::new(None, Arc::new(LexicalEstimator::new()))
    }

    /// Model-backed classifier with the lexical estimator as fallback
    pub fn with_primary(primary: Arc<dyn SentimentBackend>) -> Self {
        Self::new(Some(primary), Arc::new(LexicalEstimator::new()))
    }

    /// Cap the total time spent waiting on the primary per batch
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    pub async fn classify(&self, text: &str) -> SentimentResult {
        let mut primary_open = true;
        self.classify_before(text, self.deadline(), &mut primary_open).await
    }

    /// Classify texts in order under a single deadline
    pub async fn classify_all<'a, I>(&self, texts: I) -> Vec<SentimentResult>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let deadline = self.deadline();
        let mut primary_open = true;
        let mut results = Vec::new();
        for text in texts {
            results.push(self.classify_before(text, deadline, &mut primary_open).await);
        }
        results
    }

    fn deadline(&self) -> Option<Instant> {
        self.budget.map(|budget| Instant::now() + budget)
    }

    async fn classify_before(
        &self,
        text: &str,
        deadline: Option<Instant>,
        primary_open: &mut bool,
    ) -> SentimentResult {
        if let Some(primary) = self.primary.as_ref().filter(|_| *primary_open) {
            let outcome = match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, primary.analyze(text)).await.ok(),
                None => Some(primary.analyze(text).await),
            };

            match outcome {
                Some(Ok(result)) => return result,
                Some(Err(e)) => {
                    if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                        *primary_open = false;
                    }
                    tracing::warn!(
                        "{} sentiment analysis failed, falling back to {}: {}",
                        primary.name(),
                        self.fallback.name(),
                        e
                    );
                }
                None => {
                    *primary_open = false;
                    tracing::warn!(
                        "{} sentiment budget exhausted, using {} for the remaining posts",
                        primary.name(),
                        self.fallback.name()
                    );
                }
            }
        }

        match self.fallback.analyze(text).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("{} sentiment analysis failed: {}", self.fallback.name(), e);
                SentimentResult::failed()
            }
        }
    }
}

impl Default for SentimentClassifier {
    fn default() -> Self {
        Self::lexical_only()
    }
}
