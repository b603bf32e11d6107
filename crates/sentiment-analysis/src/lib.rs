pub mod buzz;
pub mod classifier;
pub mod lexicon;
pub mod llm;

pub use buzz::{summarize, BuzzAggregator};
pub use classifier::SentimentClassifier;
pub use lexicon::{LexicalEstimator, LexicalScore};
pub use llm::LlmSentimentBackend;
