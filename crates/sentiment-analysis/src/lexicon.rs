//! Local lexical polarity estimator.
//!
//! Scores text against a financial word list. Each opinion word carries a
//! signed weight; a negation word within [`NEGATION_WINDOW`] tokens before it
//! flips the sign. Polarity is the mean signed weight of the opinion words and
//! subjectivity is the share of tokens that carry an opinion.

use analysis_core::{AnalysisError, Emotion, SentimentBackend, SentimentLabel, SentimentResult};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "aren't",
    "wasn't", "weren't", "won't", "wouldn't", "couldn't", "shouldn't", "hardly",
    "barely", "neither", "nor", "without", "dont", "isnt", "wont",
];

const NEGATION_WINDOW: usize = 3;

/// Polarity above/below ± this value is labelled positive/negative
const POLARITY_THRESHOLD: f64 = 0.1;

/// Fixed confidence reported for lexical results
const LEXICAL_CONFIDENCE: f64 = 0.7;

const POSITIVE_WORDS: &[(&str, f64)] = &[
    // Strong
    ("soar", 1.0), ("soaring", 1.0), ("skyrocket", 1.0), ("moon", 1.0), ("mooning", 1.0),
    ("breakthrough", 0.9), ("record", 0.8), ("surge", 0.9), ("surging", 0.9),
    ("bullish", 0.9), ("rally", 0.8), ("outperform", 0.8), ("beat", 0.7),
    // Moderate
    ("gain", 0.6), ("gains", 0.6), ("profit", 0.6), ("growth", 0.6), ("strong", 0.6),
    ("upgrade", 0.7), ("upgraded", 0.7), ("exceed", 0.6), ("momentum", 0.5),
    ("buy", 0.5), ("calls", 0.4), ("optimistic", 0.7), ("rise", 0.5), ("rising", 0.5),
    ("increase", 0.4), ("success", 0.6), ("innovation", 0.5), ("advance", 0.4),
    ("dividend", 0.4), ("buyback", 0.5), ("upside", 0.6), ("recovery", 0.5),
    ("rebound", 0.5), ("robust", 0.6), ("accelerating", 0.5), ("tailwind", 0.5),
    // Mild
    ("good", 0.5), ("great", 0.8), ("love", 0.6), ("positive", 0.5), ("high", 0.2),
    ("hold", 0.1), ("undervalued", 0.5), ("impressive", 0.7), ("solid", 0.4),
];

const NEGATIVE_WORDS: &[(&str, f64)] = &[
    // Strong
    ("crash", 1.0), ("crashing", 1.0), ("plunge", 1.0), ("plunging", 1.0), ("collapse", 1.0),
    ("bankruptcy", 1.0), ("fraud", 1.0), ("scam", 1.0), ("bearish", 0.9), ("dump", 0.8),
    // Moderate
    ("decline", 0.6), ("loss", 0.6), ("losses", 0.6), ("fall", 0.5), ("falling", 0.5),
    ("miss", 0.6), ("missed", 0.6), ("downgrade", 0.7), ("downgraded", 0.7),
    ("underperform", 0.7), ("weak", 0.6), ("drop", 0.5), ("decrease", 0.4),
    ("concern", 0.4), ("risk", 0.3), ("fail", 0.7), ("disappoint", 0.7),
    ("disappointing", 0.7), ("slump", 0.7), ("sell", 0.5), ("puts", 0.4),
    ("warning", 0.5), ("pessimistic", 0.7), ("fear", 0.6), ("trouble", 0.6),
    ("dilution", 0.5), ("headwind", 0.5), ("lawsuit", 0.6), ("investigation", 0.5),
    ("layoff", 0.5), ("layoffs", 0.5), ("overvalued", 0.5), ("bubble", 0.6),
    // Mild
    ("bad", 0.6), ("terrible", 0.9), ("hate", 0.7), ("negative", 0.5), ("low", 0.2),
    ("below", 0.3), ("expensive", 0.3),
];

/// Raw lexical scores for a piece of text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LexicalScore {
    /// -1.0 to 1.0
    pub polarity: f64,
    /// 0.0 to 1.0
    pub subjectivity: f64,
}

/// Word-list sentiment estimator. Built once, read-only afterwards.
pub struct LexicalEstimator {
    weights: HashMap<&'static str, f64>,
    negations: HashSet<&'static str>,
}

impl LexicalEstimator {
    pub fn new() -> Self {
        let weights = POSITIVE_WORDS
            .iter()
            .map(|&(word, weight)| (word, weight))
            .chain(NEGATIVE_WORDS.iter().map(|&(word, weight)| (word, -weight)))
            .collect();

        Self {
            weights,
            negations: NEGATION_WORDS.iter().copied().collect(),
        }
    }

    /// Score text without building a full result
    pub fn score_text(&self, text: &str) -> LexicalScore {
        let text_lower = text.to_lowercase();
        let words: Vec<&str> = text_lower
            .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '.' | '!' | '?' | ':' | '(' | ')' | '"'))
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
            .filter(|w| !w.is_empty())
            .collect();

        if words.is_empty() {
            return LexicalScore { polarity: 0.0, subjectivity: 0.0 };
        }

        let negation_positions: Vec<usize> = words
            .iter()
            .enumerate()
            .filter(|(_, w)| self.negations.contains(*w))
            .map(|(i, _)| i)
            .collect();

        let mut total = 0.0;
        let mut hits = 0usize;

        for (i, word) in words.iter().enumerate() {
            let Some(&weight) = self.weights.get(word) else {
                continue;
            };

            let negated = negation_positions
                .iter()
                .any(|&neg_pos| neg_pos < i && (i - neg_pos) <= NEGATION_WINDOW);

            total += if negated { -weight } else { weight };
            hits += 1;
        }

        if hits == 0 {
            return LexicalScore { polarity: 0.0, subjectivity: 0.0 };
        }

        LexicalScore {
            polarity: (total / hits as f64).clamp(-1.0, 1.0),
            subjectivity: (hits as f64 / words.len() as f64).min(1.0),
        }
    }

    /// Full sentiment result for text
    pub fn analyze_text(&self, text: &str) -> SentimentResult {
        let score = self.score_text(text);
        let label = SentimentLabel::classify(score.polarity, POLARITY_THRESHOLD);

        SentimentResult {
            score: score.polarity,
            magnitude: score.polarity.abs(),
            label,
            confidence: LEXICAL_CONFIDENCE,
            topics: Vec::new(),
            emotion: Emotion::Neutral,
            summary: format!("Basic sentiment analysis: {}", label.as_str()),
        }
    }
}

impl Default for LexicalEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SentimentBackend for LexicalEstimator {
    async fn analyze(&self, text: &str) -> Result<SentimentResult, AnalysisError> {
        Ok(self.analyze_text(text))
    }

    fn name(&self) -> &'static str {
        "lexical"
    }
}
