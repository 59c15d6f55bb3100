pub mod config;
pub mod jaccard;
pub mod similarity;
pub mod tfidf;
pub mod tokenizer;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use config::TextConfig;
pub use jaccard::JaccardScorer;
pub use similarity::{cosine_similarity, stretch};
pub use tfidf::TfIdfScorer;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextSimilarityError {
    #[error("empty vocabulary; documents contain only stop words")]
    EmptyVocabulary,
    #[error("corpus has no text fragments")]
    EmptyCorpus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMethod {
    TfIdf,
    Jaccard,
}

impl SimilarityMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TfIdf => "tfidf",
            Self::Jaccard => "jaccard",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tfidf" | "tf-idf" | "tf_idf" => Some(Self::TfIdf),
            "jaccard" | "overlap" => Some(Self::Jaccard),
            _ => None,
        }
    }
}

/// Ordered text fragments of one side of a pair. Empty fragments are never
/// stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextCorpus {
    fragments: Vec<String>,
}

impl TextCorpus {
    pub fn from_fragments<I>(fragments: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        Self {
            fragments: fragments
                .into_iter()
                .flatten()
                .filter(|f| !f.trim().is_empty())
                .collect(),
        }
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn joined(&self) -> String {
        self.fragments.join(" ")
    }
}

/// Text similarity estimator interface.
///
/// Implementations:
/// - TfIdfScorer: TF-IDF + cosine
/// - JaccardScorer: word overlap, the fallback
pub trait TextScorer: Send + Sync {
    fn method(&self) -> SimilarityMethod;

    /// Raw similarity in [0, 1].
    fn score(&self, job: &TextCorpus, candidate: &TextCorpus) -> Result<f64, TextSimilarityError>;
}

pub fn create_scorer(method: SimilarityMethod) -> Box<dyn TextScorer> {
    match method {
        SimilarityMethod::TfIdf => Box::new(TfIdfScorer),
        SimilarityMethod::Jaccard => Box::new(JaccardScorer),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextSimilarity {
    pub raw: f64,
    pub normalized: f64,
    pub method: SimilarityMethod,
}

pub struct TextSimilarityEstimator {
    preferred: Box<dyn TextScorer>,
    fallback: JaccardScorer,
    config: TextConfig,
}

impl TextSimilarityEstimator {
    pub fn new(config: TextConfig) -> Self {
        Self {
            preferred: create_scorer(config.method),
            fallback: JaccardScorer,
            config,
        }
    }

    pub fn with_scorer(scorer: Box<dyn TextScorer>, config: TextConfig) -> Self {
        Self {
            preferred: scorer,
            fallback: JaccardScorer,
            config,
        }
    }

    /// Raw and stretched similarity between a job's and a candidate's text.
    /// Falls back to word overlap when the preferred scorer fails.
    pub fn similarity(&self, job: &TextCorpus, candidate: &TextCorpus) -> TextSimilarity {
        if job.is_empty() || candidate.is_empty() {
            return TextSimilarity {
                raw: 0.0,
                normalized: 0.0,
                method: self.preferred.method(),
            };
        }

        let (raw, method) = match self.preferred.score(job, candidate) {
            Ok(raw) => (raw, self.preferred.method()),
            Err(err) => {
                warn!(
                    error = %err,
                    scorer = self.preferred.method().as_str(),
                    "text similarity failed; falling back to word overlap"
                );
                (self.fallback.overlap(job, candidate), SimilarityMethod::Jaccard)
            }
        };

        TextSimilarity {
            raw,
            normalized: self.normalize(raw),
            method,
        }
    }

    pub fn normalize(&self, raw: f64) -> f64 {
        self.config.normalize(raw)
    }
}

impl Default for TextSimilarityEstimator {
    fn default() -> Self {
        Self::new(TextConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(parts: &[&str]) -> TextCorpus {
        TextCorpus::from_fragments(parts.iter().map(|p| Some(p.to_string())))
    }

    struct Failing;

    impl TextScorer for Failing {
        fn method(&self) -> SimilarityMethod {
            SimilarityMethod::TfIdf
        }

        fn score(&self, _: &TextCorpus, _: &TextCorpus) -> Result<f64, TextSimilarityError> {
            Err(TextSimilarityError::EmptyVocabulary)
        }
    }

    #[test]
    fn corpus_skips_empty_fragments() {
        let corpus = TextCorpus::from_fragments([
            Some("Rust".to_string()),
            None,
            Some("   ".to_string()),
            Some("Tokio".to_string()),
        ]);
        assert_eq!(corpus.fragments(), &["Rust".to_string(), "Tokio".to_string()]);
        assert_eq!(corpus.joined(), "Rust Tokio");
    }

    #[test]
    fn empty_corpus_yields_zero() {
        let estimator = TextSimilarityEstimator::default();
        let result = estimator.similarity(&TextCorpus::default(), &corpus(&["rust"]));
        assert_eq!(result.raw, 0.0);
        assert_eq!(result.normalized, 0.0);
    }

    #[test]
    fn failing_scorer_falls_back_to_overlap() {
        let estimator = TextSimilarityEstimator::with_scorer(Box::new(Failing), TextConfig::default());
        let text = corpus(&["rust tokio axum"]);
        let result = estimator.similarity(&text, &text);
        assert_eq!(result.method, SimilarityMethod::Jaccard);
        assert_eq!(result.raw, 1.0);
        assert!((result.normalized - 1.75).abs() < 1e-12);
    }

    #[test]
    fn stop_word_only_text_uses_fallback() {
        let estimator = TextSimilarityEstimator::default();
        let result = estimator.similarity(&corpus(&["the and of"]), &corpus(&["is it"]));
        assert_eq!(result.method, SimilarityMethod::Jaccard);
        assert_eq!(result.raw, 0.0);
    }

    #[test]
    fn jaccard_only_configuration_skips_tfidf() {
        let estimator = TextSimilarityEstimator::new(TextConfig {
            method: SimilarityMethod::Jaccard,
            clamp_stretch: true,
        });
        let text = corpus(&["rust tokio"]);
        let result = estimator.similarity(&text, &text);
        assert_eq!(result.method, SimilarityMethod::Jaccard);
        assert_eq!(result.normalized, 1.0);
    }

    #[test]
    fn parses_method_names() {
        assert_eq!(SimilarityMethod::parse("TF-IDF"), Some(SimilarityMethod::TfIdf));
        assert_eq!(SimilarityMethod::parse("jaccard"), Some(SimilarityMethod::Jaccard));
        assert_eq!(SimilarityMethod::parse("bm25"), None);
    }
}
