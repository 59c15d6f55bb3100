use std::collections::{BTreeMap, BTreeSet};

use super::{
    SimilarityMethod, TextCorpus, TextScorer, TextSimilarityError,
    similarity::{SparseVector, sparse_cosine},
    tokenizer::tfidf_tokens,
};

/// TF-IDF vectors fitted on the documents being compared.
///
/// Raw term counts, smoothed idf `ln((1 + n) / (1 + df)) + 1`, L2-normalised.
pub fn tfidf_vectors(documents: &[String]) -> Result<Vec<SparseVector>, TextSimilarityError> {
    let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tfidf_tokens(d)).collect();

    let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
    for tokens in &tokenized {
        let unique: BTreeSet<&str> = tokens.iter().map(String::as_str).collect();
        for token in unique {
            *document_frequency.entry(token).or_default() += 1;
        }
    }

    if document_frequency.is_empty() {
        return Err(TextSimilarityError::EmptyVocabulary);
    }

    let n = documents.len() as f64;
    let idf: BTreeMap<&str, f64> = document_frequency
        .iter()
        .map(|(term, df)| (*term, ((1.0 + n) / (1.0 + *df as f64)).ln() + 1.0))
        .collect();

    let vectors = tokenized
        .iter()
        .map(|tokens| {
            let mut counts: SparseVector = BTreeMap::new();
            for token in tokens {
                *counts.entry(token.clone()).or_default() += 1.0;
            }
            for (term, weight) in counts.iter_mut() {
                *weight *= idf.get(term.as_str()).copied().unwrap_or(1.0);
            }
            let norm = counts.values().map(|w| w * w).sum::<f64>().sqrt();
            if norm > 0.0 {
                for weight in counts.values_mut() {
                    *weight /= norm;
                }
            }
            counts
        })
        .collect();

    Ok(vectors)
}

/// Vector-space estimator: cosine between the TF-IDF vectors of the two
/// joined corpora.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfIdfScorer;

impl TextScorer for TfIdfScorer {
    fn method(&self) -> SimilarityMethod {
        SimilarityMethod::TfIdf
    }

    fn score(&self, job: &TextCorpus, candidate: &TextCorpus) -> Result<f64, TextSimilarityError> {
        if job.is_empty() || candidate.is_empty() {
            return Err(TextSimilarityError::EmptyCorpus);
        }

        let vectors = tfidf_vectors(&[job.joined(), candidate.joined()])?;
        Ok(sparse_cosine(&vectors[0], &vectors[1]).clamp(0.0, 1.0))
    }
}
