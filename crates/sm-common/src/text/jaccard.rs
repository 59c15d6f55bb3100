use super::{
    SimilarityMethod, TextCorpus, TextScorer, TextSimilarityError, similarity::jaccard,
    tokenizer::overlap_tokens,
};

/// Word-overlap estimator used when the vector-space path is unavailable
/// or fails. Never returns an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct JaccardScorer;

impl JaccardScorer {
    pub fn overlap(&self, job: &TextCorpus, candidate: &TextCorpus) -> f64 {
        let job_words = overlap_tokens(&job.joined());
        let candidate_words = overlap_tokens(&candidate.joined());
        jaccard(&job_words, &candidate_words)
    }
}

impl TextScorer for JaccardScorer {
    fn method(&self) -> SimilarityMethod {
        SimilarityMethod::Jaccard
    }

    fn score(&self, job: &TextCorpus, candidate: &TextCorpus) -> Result<f64, TextSimilarityError> {
        Ok(self.overlap(job, candidate))
    }
}
