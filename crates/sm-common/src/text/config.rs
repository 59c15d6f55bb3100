use super::SimilarityMethod;

#[derive(Debug, Clone, PartialEq)]
pub struct TextConfig {
    /// Preferred estimator. Word overlap is always the fallback.
    pub method: SimilarityMethod,
    /// Clamp the stretched similarity to [0, 1]. Off by default so scores
    /// stay comparable with previously published results.
    pub clamp_stretch: bool,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            method: SimilarityMethod::TfIdf,
            clamp_stretch: false,
        }
    }
}

impl TextConfig {
    pub fn normalize(&self, raw: f64) -> f64 {
        let stretched = super::similarity::stretch(raw);
        if self.clamp_stretch {
            stretched.clamp(0.0, 1.0)
        } else {
            stretched
        }
    }
}
