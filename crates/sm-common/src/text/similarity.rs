use std::collections::{BTreeMap, HashSet};

pub type SparseVector = BTreeMap<String, f64>;

/// Cosine similarity of two dense embeddings mapped onto [0, 1] as
/// `(cos + 1) / 2`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        tracing::warn!(
            a_len = a.len(),
            b_len = b.len(),
            "embedding dimension mismatch; returning zero similarity"
        );
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    ((dot / (norm_a * norm_b)) + 1.0) / 2.0
}

/// Plain cosine of two sparse term vectors. 0.0 when either is all zeros.
pub fn sparse_cosine(a: &SparseVector, b: &SparseVector) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(term, x)| b.get(term).map(|y| x * y))
        .sum();
    let norm_a = a.values().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.values().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// |A ∩ B| / |A ∪ B|; 0.0 when either set is empty.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let overlap = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        overlap as f64 / union as f64
    }
}

/// Tiered stretch for raw text similarity. Typical cosine values cluster
/// low, so 0〜0.2 maps to 0〜0.6, 0.2〜0.4 to 0.6〜0.85 and anything above
/// 0.4 keeps climbing from 0.85. The output is not clamped.
pub fn stretch(raw: f64) -> f64 {
    let raw = if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) };

    if raw > 0.4 {
        0.85 + (raw - 0.4) * 1.5
    } else if raw > 0.2 {
        0.6 + (raw - 0.2) * 1.25
    } else {
        raw * 3.0
    }
}
