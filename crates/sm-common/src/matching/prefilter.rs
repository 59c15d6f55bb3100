use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::weights::EnhancedWeights;
use crate::graph::CoarseMatch;

const SECONDARY_FACTOR: f64 = 0.5;
const RELATED_FACTOR: f64 = 0.25;
const SKILL_SCORE_SCALE: f64 = 3.0;

/// Additive skill-overlap score used to pick the coarse candidate set.
///
/// Primary requirements count in full and secondary ones at half weight.
/// A primary requirement the candidate lacks counts at a quarter when a
/// related core skill stands in for it. Each term is
/// `importance * held proficiency`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoarseScore {
    pub primary_count: usize,
    pub secondary_count: usize,
    pub related_count: usize,
    pub primary_score: f64,
    pub secondary_score: f64,
    pub related_score: f64,
}

impl CoarseScore {
    pub fn add_primary(&mut self, importance: f64, held: f64) {
        self.primary_count += 1;
        self.primary_score += importance * held;
    }

    pub fn add_secondary(&mut self, importance: f64, held: f64) {
        self.secondary_count += 1;
        self.secondary_score += importance * SECONDARY_FACTOR * held;
    }

    pub fn add_related(&mut self, importance: f64, held: f64) {
        self.related_count += 1;
        self.related_score += importance * RELATED_FACTOR * held;
    }

    pub fn total(&self) -> f64 {
        self.primary_score + self.secondary_score + self.related_score
    }

    /// Skill component of the enhanced blend, roughly on a 0〜100 scale.
    pub fn skill_score(&self) -> f64 {
        (self.primary_score + self.secondary_score) * SKILL_SCORE_SCALE
    }

    /// Pairs without a single primary overlap never enter the coarse set.
    pub fn passes(&self) -> bool {
        self.primary_count > 0
    }
}

/// Sorts by score descending (ties by id so snapshots rank reproducibly)
/// and keeps the first `limit`.
pub fn rank_coarse(mut matches: Vec<CoarseMatch>, limit: usize) -> Vec<CoarseMatch> {
    matches.sort_by(|a, b| {
        b.raw_score
            .partial_cmp(&a.raw_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.counterpart_id.cmp(&b.counterpart_id))
    });
    matches.truncate(limit);
    matches
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnhancedScore {
    pub skill_score: f64,
    pub location_score: f64,
    pub semantic_score: f64,
    pub total_score: f64,
    /// round(min(total, 100))
    pub match_percentage: u32,
}

/// Weighted skills / location / semantic blend of the enhanced queries.
pub fn enhanced_score(
    skill_score: f64,
    location_score: f64,
    semantic_score: f64,
    weights: &EnhancedWeights,
) -> EnhancedScore {
    let total_score = skill_score * weights.skills
        + location_score * weights.location
        + semantic_score * weights.semantic;

    let match_percentage = if total_score.is_nan() {
        0
    } else {
        total_score.clamp(0.0, 100.0).round() as u32
    };

    EnhancedScore {
        skill_score,
        location_score,
        semantic_score,
        total_score,
        match_percentage,
    }
}
