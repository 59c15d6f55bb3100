use serde::{Deserialize, Serialize};

use super::proficiency::{Proficiency, proficiency_to_numeric};

/// One skill relationship between a candidate and a job, as produced by the
/// graph store for a single pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillFact {
    #[serde(default)]
    pub skill_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_importance")]
    pub importance: f64,
    #[serde(default)]
    pub required_proficiency: Option<Proficiency>,
    #[serde(default)]
    pub held_proficiency: Option<Proficiency>,
    #[serde(default = "default_is_core")]
    pub is_core: bool,
    #[serde(default)]
    pub experience_years: Option<f64>,
}

fn default_importance() -> f64 {
    1.0
}

fn default_is_core() -> bool {
    true
}

impl Default for SkillFact {
    fn default() -> Self {
        Self {
            skill_id: None,
            name: String::new(),
            category: None,
            importance: default_importance(),
            required_proficiency: None,
            held_proficiency: None,
            is_core: default_is_core(),
            experience_years: None,
        }
    }
}

impl SkillFact {
    pub fn new(skill_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            skill_id: Some(skill_id.into()),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn required_numeric(&self) -> f64 {
        proficiency_to_numeric(self.required_proficiency.as_ref())
    }

    pub fn held_numeric(&self) -> f64 {
        proficiency_to_numeric(self.held_proficiency.as_ref())
    }
}

/// Matching / missing / exceeding facts for one candidate-job pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillFacts {
    #[serde(default)]
    pub matching: Vec<SkillFact>,
    #[serde(default)]
    pub missing: Vec<SkillFact>,
    #[serde(default)]
    pub exceeding: Vec<SkillFact>,
    /// Secondary requirements the candidate holds. Display only.
    #[serde(default)]
    pub secondary_matching: Vec<SkillFact>,
}

impl SkillFacts {
    /// matching + missing, i.e. everything the job asked for.
    pub fn required(&self) -> Vec<SkillFact> {
        self.matching
            .iter()
            .chain(self.missing.iter())
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageBreakdown {
    pub matched_importance: f64,
    pub total_importance: f64,
    pub skill_count_factor: f64,
    /// 0〜100
    pub score: f64,
}

const MIN_REQUIRED_PROFICIENCY: f64 = 0.1;
const SECONDARY_WEIGHT: f64 = 0.5;

/// Importance- and proficiency-weighted coverage of `required` by `matching`.
///
/// Over-qualified skills are capped at full credit, secondary skills count
/// half, and the result is scaled by the share of required skills that are
/// matched at all.
pub fn evaluate_coverage(matching: &[SkillFact], required: &[SkillFact]) -> CoverageBreakdown {
    let total_importance: f64 = required.iter().map(|f| f.importance).sum();
    if total_importance == 0.0 || !total_importance.is_finite() {
        return CoverageBreakdown {
            matched_importance: 0.0,
            total_importance: 0.0,
            skill_count_factor: 0.0,
            score: 0.0,
        };
    }

    let matched_importance: f64 = matching
        .iter()
        .map(|fact| {
            let adjustment =
                (fact.held_numeric() / fact.required_numeric().max(MIN_REQUIRED_PROFICIENCY)).min(1.0);
            let core_weight = if fact.is_core { 1.0 } else { SECONDARY_WEIGHT };
            fact.importance * adjustment * core_weight
        })
        .sum();

    let skill_count_factor = matching.len() as f64 / required.len().max(1) as f64;
    let score = (matched_importance / total_importance) * skill_count_factor * 100.0;

    CoverageBreakdown {
        matched_importance,
        total_importance,
        skill_count_factor,
        score: if score.is_finite() { score.clamp(0.0, 100.0) } else { 0.0 },
    }
}

pub fn coverage_score(matching: &[SkillFact], required: &[SkillFact]) -> f64 {
    evaluate_coverage(matching, required).score
}
