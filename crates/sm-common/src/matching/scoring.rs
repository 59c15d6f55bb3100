use serde::{Deserialize, Serialize};

use super::{
    skills::SkillFact,
    weights::{HYBRID_WEIGHTS, HybridWeights},
};

const PROFICIENCY_GAP_PENALTY: f64 = 0.25;
const SKILL_BALANCE_CEILING: f64 = 0.2;
const EXCEEDING_STEP: f64 = 0.1;
const EXCEEDING_CAP: f64 = 0.5;

/// Sub-scores feeding the hybrid blend. Each one is roughly in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HybridComponents {
    pub graph_score: f64,
    pub raw_text: f64,
    pub normalized_proficiency: f64,
    pub skill_balance: f64,
    pub exceeding_bonus: f64,
    pub coverage_boost: f64,
}

impl HybridComponents {
    pub fn compute(
        coverage100: f64,
        raw_text: f64,
        matching: &[SkillFact],
        missing: &[SkillFact],
        exceeding: &[SkillFact],
    ) -> Self {
        Self {
            graph_score: coverage100 / 100.0,
            raw_text,
            normalized_proficiency: normalized_proficiency(matching),
            skill_balance: skill_balance_factor(matching),
            exceeding_bonus: (exceeding.len() as f64 * EXCEEDING_STEP).min(EXCEEDING_CAP),
            coverage_boost: matching.len() as f64 / (matching.len() + missing.len()).max(1) as f64,
        }
    }

    pub fn weighted_total(&self, weights: &HybridWeights) -> f64 {
        self.graph_score * weights.graph
            + self.raw_text * weights.text
            + self.normalized_proficiency * weights.proficiency
            + self.skill_balance * weights.skill_balance
            + self.exceeding_bonus * weights.exceeding
            + self.coverage_boost * weights.coverage
    }
}

/// Blends coverage, proficiency adequacy, balance, bonus and text into one
/// [0, 1] ranking value.
pub fn combine(
    coverage100: f64,
    raw_text: f64,
    matching: &[SkillFact],
    missing: &[SkillFact],
    exceeding: &[SkillFact],
) -> f64 {
    HybridComponents::compute(coverage100, raw_text, matching, missing, exceeding)
        .weighted_total(&HYBRID_WEIGHTS)
}

/// Importance-weighted proficiency adequacy of the matched skills.
/// Each proficiency step below the requirement costs a quarter of that
/// skill's importance.
pub fn normalized_proficiency(matching: &[SkillFact]) -> f64 {
    let mut total_importance = 0.0;
    let mut accumulated = 0.0;

    for fact in matching {
        let required = fact.required_numeric();
        let held = fact.held_numeric();
        total_importance += fact.importance;

        if held >= required {
            accumulated += fact.importance;
        } else {
            let gap = required - held;
            accumulated += fact.importance * (1.0 - gap * PROFICIENCY_GAP_PENALTY);
        }
    }

    accumulated / f64::max(total_importance, 1.0)
}

pub fn skill_balance_factor(matching: &[SkillFact]) -> f64 {
    if matching.is_empty() {
        return 0.0;
    }
    let core = matching.iter().filter(|f| f.is_core).count();
    SKILL_BALANCE_CEILING * (core as f64 / matching.len() as f64)
}

/// Maps a hybrid score onto the 0〜100 display scale, one decimal.
///
/// The upper half is stretched before the tier map so that differences
/// between strong matches stay visible; weak matches are compressed.
pub fn score_to_percentage(score: f64) -> f64 {
    let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };

    let t = if score > 0.5 {
        0.5 + (score - 0.5).powf(0.7)
    } else {
        score
    };

    let percentage = if t > 0.8 {
        85.0 + (t - 0.8) * 150.0
    } else if t > 0.6 {
        70.0 + (t - 0.6) * 75.0
    } else if t > 0.4 {
        60.0 + (t - 0.4) * 50.0
    } else {
        t * 150.0
    };

    round1(percentage.min(100.0))
}

/// Integer percentage shown to users. Derived from the one-decimal value,
/// halves go to the even neighbour.
pub fn display_percentage(score: f64) -> u8 {
    score_to_percentage(score).round_ties_even() as u8
}

/// One decimal, halves to the even neighbour.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::{
        proficiency::{Proficiency, ProficiencyLevel},
        skills::coverage_score,
    };

    fn matched(importance: f64, required: ProficiencyLevel, held: ProficiencyLevel, is_core: bool) -> SkillFact {
        SkillFact {
            importance,
            required_proficiency: Some(Proficiency::Level(required)),
            held_proficiency: Some(Proficiency::Level(held)),
            is_core,
            ..SkillFact::new("s", "S")
        }
    }

    #[test]
    fn percentage_endpoints() {
        assert_eq!(score_to_percentage(0.0), 0.0);
        assert_eq!(display_percentage(0.0), 0);
        assert_eq!(score_to_percentage(1.0), 100.0);
        assert_eq!(display_percentage(1.0), 100);
    }

    #[test]
    fn percentage_clamps_out_of_range_input() {
        assert_eq!(score_to_percentage(-0.5), 0.0);
        assert_eq!(score_to_percentage(3.0), 100.0);
        assert_eq!(score_to_percentage(f64::NAN), 0.0);
    }

    #[test]
    fn percentage_is_non_decreasing() {
        let mut previous = -1.0;
        for i in 0..=1000 {
            let value = score_to_percentage(i as f64 / 1000.0);
            assert!(value >= previous, "dropped at {i}: {value} < {previous}");
            previous = value;
        }
    }

    #[test]
    fn one_decimal_rounding_sends_halves_to_even() {
        assert_eq!(round1(62.25), 62.2);
        assert_eq!(round1(62.75), 62.8);
        assert_eq!(round1(58.84), 58.8);
        assert_eq!(round1(-0.25), -0.2);
    }

    #[test]
    fn percentage_tiers() {
        assert_eq!(score_to_percentage(0.2), 30.0);
        assert_eq!(score_to_percentage(0.4), 60.0);
        assert_eq!(score_to_percentage(0.5), 65.0);
    }

    #[test]
    fn proficiency_gap_costs_a_quarter_per_step() {
        let facts = vec![matched(1.0, ProficiencyLevel::Expert, ProficiencyLevel::Intermediate, true)];
        // gap 0.5 -> 1 - 0.125
        assert!((normalized_proficiency(&facts) - 0.875).abs() < 1e-12);
    }

    #[test]
    fn proficiency_divides_by_at_least_one() {
        let facts = vec![matched(0.4, ProficiencyLevel::Advanced, ProficiencyLevel::Expert, true)];
        assert!((normalized_proficiency(&facts) - 0.4).abs() < 1e-12);
        assert_eq!(normalized_proficiency(&[]), 0.0);
    }

    #[test]
    fn skill_balance_rewards_core_matches() {
        let core = matched(1.0, ProficiencyLevel::Advanced, ProficiencyLevel::Advanced, true);
        let secondary = matched(1.0, ProficiencyLevel::Advanced, ProficiencyLevel::Advanced, false);
        assert_eq!(skill_balance_factor(&[]), 0.0);
        assert!((skill_balance_factor(&[core.clone()]) - 0.2).abs() < 1e-12);
        assert!((skill_balance_factor(&[core, secondary]) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn exceeding_bonus_is_capped() {
        let extra: Vec<SkillFact> = (0..9).map(|i| SkillFact::new(format!("x{i}"), "x")).collect();
        let components = HybridComponents::compute(0.0, 0.0, &[], &[], &extra);
        assert!((components.exceeding_bonus - 0.5).abs() < 1e-12);
    }

    #[test]
    fn reference_pair_lands_mid_range_and_is_deterministic() {
        let matching = vec![matched(0.9, ProficiencyLevel::Advanced, ProficiencyLevel::Advanced, true)];
        let missing = vec![SkillFact {
            importance: 0.5,
            ..SkillFact::new("m", "M")
        }];
        let required: Vec<SkillFact> = matching.iter().chain(missing.iter()).cloned().collect();

        let coverage = coverage_score(&matching, &required);
        let hybrid = combine(coverage, 0.3, &matching, &missing, &[]);

        assert!(hybrid > 0.3 && hybrid < 0.7, "hybrid={hybrid}");
        assert!((hybrid - 0.449_285_714).abs() < 1e-6);

        let first = display_percentage(hybrid);
        for _ in 0..10 {
            let again = combine(coverage, 0.3, &matching, &missing, &[]);
            assert_eq!(display_percentage(again), first);
        }
        assert_eq!(first, 62);
    }

    #[test]
    fn no_skills_and_no_text_scores_zero() {
        assert_eq!(combine(0.0, 0.0, &[], &[], &[]), 0.0);
    }
}
