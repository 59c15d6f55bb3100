use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    graph::{CoarseMatch, MatchSubject, SubjectKind},
    matching::{
        pipeline::PairScore,
        proficiency::Proficiency,
        scoring::round1,
        skills::{SkillFact, SkillFacts},
    },
    text::SimilarityMethod,
};

/// Skill row as shown to clients. Always carries an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillEntry {
    pub skill_id: String,
    pub name: String,
    pub category: Option<String>,
    pub importance: f64,
    pub required_proficiency: Option<Proficiency>,
    pub held_proficiency: Option<Proficiency>,
    pub is_core: bool,
    pub experience_years: Option<f64>,
}

impl SkillEntry {
    /// `None` for facts without a skill id.
    pub fn from_fact(fact: &SkillFact) -> Option<Self> {
        let skill_id = fact.skill_id.clone()?;
        Some(Self {
            skill_id,
            name: fact.name.clone(),
            category: fact.category.clone(),
            importance: fact.importance,
            required_proficiency: fact.required_proficiency.clone(),
            held_proficiency: fact.held_proficiency.clone(),
            is_core: fact.is_core,
            experience_years: fact.experience_years,
        })
    }

    pub fn from_facts(facts: &[SkillFact]) -> Vec<Self> {
        facts.iter().filter_map(Self::from_fact).collect()
    }
}

/// One ranked counterpart, ready to serialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub subject_id: String,
    pub subject_kind: SubjectKind,
    pub counterpart_id: String,
    /// Additive score from the coarse ranking.
    pub coarse_score: f64,
    /// 0.0〜1.0, unrounded so ties stay exact.
    pub hybrid_score: f64,
    /// 0〜100
    pub match_percentage: u8,
    pub graph_score: f64,
    pub graph_percentage: f64,
    pub text_score: f64,
    pub text_percentage: f64,
    pub text_method: SimilarityMethod,
    pub location_score: Option<f64>,
    pub matching_skills: Vec<SkillEntry>,
    pub secondary_matching_skills: Vec<SkillEntry>,
    pub missing_skills: Vec<SkillEntry>,
    pub exceeding_skills: Vec<SkillEntry>,
}

impl MatchResult {
    pub fn assemble(
        subject: &MatchSubject,
        coarse: &CoarseMatch,
        score: &PairScore,
        facts: &SkillFacts,
    ) -> Self {
        let matching_skills = SkillEntry::from_facts(&facts.matching);
        let secondary_matching_skills =
            dedup_against(SkillEntry::from_facts(&facts.secondary_matching), &matching_skills);

        Self {
            subject_id: subject.id().to_string(),
            subject_kind: subject.kind(),
            counterpart_id: coarse.counterpart_id.clone(),
            coarse_score: round1(coarse.raw_score),
            hybrid_score: score.hybrid_score,
            match_percentage: score.match_percentage,
            graph_score: score.components.graph_score,
            graph_percentage: score.graph_percentage,
            text_score: score.text.raw,
            text_percentage: score.text_percentage,
            text_method: score.text.method,
            location_score: score.location_score.map(round1),
            matching_skills,
            secondary_matching_skills,
            missing_skills: SkillEntry::from_facts(&facts.missing),
            exceeding_skills: SkillEntry::from_facts(&facts.exceeding),
        }
    }
}

/// Drops entries whose id already appears in `primary`, and repeated ids.
fn dedup_against(entries: Vec<SkillEntry>, primary: &[SkillEntry]) -> Vec<SkillEntry> {
    let mut seen: HashSet<String> = primary.iter().map(|e| e.skill_id.clone()).collect();
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.skill_id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        matching::{proficiency::ProficiencyLevel, scoring::HybridComponents},
        text::TextSimilarity,
    };

    fn pair_score() -> PairScore {
        PairScore {
            hybrid_score: 0.42,
            match_percentage: 59,
            percentage: 58.8,
            components: HybridComponents {
                graph_score: 0.4567,
                raw_text: 0.3,
                normalized_proficiency: 1.0,
                skill_balance: 0.2,
                exceeding_bonus: 0.0,
                coverage_boost: 0.5,
            },
            graph_percentage: 68.5,
            text: TextSimilarity {
                raw: 0.3,
                normalized: 0.725,
                method: SimilarityMethod::TfIdf,
            },
            text_percentage: 72.5,
            location_score: Some(80.0),
        }
    }

    fn unnamed(name: &str) -> SkillFact {
        SkillFact {
            skill_id: None,
            name: name.into(),
            ..SkillFact::default()
        }
    }

    #[test]
    fn assemble_drops_null_ids_and_duplicate_secondaries() {
        let facts = SkillFacts {
            matching: vec![
                SkillFact {
                    held_proficiency: Some(ProficiencyLevel::Expert.into()),
                    ..SkillFact::new("rust", "Rust")
                },
                unnamed("ghost"),
            ],
            missing: vec![SkillFact::new("k8s", "Kubernetes"), unnamed("ghost")],
            exceeding: vec![],
            secondary_matching: vec![
                SkillFact::new("rust", "Rust"),
                SkillFact::new("sql", "SQL"),
                SkillFact::new("sql", "SQL"),
            ],
        };
        let subject = MatchSubject::Job("j1".into());
        let coarse = CoarseMatch {
            counterpart_id: "c1".into(),
            raw_score: 1.23456,
        };

        let result = MatchResult::assemble(&subject, &coarse, &pair_score(), &facts);

        assert_eq!(result.subject_kind, SubjectKind::Job);
        assert_eq!(result.counterpart_id, "c1");
        assert_eq!(result.coarse_score, 1.2);
        assert_eq!(result.graph_score, 0.4567);
        assert_eq!(result.matching_skills.len(), 1);
        assert_eq!(result.missing_skills.len(), 1);
        assert!(result.exceeding_skills.is_empty());
        let secondary: Vec<_> = result
            .secondary_matching_skills
            .iter()
            .map(|e| e.skill_id.as_str())
            .collect();
        assert_eq!(secondary, vec!["sql"]);
    }

    #[test]
    fn serializes_all_skill_lists_and_integer_percentage() {
        let result = MatchResult::assemble(
            &MatchSubject::Candidate("c1".into()),
            &CoarseMatch {
                counterpart_id: "j1".into(),
                raw_score: 0.5,
            },
            &pair_score(),
            &SkillFacts::default(),
        );

        let json = serde_json::to_value(&result).expect("serializes");
        assert_eq!(json["match_percentage"], serde_json::json!(59));
        assert_eq!(json["text_method"], "tfidf");
        assert_eq!(json["subject_kind"], "candidate");
        for key in [
            "matching_skills",
            "secondary_matching_skills",
            "missing_skills",
            "exceeding_skills",
        ] {
            assert_eq!(json[key], serde_json::json!([]), "{key}");
        }
    }
}
