use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::skills::SkillFact;

pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 5;

/// A missing job skill worth learning, scored by how much it matters to the
/// job and how close it sits to what the candidate already knows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRecommendation {
    pub skill_id: String,
    pub name: String,
    pub category: Option<String>,
    pub job_importance: f64,
    pub relevance_to_existing_skills: usize,
    pub learning_value: f64,
}

/// `importance * (1 + relevance / 3)`, with whole-number division: every
/// three related core skills add one more unit of importance.
pub fn learning_value(importance: f64, relevance: usize) -> f64 {
    importance * (1 + relevance / 3) as f64
}

/// Ranks missing skills by learning value. Facts without an id are skipped;
/// equal values keep their input order.
pub fn rank_recommendations(
    missing: Vec<(SkillFact, usize)>,
    limit: usize,
) -> Vec<SkillRecommendation> {
    let mut ranked: Vec<SkillRecommendation> = missing
        .into_iter()
        .filter_map(|(fact, relevance)| {
            let skill_id = fact.skill_id?;
            Some(SkillRecommendation {
                skill_id,
                name: fact.name,
                category: fact.category,
                job_importance: fact.importance,
                relevance_to_existing_skills: relevance,
                learning_value: learning_value(fact.importance, relevance),
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.learning_value
            .partial_cmp(&a.learning_value)
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing(id: &str, importance: f64) -> SkillFact {
        SkillFact {
            importance,
            ..SkillFact::new(id, id.to_uppercase())
        }
    }

    #[test]
    fn learning_value_steps_every_three_related_skills() {
        assert_eq!(learning_value(0.6, 0), 0.6);
        assert_eq!(learning_value(0.6, 2), 0.6);
        assert_eq!(learning_value(0.6, 3), 1.2);
        assert!((learning_value(0.6, 7) - 1.8).abs() < 1e-12);
    }

    #[test]
    fn related_skills_lift_less_important_gaps() {
        let ranked = rank_recommendations(
            vec![
                (missing("k8s", 0.8), 0),
                (missing("tokio", 0.5), 3),
                (missing("sql", 0.3), 1),
            ],
            DEFAULT_RECOMMENDATION_LIMIT,
        );
        let ids: Vec<_> = ranked.iter().map(|r| r.skill_id.as_str()).collect();
        assert_eq!(ids, vec!["tokio", "k8s", "sql"]);
        assert_eq!(ranked[0].learning_value, 1.0);
        assert_eq!(ranked[0].relevance_to_existing_skills, 3);
    }

    #[test]
    fn skips_unnamed_facts_and_respects_limit() {
        let unnamed = SkillFact {
            skill_id: None,
            ..missing("x", 1.0)
        };
        let ranked = rank_recommendations(
            vec![(unnamed, 9), (missing("a", 0.2), 0), (missing("b", 0.4), 0)],
            1,
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].skill_id, "b");
    }
}
