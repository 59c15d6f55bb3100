use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CoarseMatch, GraphError, GraphStore, RelationKind, SkillPath, SubjectKind};
use crate::{
    matching::{
        location::location_score,
        prefilter::{CoarseScore, EnhancedScore, enhanced_score, rank_coarse},
        proficiency::{Proficiency, proficiency_to_numeric},
        skills::{SkillFact, SkillFacts},
        weights::ENHANCED_WEIGHTS,
    },
    text::{TextCorpus, cosine_similarity},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub skills: Vec<SkillNode>,
    #[serde(default)]
    pub candidates: Vec<CandidateNode>,
    #[serde(default)]
    pub jobs: Vec<JobNode>,
    #[serde(default)]
    pub relations: Vec<SkillRelation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillNode {
    pub skill_id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateNode {
    pub resume_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    /// One embedding per experience entry.
    #[serde(default)]
    pub experience_embeddings: Vec<Vec<f32>>,
    #[serde(default)]
    pub skills: Vec<HeldSkill>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeldSkill {
    pub skill_id: String,
    #[serde(default)]
    pub proficiency: Option<Proficiency>,
    #[serde(default = "default_true")]
    pub is_core: bool,
    #[serde(default)]
    pub experience_years: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobNode {
    pub job_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub responsibilities: Option<String>,
    #[serde(default)]
    pub qualifications: Option<String>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub requirements: Vec<SkillRequirement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillRequirement {
    pub skill_id: String,
    #[serde(default)]
    pub proficiency: Option<Proficiency>,
    #[serde(default = "default_importance")]
    pub importance: f64,
    #[serde(default = "default_true")]
    pub is_primary: bool,
}

/// Directed skill-to-skill edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillRelation {
    pub from: String,
    pub to: String,
    pub kind: RelationKind,
}

fn default_true() -> bool {
    true
}

fn default_importance() -> f64 {
    1.0
}

/// Result row of the enhanced (skills + location + semantic) query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedMatch {
    pub counterpart_id: String,
    pub name: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
    #[serde(flatten)]
    pub score: EnhancedScore,
    pub primary_matching_skills: Vec<SkillFact>,
    pub secondary_matching_skills: Vec<SkillFact>,
}

/// Read-only skill graph held in memory, loaded from a JSON snapshot.
#[derive(Debug, Default)]
pub struct InMemoryGraph {
    skills: HashMap<String, SkillNode>,
    candidates: BTreeMap<String, CandidateNode>,
    jobs: BTreeMap<String, JobNode>,
    /// Undirected RELATED_TO adjacency used by the coarse score.
    related: HashMap<String, BTreeSet<String>>,
    /// Directed edges keyed by source skill. The first kind listed for a
    /// pair wins.
    outgoing: HashMap<String, BTreeMap<String, RelationKind>>,
}

impl InMemoryGraph {
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self, GraphError> {
        let mut graph = Self::default();

        for skill in snapshot.skills {
            if graph.skills.contains_key(&skill.skill_id) {
                return Err(GraphError::Malformed(format!(
                    "duplicate skill {}",
                    skill.skill_id
                )));
            }
            graph.skills.insert(skill.skill_id.clone(), skill);
        }

        for candidate in snapshot.candidates {
            if graph.candidates.contains_key(&candidate.resume_id) {
                return Err(GraphError::Malformed(format!(
                    "duplicate candidate {}",
                    candidate.resume_id
                )));
            }
            graph.candidates.insert(candidate.resume_id.clone(), candidate);
        }

        for job in snapshot.jobs {
            if graph.jobs.contains_key(&job.job_id) {
                return Err(GraphError::Malformed(format!("duplicate job {}", job.job_id)));
            }
            graph.jobs.insert(job.job_id.clone(), job);
        }

        for relation in snapshot.relations {
            if relation.kind == RelationKind::RelatedTo {
                graph
                    .related
                    .entry(relation.from.clone())
                    .or_default()
                    .insert(relation.to.clone());
                graph
                    .related
                    .entry(relation.to.clone())
                    .or_default()
                    .insert(relation.from.clone());
            }
            graph
                .outgoing
                .entry(relation.from)
                .or_default()
                .entry(relation.to)
                .or_insert(relation.kind);
        }

        debug!(
            skills = graph.skills.len(),
            candidates = graph.candidates.len(),
            jobs = graph.jobs.len(),
            "loaded in-memory skill graph"
        );
        Ok(graph)
    }

    pub fn from_json_str(json: &str) -> Result<Self, GraphError> {
        let snapshot: GraphSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot)
    }

    pub fn candidate(&self, candidate_id: &str) -> Result<&CandidateNode, GraphError> {
        self.candidates
            .get(candidate_id)
            .ok_or_else(|| GraphError::NotFound {
                kind: SubjectKind::Candidate,
                id: candidate_id.to_string(),
            })
    }

    pub fn job(&self, job_id: &str) -> Result<&JobNode, GraphError> {
        self.jobs.get(job_id).ok_or_else(|| GraphError::NotFound {
            kind: SubjectKind::Job,
            id: job_id.to_string(),
        })
    }

    /// Skills, locations and embeddings blended into one 0〜100 score for
    /// every candidate, best first. Candidates without skill overlap are
    /// still ranked on location and semantics.
    pub fn enhanced_candidates_for_job(
        &self,
        job_id: &str,
        limit: usize,
    ) -> Result<Vec<EnhancedMatch>, GraphError> {
        let job = self.job(job_id)?;
        let matches = self
            .candidates
            .values()
            .map(|candidate| {
                let mut row = self.enhanced_row(candidate, job);
                row.counterpart_id = candidate.resume_id.clone();
                row.name = candidate.name.clone();
                row.title = candidate.title.clone();
                row.location = candidate.location.clone();
                row
            })
            .collect();
        Ok(sort_enhanced(matches, limit))
    }

    pub fn enhanced_jobs_for_candidate(
        &self,
        candidate_id: &str,
        limit: usize,
    ) -> Result<Vec<EnhancedMatch>, GraphError> {
        let candidate = self.candidate(candidate_id)?;
        let matches = self
            .jobs
            .values()
            .map(|job| {
                let mut row = self.enhanced_row(candidate, job);
                row.counterpart_id = job.job_id.clone();
                row.title = job.title.clone();
                row.location = job.location.clone();
                row
            })
            .collect();
        Ok(sort_enhanced(matches, limit))
    }

    fn enhanced_row(&self, candidate: &CandidateNode, job: &JobNode) -> EnhancedMatch {
        // Enhanced skill score ignores related skills.
        let mut coarse = CoarseScore::default();
        let mut primary_matching_skills = Vec::new();
        let mut secondary_matching_skills = Vec::new();

        for requirement in &job.requirements {
            let Some(held) = held_skill(candidate, &requirement.skill_id) else {
                continue;
            };
            let held_numeric = proficiency_to_numeric(held.proficiency.as_ref());
            if requirement.is_primary {
                if held.is_core {
                    coarse.add_primary(requirement.importance, held_numeric);
                    primary_matching_skills.push(self.skill_fact(&requirement.skill_id));
                }
            } else {
                coarse.add_secondary(requirement.importance, held_numeric);
                secondary_matching_skills.push(self.skill_fact(&requirement.skill_id));
            }
        }

        let location = location_score(job.location.as_deref(), candidate.location.as_deref());
        let semantic = max_embedding_similarity(candidate, job).map_or(0.0, |s| s * 100.0);

        EnhancedMatch {
            counterpart_id: String::new(),
            name: None,
            title: None,
            location: None,
            score: enhanced_score(coarse.skill_score(), location, semantic, &ENHANCED_WEIGHTS),
            primary_matching_skills,
            secondary_matching_skills,
        }
    }

    /// Additive overlap score for one pair, see [`CoarseScore`].
    ///
    /// A primary requirement the candidate lacks entirely can still earn a
    /// related bonus through a core skill linked to it by RELATED_TO. Each
    /// requirement pays at most once, through its best linked skill.
    fn coarse_score(&self, candidate: &CandidateNode, job: &JobNode) -> CoarseScore {
        let mut score = CoarseScore::default();
        let mut related_best: BTreeMap<&str, f64> = BTreeMap::new();

        for requirement in &job.requirements {
            let held = held_skill(candidate, &requirement.skill_id);

            if !requirement.is_primary {
                if let Some(held) = held {
                    score.add_secondary(
                        requirement.importance,
                        proficiency_to_numeric(held.proficiency.as_ref()),
                    );
                }
                continue;
            }

            match held {
                Some(held) if held.is_core => score.add_primary(
                    requirement.importance,
                    proficiency_to_numeric(held.proficiency.as_ref()),
                ),
                Some(_) => {}
                None => {
                    let best = self
                        .related
                        .get(&requirement.skill_id)
                        .into_iter()
                        .flatten()
                        .filter_map(|neighbour| held_skill(candidate, neighbour))
                        .filter(|held| held.is_core)
                        .map(|held| {
                            requirement.importance
                                * proficiency_to_numeric(held.proficiency.as_ref())
                        })
                        .fold(None, |best: Option<f64>, value| {
                            Some(best.map_or(value, |b| b.max(value)))
                        });

                    if let Some(best) = best {
                        let entry = related_best
                            .entry(requirement.skill_id.as_str())
                            .or_insert(0.0);
                        *entry = entry.max(best);
                    }
                }
            }
        }

        for contribution in related_best.into_values() {
            // importance * held, the 0.25 factor is applied by add_related
            score.add_related(contribution, 1.0);
        }
        score
    }

    /// Breadth-first search over directed relations; ties between equally
    /// short paths go to the lexically smaller skill id at each hop.
    fn shortest_path<'a>(
        &'a self,
        start: &'a str,
        end: &str,
        max_depth: usize,
    ) -> Option<SkillPath> {
        if max_depth == 0 || start == end {
            return None;
        }

        let mut parent: HashMap<&'a str, (&'a str, RelationKind)> = HashMap::new();
        let mut frontier: VecDeque<(&'a str, usize)> = VecDeque::from([(start, 0)]);

        while let Some((skill, depth)) = frontier.pop_front() {
            if depth == max_depth {
                continue;
            }
            let Some(edges) = self.outgoing.get(skill) else {
                continue;
            };
            for (next, kind) in edges {
                let next = next.as_str();
                if next == start || parent.contains_key(next) {
                    continue;
                }
                parent.insert(next, (skill, *kind));
                if next == end {
                    return Some(self.build_path(next, &parent));
                }
                frontier.push_back((next, depth + 1));
            }
        }
        None
    }

    fn build_path(&self, end: &str, parent: &HashMap<&str, (&str, RelationKind)>) -> SkillPath {
        let mut skill_ids = vec![end.to_string()];
        let mut relationship_types = Vec::new();
        let mut cursor = end;
        while let Some(&(previous, kind)) = parent.get(cursor) {
            relationship_types.push(kind);
            skill_ids.push(previous.to_string());
            cursor = previous;
        }
        skill_ids.reverse();
        relationship_types.reverse();

        let skill_names = skill_ids
            .iter()
            .map(|id| self.skills.get(id).map_or_else(|| id.clone(), |s| s.name.clone()))
            .collect();

        SkillPath {
            skill_ids,
            skill_names,
            relationship_types,
        }
    }

    fn skill_fact(&self, skill_id: &str) -> SkillFact {
        match self.skills.get(skill_id) {
            Some(skill) => SkillFact {
                category: skill.category.clone(),
                ..SkillFact::new(skill.skill_id.clone(), skill.name.clone())
            },
            None => SkillFact::new(skill_id, skill_id),
        }
    }
}

fn held_skill<'a>(candidate: &'a CandidateNode, skill_id: &str) -> Option<&'a HeldSkill> {
    candidate.skills.iter().find(|s| s.skill_id == skill_id)
}

fn job_requires(job: &JobNode, skill_id: &str) -> bool {
    job.requirements.iter().any(|r| r.skill_id == skill_id)
}

fn max_embedding_similarity(candidate: &CandidateNode, job: &JobNode) -> Option<f64> {
    let job_embedding = job.embedding.as_deref()?;
    candidate
        .experience_embeddings
        .iter()
        .map(|e| f64::from(cosine_similarity(job_embedding, e)))
        .max_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
}

fn sort_by_importance(facts: &mut [SkillFact]) {
    facts.sort_by(|a, b| b.importance.partial_cmp(&a.importance).unwrap_or(Ordering::Equal));
}

fn sort_enhanced(mut matches: Vec<EnhancedMatch>, limit: usize) -> Vec<EnhancedMatch> {
    matches.sort_by(|a, b| {
        b.score
            .total_score
            .partial_cmp(&a.score.total_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.counterpart_id.cmp(&b.counterpart_id))
    });
    matches.truncate(limit);
    matches
}

#[async_trait]
impl GraphStore for InMemoryGraph {
    async fn coarse_jobs_for_candidate(
        &self,
        candidate_id: &str,
        limit: usize,
    ) -> Result<Vec<CoarseMatch>, GraphError> {
        let candidate = self.candidate(candidate_id)?;
        let matches = self
            .jobs
            .values()
            .filter_map(|job| {
                let score = self.coarse_score(candidate, job);
                score.passes().then(|| CoarseMatch {
                    counterpart_id: job.job_id.clone(),
                    raw_score: score.total(),
                })
            })
            .collect();
        Ok(rank_coarse(matches, limit))
    }

    async fn coarse_candidates_for_job(
        &self,
        job_id: &str,
        limit: usize,
    ) -> Result<Vec<CoarseMatch>, GraphError> {
        let job = self.job(job_id)?;
        let matches = self
            .candidates
            .values()
            .filter_map(|candidate| {
                let score = self.coarse_score(candidate, job);
                score.passes().then(|| CoarseMatch {
                    counterpart_id: candidate.resume_id.clone(),
                    raw_score: score.total(),
                })
            })
            .collect();
        Ok(rank_coarse(matches, limit))
    }

    async fn skill_facts(&self, candidate_id: &str, job_id: &str) -> Result<SkillFacts, GraphError> {
        let candidate = self.candidate(candidate_id)?;
        let job = self.job(job_id)?;
        let mut facts = SkillFacts::default();

        for requirement in &job.requirements {
            let held = held_skill(candidate, &requirement.skill_id);
            let base = SkillFact {
                importance: requirement.importance,
                required_proficiency: requirement.proficiency.clone(),
                ..self.skill_fact(&requirement.skill_id)
            };

            match (requirement.is_primary, held) {
                (true, Some(held)) if held.is_core => facts.matching.push(SkillFact {
                    held_proficiency: held.proficiency.clone(),
                    experience_years: held.experience_years,
                    is_core: true,
                    ..base
                }),
                // held only as a secondary skill: neither matched nor missing
                (true, Some(_)) => {}
                (true, None) => facts.missing.push(base),
                (false, Some(held)) => facts.secondary_matching.push(SkillFact {
                    held_proficiency: held.proficiency.clone(),
                    experience_years: held.experience_years,
                    is_core: false,
                    ..base
                }),
                (false, None) => {}
            }
        }

        facts.exceeding = candidate
            .skills
            .iter()
            .filter(|held| held.is_core && !job_requires(job, &held.skill_id))
            .map(|held| SkillFact {
                held_proficiency: held.proficiency.clone(),
                experience_years: held.experience_years,
                ..self.skill_fact(&held.skill_id)
            })
            .collect();

        sort_by_importance(&mut facts.matching);
        sort_by_importance(&mut facts.missing);
        sort_by_importance(&mut facts.secondary_matching);
        facts.exceeding.sort_by(|a, b| {
            let a = a.experience_years.unwrap_or(f64::NEG_INFINITY);
            let b = b.experience_years.unwrap_or(f64::NEG_INFINITY);
            b.partial_cmp(&a).unwrap_or(Ordering::Equal)
        });

        Ok(facts)
    }

    async fn candidate_corpus(&self, candidate_id: &str) -> Result<TextCorpus, GraphError> {
        let candidate = self.candidate(candidate_id)?;
        Ok(TextCorpus::from_fragments([
            candidate.experience.clone(),
            candidate.education.clone(),
            candidate.summary.clone(),
        ]))
    }

    async fn job_corpus(&self, job_id: &str) -> Result<TextCorpus, GraphError> {
        let job = self.job(job_id)?;
        Ok(TextCorpus::from_fragments([
            job.description.clone(),
            job.responsibilities.clone(),
            job.qualifications.clone(),
        ]))
    }

    async fn candidate_exists(&self, candidate_id: &str) -> Result<bool, GraphError> {
        Ok(self.candidates.contains_key(candidate_id))
    }

    async fn job_exists(&self, job_id: &str) -> Result<bool, GraphError> {
        Ok(self.jobs.contains_key(job_id))
    }

    async fn candidate_location(&self, candidate_id: &str) -> Result<Option<String>, GraphError> {
        Ok(self.candidate(candidate_id)?.location.clone())
    }

    async fn job_location(&self, job_id: &str) -> Result<Option<String>, GraphError> {
        Ok(self.job(job_id)?.location.clone())
    }

    /// Distinct core skills of the candidate with an edge of any kind
    /// pointing at `skill_id`.
    async fn related_core_skill_count(
        &self,
        candidate_id: &str,
        skill_id: &str,
    ) -> Result<usize, GraphError> {
        let candidate = self.candidate(candidate_id)?;
        let count = candidate
            .skills
            .iter()
            .filter(|held| held.is_core)
            .filter(|held| {
                self.outgoing
                    .get(&held.skill_id)
                    .is_some_and(|targets| targets.contains_key(skill_id))
            })
            .count();
        Ok(count)
    }

    /// Unknown skills simply have no path.
    async fn skill_path(
        &self,
        start: &str,
        end: &str,
        max_depth: usize,
    ) -> Result<Option<SkillPath>, GraphError> {
        Ok(self.shortest_path(start, end, max_depth))
    }
}
