use std::{cmp::Ordering, sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{sync::Semaphore, task::JoinSet, time::timeout};
use tracing::{Instrument, debug, info, info_span, warn};

use super::{
    location::location_score,
    scoring::{HybridComponents, display_percentage, round1, score_to_percentage},
    skills::{SkillFacts, coverage_score},
    weights::HYBRID_WEIGHTS,
};
use crate::{
    api::match_response::MatchResult,
    config::{EngineConfig, OVERFETCH_FACTOR},
    graph::{CoarseMatch, GraphError, GraphStore, MatchSubject},
    run_id,
    text::{TextCorpus, TextSimilarity, TextSimilarityEstimator},
};

/// Why a single candidate-job pair was left out of a ranking.
#[derive(Debug, thiserror::Error)]
pub enum PairError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("pair fetch timed out after {0:?}")]
    Timeout(Duration),
    #[error("pair task failed: {0}")]
    JoinFailure(String),
}

/// Everything the scorer needs for one pair, fetched from the graph.
#[derive(Debug, Clone, Default)]
pub struct PairInputs {
    pub facts: SkillFacts,
    pub job_corpus: TextCorpus,
    pub candidate_corpus: TextCorpus,
    pub job_location: Option<String>,
    pub candidate_location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairScore {
    pub hybrid_score: f64,
    pub match_percentage: u8,
    /// One-decimal percentage, compared against `min_score`.
    pub percentage: f64,
    pub components: HybridComponents,
    pub graph_percentage: f64,
    pub text: TextSimilarity,
    pub text_percentage: f64,
    pub location_score: Option<f64>,
}

/// Coverage, text and hybrid scoring for one pair. Pure; no graph access.
pub fn score_pair(inputs: &PairInputs, text: &TextSimilarityEstimator) -> PairScore {
    let facts = &inputs.facts;
    let coverage = coverage_score(&facts.matching, &facts.required());
    let similarity = text.similarity(&inputs.job_corpus, &inputs.candidate_corpus);

    let components = HybridComponents::compute(
        coverage,
        similarity.raw,
        &facts.matching,
        &facts.missing,
        &facts.exceeding,
    );
    let hybrid_score = components.weighted_total(&HYBRID_WEIGHTS);

    let location_score = match (&inputs.job_location, &inputs.candidate_location) {
        (None, None) => None,
        (job, candidate) => Some(location_score(job.as_deref(), candidate.as_deref())),
    };

    PairScore {
        hybrid_score,
        match_percentage: display_percentage(hybrid_score),
        percentage: score_to_percentage(hybrid_score),
        components,
        graph_percentage: score_to_percentage(components.graph_score),
        text: similarity,
        text_percentage: round1(similarity.normalized * 100.0),
        location_score,
    }
}

/// Ranking capability shared by the service and the command line.
#[async_trait]
pub trait MatchEngine: Send + Sync {
    /// At most `limit` counterparts of `subject`, best first. Never fails:
    /// upstream problems shrink the result instead.
    async fn rank(&self, subject: &MatchSubject, limit: usize, min_score: f64) -> Vec<MatchResult>;
}

/// Coarse fetch from the graph, parallel per-pair scoring, then a single
/// filter / sort / truncate pass.
pub struct HybridMatchEngine<G: GraphStore + ?Sized> {
    graph: Arc<G>,
    config: EngineConfig,
    text: Arc<TextSimilarityEstimator>,
}

impl<G: GraphStore + ?Sized + 'static> HybridMatchEngine<G> {
    pub fn new(graph: Arc<G>, config: EngineConfig) -> Self {
        let text = Arc::new(TextSimilarityEstimator::new(config.text.clone()));
        Self { graph, config, text }
    }

    async fn rank_inner(
        &self,
        subject: &MatchSubject,
        limit: usize,
        min_score: f64,
    ) -> Vec<MatchResult> {
        if limit == 0 {
            return Vec::new();
        }

        let overfetch = limit.saturating_mul(OVERFETCH_FACTOR);
        let coarse = match timeout(
            self.config.coarse_timeout,
            self.graph.coarse_match(subject, overfetch),
        )
        .await
        {
            Ok(Ok(coarse)) => coarse,
            Ok(Err(err)) => {
                warn!(error = %err, "coarse fetch failed; returning no matches");
                return Vec::new();
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.config.coarse_timeout.as_millis() as u64,
                    "coarse fetch timed out; returning no matches"
                );
                return Vec::new();
            }
        };

        if coarse.is_empty() {
            debug!("no coarse matches");
            return Vec::new();
        }

        let scored = self.score_pairs(subject, &coarse).await;
        let dropped = scored.iter().filter(|s| s.is_none()).count();

        let mut kept: Vec<(PairScore, MatchResult)> = coarse
            .iter()
            .zip(scored)
            .filter_map(|(coarse, scored)| {
                let (score, facts) = scored?;
                let result = MatchResult::assemble(subject, coarse, &score, &facts);
                Some((score, result))
            })
            .filter(|(score, _)| score.percentage >= min_score)
            .collect();

        // Stable: equal hybrid scores keep the coarse ranking order.
        kept.sort_by(|(a, _), (b, _)| {
            b.hybrid_score
                .partial_cmp(&a.hybrid_score)
                .unwrap_or(Ordering::Equal)
        });
        kept.truncate(limit);

        info!(
            coarse = coarse.len(),
            dropped,
            returned = kept.len(),
            "ranked matches"
        );
        kept.into_iter().map(|(_, result)| result).collect()
    }

    /// Scores every coarse row concurrently. The output is aligned with
    /// `coarse`; dropped pairs are `None`.
    async fn score_pairs(
        &self,
        subject: &MatchSubject,
        coarse: &[CoarseMatch],
    ) -> Vec<Option<(PairScore, SkillFacts)>> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for (index, row) in coarse.iter().enumerate() {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(err) => {
                    warn!(error = %err, "worker pool closed; scoring stopped early");
                    break;
                }
            };

            let (candidate_id, job_id) = subject.pair(&row.counterpart_id);
            let (candidate_id, job_id) = (candidate_id.to_string(), job_id.to_string());
            let graph = Arc::clone(&self.graph);
            let text = Arc::clone(&self.text);
            let pair_timeout = self.config.pair_timeout;

            tasks.spawn(
                async move {
                    let _permit = permit;
                    let outcome = match timeout(
                        pair_timeout,
                        fetch_pair(graph.as_ref(), &candidate_id, &job_id),
                    )
                    .await
                    {
                        Ok(Ok(inputs)) => {
                            let score = score_pair(&inputs, &text);
                            Ok((score, inputs.facts))
                        }
                        Ok(Err(err)) => Err(PairError::from(err)),
                        Err(_) => Err(PairError::Timeout(pair_timeout)),
                    };
                    (index, outcome)
                }
                .in_current_span(),
            );
        }

        let mut scored: Vec<Option<(PairScore, SkillFacts)>> = vec![None; coarse.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = match joined {
                Ok(done) => done,
                Err(err) => {
                    let err = PairError::JoinFailure(err.to_string());
                    warn!(error = %err, "dropping pair");
                    continue;
                }
            };
            match outcome {
                Ok(value) => scored[index] = Some(value),
                Err(err) => warn!(
                    counterpart_id = %coarse[index].counterpart_id,
                    error = %err,
                    "dropping pair"
                ),
            }
        }
        scored
    }
}

async fn fetch_pair<G: GraphStore + ?Sized>(
    graph: &G,
    candidate_id: &str,
    job_id: &str,
) -> Result<PairInputs, GraphError> {
    let (facts, job_corpus, candidate_corpus, job_location, candidate_location) = tokio::try_join!(
        graph.skill_facts(candidate_id, job_id),
        graph.job_corpus(job_id),
        graph.candidate_corpus(candidate_id),
        graph.job_location(job_id),
        graph.candidate_location(candidate_id),
    )?;

    Ok(PairInputs {
        facts,
        job_corpus,
        candidate_corpus,
        job_location,
        candidate_location,
    })
}

#[async_trait]
impl<G: GraphStore + ?Sized + 'static> MatchEngine for HybridMatchEngine<G> {
    async fn rank(&self, subject: &MatchSubject, limit: usize, min_score: f64) -> Vec<MatchResult> {
        let span = info_span!(
            "match_rank",
            match_run_id = %run_id::generate(),
            subject_id = %subject.id(),
            subject_kind = %subject.kind(),
            limit
        );
        self.rank_inner(subject, limit, min_score).instrument(span).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use super::*;
    use crate::{
        graph::SubjectKind,
        matching::{proficiency::ProficiencyLevel, skills::SkillFact},
    };

    fn fact(id: &str, importance: f64, held: Option<ProficiencyLevel>) -> SkillFact {
        SkillFact {
            importance,
            required_proficiency: Some(ProficiencyLevel::Advanced.into()),
            held_proficiency: held.map(Into::into),
            ..SkillFact::new(id, id)
        }
    }

    fn strong() -> SkillFacts {
        SkillFacts {
            matching: vec![fact("rust", 0.9, Some(ProficiencyLevel::Advanced))],
            ..SkillFacts::default()
        }
    }

    fn mid() -> SkillFacts {
        SkillFacts {
            matching: vec![fact("rust", 0.9, Some(ProficiencyLevel::Advanced))],
            missing: vec![fact("k8s", 0.5, None)],
            ..SkillFacts::default()
        }
    }

    fn weak() -> SkillFacts {
        SkillFacts {
            missing: vec![fact("rust", 0.9, None)],
            ..SkillFacts::default()
        }
    }

    #[derive(Default)]
    struct StubGraph {
        coarse: Vec<CoarseMatch>,
        facts: HashMap<String, SkillFacts>,
        failing: HashSet<String>,
        slow: HashSet<String>,
        coarse_fails: bool,
    }

    impl StubGraph {
        fn with(rows: &[(&str, SkillFacts)]) -> Self {
            Self {
                coarse: rows
                    .iter()
                    .map(|(id, _)| CoarseMatch {
                        counterpart_id: id.to_string(),
                        raw_score: 1.0,
                    })
                    .collect(),
                facts: rows
                    .iter()
                    .map(|(id, facts)| (id.to_string(), facts.clone()))
                    .collect(),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl GraphStore for StubGraph {
        async fn coarse_jobs_for_candidate(
            &self,
            _candidate_id: &str,
            limit: usize,
        ) -> Result<Vec<CoarseMatch>, GraphError> {
            Ok(self.coarse.iter().take(limit).cloned().collect())
        }

        async fn coarse_candidates_for_job(
            &self,
            _job_id: &str,
            limit: usize,
        ) -> Result<Vec<CoarseMatch>, GraphError> {
            if self.coarse_fails {
                return Err(GraphError::Unavailable("connection refused".into()));
            }
            Ok(self.coarse.iter().take(limit).cloned().collect())
        }

        async fn skill_facts(
            &self,
            candidate_id: &str,
            _job_id: &str,
        ) -> Result<SkillFacts, GraphError> {
            if self.failing.contains(candidate_id) {
                return Err(GraphError::Unavailable("read failed".into()));
            }
            if self.slow.contains(candidate_id) {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            Ok(self.facts.get(candidate_id).cloned().unwrap_or_default())
        }

        async fn candidate_corpus(&self, _candidate_id: &str) -> Result<TextCorpus, GraphError> {
            Ok(TextCorpus::from_fragments([Some("async rust services".to_string())]))
        }

        async fn job_corpus(&self, _job_id: &str) -> Result<TextCorpus, GraphError> {
            Ok(TextCorpus::from_fragments([Some("async rust services".to_string())]))
        }

        async fn candidate_exists(&self, _candidate_id: &str) -> Result<bool, GraphError> {
            Ok(true)
        }

        async fn job_exists(&self, _job_id: &str) -> Result<bool, GraphError> {
            Ok(true)
        }
    }

    fn engine(graph: StubGraph) -> HybridMatchEngine<StubGraph> {
        HybridMatchEngine::new(Arc::new(graph), EngineConfig::default())
    }

    fn ids(results: &[MatchResult]) -> Vec<&str> {
        results.iter().map(|r| r.counterpart_id.as_str()).collect()
    }

    fn job() -> MatchSubject {
        MatchSubject::Job("j1".into())
    }

    #[test]
    fn score_pair_blends_coverage_and_text() {
        let inputs = PairInputs {
            facts: strong(),
            job_corpus: TextCorpus::from_fragments([Some("async rust".to_string())]),
            candidate_corpus: TextCorpus::from_fragments([Some("async rust".to_string())]),
            job_location: Some("Berlin, BE".into()),
            candidate_location: None,
        };
        let score = score_pair(&inputs, &TextSimilarityEstimator::default());

        // 0.2 graph + 0.2 text + 0.2 * 0.9 proficiency + 0.1 * 0.2 balance + 0.25 coverage
        assert!((score.hybrid_score - 0.85).abs() < 1e-9);
        assert_eq!(score.graph_percentage, 100.0);
        assert_eq!(score.location_score, Some(0.0));
        assert!(score.match_percentage <= 100);
    }

    #[tokio::test]
    async fn ranks_by_hybrid_score() {
        let graph = StubGraph::with(&[("weak", weak()), ("mid", mid()), ("strong", strong())]);
        let results = engine(graph).rank(&job(), 10, 0.0).await;

        assert_eq!(ids(&results), vec!["strong", "mid", "weak"]);
        assert!(results.windows(2).all(|w| w[0].hybrid_score >= w[1].hybrid_score));
        assert_eq!(results[0].subject_kind, SubjectKind::Job);
    }

    #[tokio::test]
    async fn respects_limit_and_min_score() {
        let graph = StubGraph::with(&[("weak", weak()), ("mid", mid()), ("strong", strong())]);
        let engine = engine(graph);

        assert_eq!(ids(&engine.rank(&job(), 2, 0.0).await), vec!["strong", "mid"]);
        assert_eq!(ids(&engine.rank(&job(), 10, 50.0).await), vec!["strong", "mid"]);
        assert!(engine.rank(&job(), 0, 0.0).await.is_empty());
    }

    #[tokio::test]
    async fn ties_keep_coarse_order() {
        let graph = StubGraph::with(&[("b", mid()), ("a", mid()), ("c", strong())]);
        let results = engine(graph).rank(&job(), 10, 0.0).await;
        assert_eq!(ids(&results), vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn failing_pairs_are_dropped() {
        let mut graph = StubGraph::with(&[("mid", mid()), ("broken", strong()), ("weak", weak())]);
        graph.failing.insert("broken".into());

        let results = engine(graph).rank(&job(), 10, 0.0).await;
        assert_eq!(ids(&results), vec!["mid", "weak"]);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_pairs_time_out() {
        let mut graph = StubGraph::with(&[("slow", strong()), ("mid", mid())]);
        graph.slow.insert("slow".into());

        let results = engine(graph).rank(&job(), 10, 0.0).await;
        assert_eq!(ids(&results), vec!["mid"]);
    }

    #[tokio::test]
    async fn coarse_failure_or_empty_yields_nothing() {
        let mut graph = StubGraph::with(&[("mid", mid())]);
        graph.coarse_fails = true;
        assert!(engine(graph).rank(&job(), 5, 0.0).await.is_empty());

        assert!(engine(StubGraph::default()).rank(&job(), 5, 0.0).await.is_empty());
    }

    #[tokio::test]
    async fn single_worker_gives_identical_results() {
        let rows = [("weak", weak()), ("mid", mid()), ("strong", strong())];
        let parallel = engine(StubGraph::with(&rows)).rank(&job(), 10, 0.0).await;

        let serial = HybridMatchEngine::new(
            Arc::new(StubGraph::with(&rows)),
            EngineConfig {
                max_concurrency: 1,
                ..EngineConfig::default()
            },
        )
        .rank(&job(), 10, 0.0)
        .await;

        assert_eq!(parallel, serial);
    }
}
