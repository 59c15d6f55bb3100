use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::match_response::MatchResult;
use crate::{
    graph::{GraphError, GraphStore, MatchSubject, SkillPath, SubjectKind},
    matching::{
        pipeline::MatchEngine,
        recommend::{SkillRecommendation, rank_recommendations},
    },
};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{kind} {id} not found")]
    NotFound { kind: SubjectKind, id: String },
    #[error("min_score must be within 0..=100, got {0}")]
    InvalidMinScore(f64),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Envelope returned to service callers. Exactly one of `matches` and
/// `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceResponse<T = MatchResult> {
    pub success: bool,
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<Vec<T>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl<T> ServiceResponse<T> {
    pub fn ok(matches: Vec<T>) -> Self {
        Self {
            success: true,
            total: matches.len(),
            matches: Some(matches),
            error: None,
            generated_at: Utc::now(),
        }
    }

    pub fn failure(err: &ServiceError) -> Self {
        Self {
            success: false,
            total: 0,
            matches: None,
            error: Some(err.to_string()),
            generated_at: Utc::now(),
        }
    }
}

/// Service-facing adapter over a [`MatchEngine`]. Checks that the subject
/// exists before ranking and never lets an error escape.
pub struct MatchingService<E, G: ?Sized> {
    engine: E,
    graph: Arc<G>,
}

impl<E, G> MatchingService<E, G>
where
    E: MatchEngine,
    G: GraphStore + ?Sized,
{
    pub fn new(engine: E, graph: Arc<G>) -> Self {
        Self { engine, graph }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub async fn matching_jobs_for_candidate(
        &self,
        candidate_id: &str,
        limit: usize,
        min_score: f64,
    ) -> ServiceResponse {
        self.ranked(MatchSubject::Candidate(candidate_id.to_string()), limit, min_score)
            .await
    }

    pub async fn matching_candidates_for_job(
        &self,
        job_id: &str,
        limit: usize,
        min_score: f64,
    ) -> ServiceResponse {
        self.ranked(MatchSubject::Job(job_id.to_string()), limit, min_score)
            .await
    }

    /// Missing primary skills of `job_id` the candidate could learn next.
    pub async fn recommend_skills_for_job(
        &self,
        candidate_id: &str,
        job_id: &str,
        limit: usize,
    ) -> ServiceResponse<SkillRecommendation> {
        match self.recommendations(candidate_id, job_id, limit).await {
            Ok(recommendations) => ServiceResponse::ok(recommendations),
            Err(err) => {
                warn!(candidate_id, job_id, error = %err, "skill recommendation failed");
                ServiceResponse::failure(&err)
            }
        }
    }

    /// Shortest relation chain from `start` to `end`. `matches` holds the
    /// single path, or nothing when the skills are not connected within
    /// `max_depth` edges.
    pub async fn skill_path(
        &self,
        start: &str,
        end: &str,
        max_depth: usize,
    ) -> ServiceResponse<SkillPath> {
        match self.graph.skill_path(start, end, max_depth).await {
            Ok(path) => ServiceResponse::ok(path.into_iter().collect()),
            Err(err) => {
                let err = ServiceError::from(err);
                warn!(start, end, error = %err, "skill path lookup failed");
                ServiceResponse::failure(&err)
            }
        }
    }

    async fn ranked(&self, subject: MatchSubject, limit: usize, min_score: f64) -> ServiceResponse {
        if let Err(err) = self.validate(&subject, min_score).await {
            warn!(subject_id = subject.id(), error = %err, "match request rejected");
            return ServiceResponse::failure(&err);
        }

        let matches = self.engine.rank(&subject, limit, min_score).await;
        info!(
            subject_id = subject.id(),
            subject_kind = %subject.kind(),
            total = matches.len(),
            "match request served"
        );
        ServiceResponse::ok(matches)
    }

    async fn validate(&self, subject: &MatchSubject, min_score: f64) -> Result<(), ServiceError> {
        if !(0.0..=100.0).contains(&min_score) {
            return Err(ServiceError::InvalidMinScore(min_score));
        }
        self.ensure_exists(subject).await
    }

    async fn ensure_exists(&self, subject: &MatchSubject) -> Result<(), ServiceError> {
        if self.graph.subject_exists(subject).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound {
                kind: subject.kind(),
                id: subject.id().to_string(),
            })
        }
    }

    async fn recommendations(
        &self,
        candidate_id: &str,
        job_id: &str,
        limit: usize,
    ) -> Result<Vec<SkillRecommendation>, ServiceError> {
        self.ensure_exists(&MatchSubject::Candidate(candidate_id.to_string()))
            .await?;
        self.ensure_exists(&MatchSubject::Job(job_id.to_string()))
            .await?;

        let facts = self.graph.skill_facts(candidate_id, job_id).await?;
        let mut scored = Vec::with_capacity(facts.missing.len());
        for fact in facts.missing {
            let relevance = match fact.skill_id.as_deref() {
                Some(skill_id) => {
                    self.graph
                        .related_core_skill_count(candidate_id, skill_id)
                        .await?
                }
                None => 0,
            };
            scored.push((fact, relevance));
        }

        Ok(rank_recommendations(scored, limit))
    }
}
