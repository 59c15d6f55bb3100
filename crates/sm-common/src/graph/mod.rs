pub mod memory;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{matching::skills::SkillFacts, text::TextCorpus};

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("{kind} {id} not found")]
    NotFound { kind: SubjectKind, id: String },
    #[error("graph store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed graph data: {0}")]
    Malformed(String),
    #[error("failed to parse graph snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Candidate,
    Job,
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Candidate => f.write_str("candidate"),
            Self::Job => f.write_str("job"),
        }
    }
}

/// Who is being matched. A candidate is ranked against jobs, a job against
/// candidates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum MatchSubject {
    Candidate(String),
    Job(String),
}

impl MatchSubject {
    pub fn id(&self) -> &str {
        match self {
            Self::Candidate(id) | Self::Job(id) => id,
        }
    }

    pub fn kind(&self) -> SubjectKind {
        match self {
            Self::Candidate(_) => SubjectKind::Candidate,
            Self::Job(_) => SubjectKind::Job,
        }
    }

    /// (candidate_id, job_id) for a pair with `counterpart_id`.
    pub fn pair<'a>(&'a self, counterpart_id: &'a str) -> (&'a str, &'a str) {
        match self {
            Self::Candidate(id) => (id.as_str(), counterpart_id),
            Self::Job(id) => (counterpart_id, id.as_str()),
        }
    }
}

/// Longest relation chain searched by [`GraphStore::skill_path`] unless the
/// caller asks otherwise.
pub const DEFAULT_MAX_PATH_DEPTH: usize = 3;

/// Edge type between two skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    RelatedTo,
    Requires,
    ComplementaryTo,
}

/// A learning path between two skills. `relationship_types[i]` links
/// `skill_ids[i]` to `skill_ids[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillPath {
    pub skill_ids: Vec<String>,
    pub skill_names: Vec<String>,
    pub relationship_types: Vec<RelationKind>,
}

/// One row of the cheap upstream ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoarseMatch {
    pub counterpart_id: String,
    pub raw_score: f64,
}

/// Read access to the skill graph.
///
/// Implementations must be safe to call concurrently; the engine issues
/// per-pair reads in parallel.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Jobs overlapping the candidate's core skills, best first.
    async fn coarse_jobs_for_candidate(
        &self,
        candidate_id: &str,
        limit: usize,
    ) -> Result<Vec<CoarseMatch>, GraphError>;

    /// Candidates overlapping the job's primary requirements, best first.
    async fn coarse_candidates_for_job(
        &self,
        job_id: &str,
        limit: usize,
    ) -> Result<Vec<CoarseMatch>, GraphError>;

    async fn skill_facts(&self, candidate_id: &str, job_id: &str) -> Result<SkillFacts, GraphError>;

    /// experience, education, summary
    async fn candidate_corpus(&self, candidate_id: &str) -> Result<TextCorpus, GraphError>;

    /// description, responsibilities, qualifications
    async fn job_corpus(&self, job_id: &str) -> Result<TextCorpus, GraphError>;

    async fn candidate_exists(&self, candidate_id: &str) -> Result<bool, GraphError>;

    async fn job_exists(&self, job_id: &str) -> Result<bool, GraphError>;

    async fn candidate_location(&self, _candidate_id: &str) -> Result<Option<String>, GraphError> {
        Ok(None)
    }

    async fn job_location(&self, _job_id: &str) -> Result<Option<String>, GraphError> {
        Ok(None)
    }

    /// Number of the candidate's core skills related to `skill_id`.
    async fn related_core_skill_count(
        &self,
        _candidate_id: &str,
        _skill_id: &str,
    ) -> Result<usize, GraphError> {
        Ok(0)
    }

    /// Shortest directed chain of skill relations from `start` to `end`,
    /// at most `max_depth` edges long.
    async fn skill_path(
        &self,
        _start: &str,
        _end: &str,
        _max_depth: usize,
    ) -> Result<Option<SkillPath>, GraphError> {
        Ok(None)
    }

    async fn coarse_match(
        &self,
        subject: &MatchSubject,
        limit: usize,
    ) -> Result<Vec<CoarseMatch>, GraphError> {
        match subject {
            MatchSubject::Candidate(id) => self.coarse_jobs_for_candidate(id, limit).await,
            MatchSubject::Job(id) => self.coarse_candidates_for_job(id, limit).await,
        }
    }

    async fn subject_exists(&self, subject: &MatchSubject) -> Result<bool, GraphError> {
        match subject {
            MatchSubject::Candidate(id) => self.candidate_exists(id).await,
            MatchSubject::Job(id) => self.job_exists(id).await,
        }
    }
}
