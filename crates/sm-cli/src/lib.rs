use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;
use sm_common::{
    DEFAULT_MAX_PATH_DEPTH, EngineConfig, GraphError, HybridMatchEngine, InMemoryGraph,
    MatchEngine, MatchSubject, MatchingService, matching::recommend::DEFAULT_RECOMMENDATION_LIMIT,
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read graph snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Service(String),
}

#[derive(Debug, Clone, Parser)]
#[command(name = "sm-match", about = "Rank candidates and jobs over a skill graph snapshot")]
pub struct Cli {
    /// JSON graph snapshot (skills, candidates, jobs, relations)
    #[arg(long, env = "SM_GRAPH_PATH")]
    pub graph: PathBuf,

    /// Wrap results in the service envelope and check that the subject exists
    #[arg(long, env = "SM_CLI_SERVICE", default_value = "false")]
    pub service: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Jobs for a candidate, best first
    RankJobs {
        #[arg(long)]
        candidate: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Minimum match percentage (0-100)
        #[arg(long, default_value_t = 0.0)]
        min_score: f64,
    },
    /// Candidates for a job, best first
    RankCandidates {
        #[arg(long)]
        job: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value_t = 0.0)]
        min_score: f64,
    },
    /// Skills + location + embedding blend over every candidate
    EnhancedCandidates {
        #[arg(long)]
        job: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Skills + location + embedding blend over every job
    EnhancedJobs {
        #[arg(long)]
        candidate: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Missing job skills worth learning
    Recommend {
        #[arg(long)]
        candidate: String,
        #[arg(long)]
        job: String,
        #[arg(long, default_value_t = DEFAULT_RECOMMENDATION_LIMIT)]
        limit: usize,
    },
    /// Shortest chain of skill relations between two skills
    SkillPath {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long, default_value_t = DEFAULT_MAX_PATH_DEPTH)]
        max_depth: usize,
    },
}

pub async fn load_graph(path: &Path) -> Result<InMemoryGraph, CliError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(InMemoryGraph::from_json_str(&raw)?)
}

/// Runs one command and returns its JSON output.
pub async fn execute(cli: Cli) -> Result<Value, CliError> {
    execute_with_config(cli, EngineConfig::from_env()).await
}

pub async fn execute_with_config(cli: Cli, config: EngineConfig) -> Result<Value, CliError> {
    let graph = Arc::new(load_graph(&cli.graph).await?);
    info!(path = %cli.graph.display(), "graph snapshot loaded");

    let engine = HybridMatchEngine::new(Arc::clone(&graph), config);
    let service = MatchingService::new(engine, Arc::clone(&graph));

    let output = match cli.command {
        Command::RankJobs {
            candidate,
            limit,
            min_score,
        } => {
            if cli.service {
                let response = service
                    .matching_jobs_for_candidate(&candidate, limit, min_score)
                    .await;
                serde_json::to_value(response)?
            } else {
                let subject = MatchSubject::Candidate(candidate);
                serde_json::to_value(service.engine().rank(&subject, limit, min_score).await)?
            }
        }
        Command::RankCandidates {
            job,
            limit,
            min_score,
        } => {
            if cli.service {
                let response = service
                    .matching_candidates_for_job(&job, limit, min_score)
                    .await;
                serde_json::to_value(response)?
            } else {
                let subject = MatchSubject::Job(job);
                serde_json::to_value(service.engine().rank(&subject, limit, min_score).await)?
            }
        }
        Command::EnhancedCandidates { job, limit } => {
            serde_json::to_value(graph.enhanced_candidates_for_job(&job, limit)?)?
        }
        Command::EnhancedJobs { candidate, limit } => {
            serde_json::to_value(graph.enhanced_jobs_for_candidate(&candidate, limit)?)?
        }
        Command::Recommend {
            candidate,
            job,
            limit,
        } => {
            let response = service
                .recommend_skills_for_job(&candidate, &job, limit)
                .await;
            if cli.service {
                serde_json::to_value(response)?
            } else {
                match (response.matches, response.error) {
                    (Some(recommendations), _) => serde_json::to_value(recommendations)?,
                    (None, error) => {
                        return Err(CliError::Service(
                            error.unwrap_or_else(|| "recommendation failed".into()),
                        ));
                    }
                }
            }
        }
        Command::SkillPath {
            from,
            to,
            max_depth,
        } => {
            let response = service.skill_path(&from, &to, max_depth).await;
            if cli.service {
                serde_json::to_value(response)?
            } else {
                match (response.matches, response.error) {
                    // null when the skills are not connected
                    (Some(paths), _) => serde_json::to_value(paths.into_iter().next())?,
                    (None, error) => {
                        return Err(CliError::Service(
                            error.unwrap_or_else(|| "skill path lookup failed".into()),
                        ));
                    }
                }
            }
        }
    };

    Ok(output)
}
