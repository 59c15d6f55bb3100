pub mod api;
pub mod config;
pub mod graph;
pub mod logging;
pub mod matching;
pub mod run_id;
pub mod text;

pub use api::match_response::{MatchResult, SkillEntry};
pub use api::service::{MatchingService, ServiceError, ServiceResponse};
pub use config::EngineConfig;
pub use graph::{
    DEFAULT_MAX_PATH_DEPTH, GraphError, GraphStore, MatchSubject, RelationKind, SkillPath,
    memory::{GraphSnapshot, InMemoryGraph},
};
pub use matching::pipeline::{HybridMatchEngine, MatchEngine};
pub use matching::proficiency::{Proficiency, ProficiencyLevel};
pub use matching::recommend::SkillRecommendation;
pub use matching::skills::{SkillFact, SkillFacts};
pub use text::TextCorpus;
