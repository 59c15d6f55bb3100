use serde::{Deserialize, Serialize};

/// Proximity tiers between two free-text "City, Region" locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationTier {
    Unknown,
    Exact,
    SameCity,
    SameRegion,
    Partial,
    NoMatch,
}

impl LocationTier {
    pub fn score(self) -> f64 {
        match self {
            Self::Exact => 100.0,
            Self::SameCity => 80.0,
            Self::SameRegion => 50.0,
            Self::Partial => 30.0,
            Self::Unknown | Self::NoMatch => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationEvaluation {
    pub tier: LocationTier,
    pub score: f64, // 0〜100
}

/// Single entry point for location proximity. Rules are evaluated top to
/// bottom and the first one that matches wins.
pub fn evaluate_location(job: Option<&str>, candidate: Option<&str>) -> LocationEvaluation {
    let tier = match (non_empty(job), non_empty(candidate)) {
        (Some(job), Some(candidate)) => classify(job, candidate),
        _ => LocationTier::Unknown,
    };

    LocationEvaluation {
        tier,
        score: tier.score(),
    }
}

pub fn location_score(job: Option<&str>, candidate: Option<&str>) -> f64 {
    evaluate_location(job, candidate).score
}

fn classify(job: &str, candidate: &str) -> LocationTier {
    if job == candidate {
        return LocationTier::Exact;
    }

    let job_parts: Vec<&str> = job.split(',').collect();
    let candidate_parts: Vec<&str> = candidate.split(',').collect();

    // city segment is compared as-is, region segment trimmed
    if job_parts[0] == candidate_parts[0] {
        return LocationTier::SameCity;
    }

    if job_parts.len() > 1
        && candidate_parts.len() > 1
        && job_parts[1].trim() == candidate_parts[1].trim()
    {
        return LocationTier::SameRegion;
    }

    if job.contains(candidate) || candidate.contains(job) {
        return LocationTier::Partial;
    }

    LocationTier::NoMatch
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
