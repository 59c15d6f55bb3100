use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered proficiency labels used on both sides of a skill relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProficiencyLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl ProficiencyLevel {
    pub fn as_numeric(self) -> f64 {
        match self {
            Self::Beginner => 0.25,
            Self::Intermediate => 0.5,
            Self::Advanced => 0.75,
            Self::Expert => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Expert => "expert",
        }
    }

    /// Case-insensitive label lookup. Unknown labels return `None`.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            "expert" => Some(Self::Expert),
            _ => None,
        }
    }
}

impl fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proficiency as delivered by the graph store.
///
/// Labels that do not parse are kept as `Unrecognized` so the fallback to
/// intermediate stays visible instead of disappearing inside a string match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawProficiency", into = "RawProficiency")]
pub enum Proficiency {
    Level(ProficiencyLevel),
    /// 0-10 scale.
    Numeric(f64),
    Unrecognized(String),
}

pub const DEFAULT_PROFICIENCY: ProficiencyLevel = ProficiencyLevel::Intermediate;

impl Proficiency {
    pub fn label(value: &str) -> Self {
        match ProficiencyLevel::parse(value) {
            Some(level) => Self::Level(level),
            None => Self::Unrecognized(value.to_string()),
        }
    }

    /// Maps onto [0, 1]. Never fails: unknown labels and NaN fall back to
    /// intermediate (0.5).
    pub fn to_numeric(&self) -> f64 {
        match self {
            Self::Level(level) => level.as_numeric(),
            Self::Numeric(value) if value.is_nan() => DEFAULT_PROFICIENCY.as_numeric(),
            Self::Numeric(value) => (value / 10.0).clamp(0.0, 1.0),
            Self::Unrecognized(_) => DEFAULT_PROFICIENCY.as_numeric(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Unrecognized(_)) || matches!(self, Self::Numeric(v) if v.is_nan())
    }
}

impl From<ProficiencyLevel> for Proficiency {
    fn from(level: ProficiencyLevel) -> Self {
        Self::Level(level)
    }
}

/// Missing proficiency counts as intermediate.
pub fn proficiency_to_numeric(value: Option<&Proficiency>) -> f64 {
    value
        .map(Proficiency::to_numeric)
        .unwrap_or_else(|| DEFAULT_PROFICIENCY.as_numeric())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawProficiency {
    Number(f64),
    Text(String),
}

impl From<RawProficiency> for Proficiency {
    fn from(raw: RawProficiency) -> Self {
        match raw {
            RawProficiency::Number(value) => Self::Numeric(value),
            RawProficiency::Text(text) => Self::label(&text),
        }
    }
}

impl From<Proficiency> for RawProficiency {
    fn from(value: Proficiency) -> Self {
        match value {
            Proficiency::Level(level) => RawProficiency::Text(level.as_str().to_string()),
            Proficiency::Numeric(n) => RawProficiency::Number(n),
            Proficiency::Unrecognized(text) => RawProficiency::Text(text),
        }
    }
}
