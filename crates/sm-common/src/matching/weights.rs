/// Hybrid ranking weights.
/// coverage_boost carries the most weight: breadth of coverage matters most
/// when ordering candidates for the same job.
pub const HYBRID_WEIGHTS: HybridWeights = HybridWeights {
    graph: 0.20,
    text: 0.20,
    proficiency: 0.20,
    skill_balance: 0.10,
    exceeding: 0.05,
    coverage: 0.25,
};

/// Coarse blend used by the enhanced graph queries.
pub const ENHANCED_WEIGHTS: EnhancedWeights = EnhancedWeights {
    skills: 0.75,
    location: 0.15,
    semantic: 0.10,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridWeights {
    pub graph: f64,
    pub text: f64,
    pub proficiency: f64,
    pub skill_balance: f64,
    pub exceeding: f64,
    pub coverage: f64,
}

impl HybridWeights {
    pub fn sum(&self) -> f64 {
        self.graph + self.text + self.proficiency + self.skill_balance + self.exceeding + self.coverage
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnhancedWeights {
    pub skills: f64,
    pub location: f64,
    pub semantic: f64,
}

impl EnhancedWeights {
    pub fn sum(&self) -> f64 {
        self.skills + self.location + self.semantic
    }
}
