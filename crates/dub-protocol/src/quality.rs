use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Approved,
    ReviewNeeded,
    Reject,
}

/// Fraction of salient source tokens recovered in the translation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermPreservation {
    pub score: f32,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityBreakdown {
    pub accuracy: u8,
    pub naturalness: u8,
    pub dubbing_fit: u8,
    pub consistency: u8,
}

/// Structured scoring report for one translation chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub overall_score: u8,
    pub breakdown: QualityBreakdown,
    pub issues: Vec<String>,
    pub recommendation: Recommendation,
    pub term_preservation: TermPreservation,
    /// True when the evaluator sampled head/middle/tail windows instead of
    /// evaluating the full text.
    pub sampled: bool,
}

impl QualityReport {
    pub fn unavailable() -> Self {
        QualityReport {
            overall_score: 0,
            breakdown: QualityBreakdown::default(),
            issues: vec!["quality evaluation unavailable".into()],
            recommendation: Recommendation::ReviewNeeded,
            term_preservation: TermPreservation {
                score: 0.0,
                missing: vec![],
            },
            sampled: false,
        }
    }
}
