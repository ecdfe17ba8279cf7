use serde::{Deserialize, Serialize};

use super::super::domain::Severity;

/// Linear penalty capped at a ceiling: `min(count * rate, cap)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CappedPenalty {
    pub per_complaint: f64,
    pub cap: f64,
}

impl CappedPenalty {
    pub const fn new(per_complaint: f64, cap: f64) -> Self {
        Self { per_complaint, cap }
    }

    pub fn apply(&self, count: usize) -> f64 {
        (count as f64 * self.per_complaint).min(self.cap)
    }
}

/// Per-complaint severity weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityWeights {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl SeverityWeights {
    pub fn weight(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }
}

/// Deduction rubric applied to every project of a contractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRubric {
    pub baseline: f64,
    pub warranty_complaints: CappedPenalty,
    pub post_warranty_complaints: CappedPenalty,
    pub severity: SeverityWeights,
    pub unresolved: CappedPenalty,
    pub recency_window_days: i64,
    pub recent: CappedPenalty,
}

impl RatingRubric {
    pub const MAX_RATING: f64 = 5.0;
    pub const MIN_RATING: f64 = 0.0;

    pub const fn standard() -> Self {
        Self {
            baseline: 5.0,
            warranty_complaints: CappedPenalty::new(0.3, 2.0),
            post_warranty_complaints: CappedPenalty::new(0.1, 0.5),
            severity: SeverityWeights {
                critical: 1.0,
                high: 0.7,
                medium: 0.4,
                low: 0.1,
            },
            unresolved: CappedPenalty::new(0.2, 1.0),
            recency_window_days: 30,
            recent: CappedPenalty::new(0.15, 0.75),
        }
    }
}

impl Default for RatingRubric {
    fn default() -> Self {
        Self::standard()
    }
}
