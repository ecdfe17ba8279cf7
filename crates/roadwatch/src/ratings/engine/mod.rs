mod classify;
mod rubric;
mod rules;

pub use classify::{
    rating_category, rating_color, risk_level, RatingCategory, RiskAssessment, RiskLevel,
};
pub use rubric::{CappedPenalty, RatingRubric, SeverityWeights};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Complaint, Contractor, RoadProject};
use super::validation::{validate_snapshot, RatingError};

/// Stateless scorer that turns a contractor's complaint history into a 0-5 rating.
#[derive(Debug, Clone, Default)]
pub struct RatingEngine {
    rubric: RatingRubric,
}

impl RatingEngine {
    pub fn new(rubric: RatingRubric) -> Self {
        Self { rubric }
    }

    pub fn rubric(&self) -> &RatingRubric {
        &self.rubric
    }

    /// Score `contractor` from its projects and the complaints filed against them.
    ///
    /// Complaints are matched to projects by `project_id`; complaints for projects outside
    /// `projects` are ignored. The deduction log follows the order of `projects`.
    pub fn compute(
        &self,
        contractor: &Contractor,
        projects: &[RoadProject],
        complaints: &[Complaint],
        now: DateTime<Utc>,
    ) -> Result<RatingResult, RatingError> {
        validate_snapshot(contractor, projects)?;

        let mut rating_points = self.rubric.baseline;
        let mut deductions = Vec::new();

        for project in projects {
            let project_complaints = complaints
                .iter()
                .filter(|complaint| complaint.project_id == project.id)
                .collect::<Vec<_>>();

            let project_deductions =
                rules::project_deductions(project, &project_complaints, &self.rubric, now);
            for deduction in project_deductions {
                rating_points -= deduction.deduction;
                deductions.push(deduction);
            }
        }

        let rating_points =
            rating_points.clamp(RatingRubric::MIN_RATING, RatingRubric::MAX_RATING);

        Ok(RatingResult {
            final_rating: round_to_hundredths(rating_points),
            deductions,
            total_deduction: RatingRubric::MAX_RATING - rating_points,
            rating_category: RatingCategory::from_rating(rating_points),
            timestamp: now,
        })
    }
}

/// One entry of the audit log explaining how a rating dropped below 5.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deduction {
    pub reason: String,
    pub deduction: f64,
}

/// Engine output handed back to the caller for persistence and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingResult {
    pub final_rating: f64,
    pub deductions: Vec<Deduction>,
    /// Measured from the clamped score before rounding.
    pub total_deduction: f64,
    pub rating_category: RatingCategory,
    pub timestamp: DateTime<Utc>,
}

impl RatingResult {
    /// Risk and color read the rounded `final_rating`, while `rating_category` reads the
    /// unrounded points. Just under a bracket edge the two can land one bracket apart.
    pub fn risk(&self) -> RiskAssessment {
        risk_level(self.final_rating)
    }

    pub fn color(&self) -> &'static str {
        rating_color(self.final_rating)
    }
}

pub(crate) fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
