use std::collections::HashSet;

use super::domain::{Contractor, ContractorId, ProjectId, RoadProject};

pub const MIN_RATING_VALUE: f64 = 1.0;
pub const MAX_RATING_VALUE: f64 = 5.0;

/// Precondition failures raised before any score is computed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RatingError {
    #[error("invalid input: {0}")]
    InvalidInput(InputViolation),
    #[error("rating value {value} is outside 1..=5")]
    OutOfRangeRating { value: f64 },
}

/// Describes why a contractor snapshot cannot be scored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputViolation {
    #[error("project {project} belongs to contractor {owner}, not {contractor}")]
    ForeignProject {
        project: ProjectId,
        owner: ContractorId,
        contractor: ContractorId,
    },
    #[error("project {0} appears more than once")]
    DuplicateProject(ProjectId),
    #[error("project {0} has a warranty end date before its construction date")]
    InvertedWarranty(ProjectId),
}

impl From<InputViolation> for RatingError {
    fn from(value: InputViolation) -> Self {
        Self::InvalidInput(value)
    }
}

pub(crate) fn validate_snapshot(
    contractor: &Contractor,
    projects: &[RoadProject],
) -> Result<(), InputViolation> {
    let mut seen = HashSet::with_capacity(projects.len());

    for project in projects {
        if let Some(owner) = project.contractor_id {
            if owner != contractor.id {
                return Err(InputViolation::ForeignProject {
                    project: project.id,
                    owner,
                    contractor: contractor.id,
                });
            }
        }

        if !seen.insert(project.id) {
            return Err(InputViolation::DuplicateProject(project.id));
        }

        if project
            .warranty_end_date
            .is_some_and(|end| end < project.construction_date)
        {
            return Err(InputViolation::InvertedWarranty(project.id));
        }
    }

    Ok(())
}

/// Accept only finite review values within the 1-5 scale.
pub fn validate_rating_value(value: f64) -> Result<f64, RatingError> {
    if value.is_finite() && (MIN_RATING_VALUE..=MAX_RATING_VALUE).contains(&value) {
        Ok(value)
    } else {
        Err(RatingError::OutOfRangeRating { value })
    }
}
