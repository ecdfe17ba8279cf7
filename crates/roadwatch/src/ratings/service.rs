use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::domain::{
    Complaint, ComplaintId, ComplaintStatus, Contractor, ContractorId, DamageType, ProjectId,
    Rating, RatingId, RoadProject, Severity,
};
use super::engine::{round_to_hundredths, RatingEngine, RatingResult};
use super::performance::average_rating;
use super::repository::{LedgerChange, LedgerRepository, LedgerSnapshot, RepositoryError};
use super::validation::{validate_rating_value, RatingError};
use super::views::{
    sort_newest_first, ContractorDetailView, DashboardEntry, PerformanceDashboard,
    PerformanceReport, ProjectSummary, RoadDetailView,
};
use crate::config::LedgerConfig;

static CONTRACTOR_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static PROJECT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static COMPLAINT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static RATING_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Attempts made to commit a batch before a version conflict is reported to the caller.
const COMMIT_ATTEMPTS: usize = 3;

fn next_id(sequence: &AtomicU64) -> u64 {
    sequence.fetch_add(1, Ordering::Relaxed)
}

/// Keep `sequence` ahead of an identity assigned elsewhere, such as a ledger export.
fn reserve_past(sequence: &AtomicU64, id: u64) {
    sequence.fetch_max(id.saturating_add(1), Ordering::Relaxed);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractorRegistration {
    pub code: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadRegistration {
    pub road_code: String,
    pub name: String,
    #[serde(default)]
    pub contractor_id: Option<ContractorId>,
    #[serde(default)]
    pub address: Option<String>,
    /// Defaults to the registration instant.
    #[serde(default)]
    pub construction_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completion_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub warranty_period_years: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintIntake {
    pub project_id: ProjectId,
    pub damage_type: DamageType,
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub reporter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintStatusUpdate {
    pub status: ComplaintStatus,
    #[serde(default)]
    pub resolution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSubmission {
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    pub value: f64,
    #[serde(default)]
    pub reviewer: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Complaint as stored, plus the contractor rating persisted as a consequence.
#[derive(Debug, Clone, Serialize)]
pub struct ComplaintReceipt {
    pub complaint: Complaint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_rating: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingReceipt {
    pub rating: Rating,
    pub average_rating: f64,
    pub current_rating: f64,
}

/// Service composing the ledger repository and the rating engine.
///
/// Every write that changes a contractor's history is staged against a fresh snapshot and
/// committed as one batch together with the recomputed rating, so a failed write leaves nothing
/// behind.
pub struct RatingService<R> {
    repository: Arc<R>,
    engine: Arc<RatingEngine>,
    config: LedgerConfig,
}

impl<R> RatingService<R>
where
    R: LedgerRepository + 'static,
{
    pub fn new(repository: Arc<R>, engine: RatingEngine, config: LedgerConfig) -> Self {
        Self {
            repository,
            engine: Arc::new(engine),
            config,
        }
    }

    pub fn engine(&self) -> &RatingEngine {
        &self.engine
    }

    pub fn register_contractor(
        &self,
        registration: ContractorRegistration,
    ) -> Result<Contractor, RatingServiceError> {
        let contractor = Contractor::new(
            ContractorId(next_id(&CONTRACTOR_SEQUENCE)),
            registration.code,
            registration.name,
            registration.email,
        );
        let stored = self.repository.insert_contractor(contractor)?;
        info!(contractor_id = %stored.id, code = %stored.code, "contractor registered");
        Ok(stored)
    }

    pub fn register_road(
        &self,
        registration: RoadRegistration,
        now: DateTime<Utc>,
    ) -> Result<RoadProject, RatingServiceError> {
        if let Some(contractor_id) = registration.contractor_id {
            self.require_contractor(contractor_id)?;
        }

        let warranty_years = registration
            .warranty_period_years
            .unwrap_or(self.config.default_warranty_years);
        let mut project = RoadProject::register(
            ProjectId(next_id(&PROJECT_SEQUENCE)),
            registration.road_code,
            registration.name,
            registration.construction_date.unwrap_or(now),
            warranty_years,
        );
        project.address = registration.address;
        project.completion_date = registration.completion_date;
        project.contractor_id = registration.contractor_id;

        self.commit_with_retry(|| {
            let mut changes = vec![LedgerChange::InsertProject(project.clone())];
            if let Some(contractor_id) = project.contractor_id {
                let mut contractor = self.require_contractor(contractor_id)?;
                contractor.total_projects += 1;
                changes.push(LedgerChange::UpdateContractor(contractor));
            }
            Ok((changes, ()))
        })?;

        info!(project_id = %project.id, road_code = %project.road_code, "road registered");
        Ok(project)
    }

    /// Bind a project to a contractor and rescore both the previous and the new owner.
    pub fn assign_contractor(
        &self,
        project_id: ProjectId,
        contractor_id: ContractorId,
        now: DateTime<Utc>,
    ) -> Result<RoadProject, RatingServiceError> {
        self.commit_with_retry(|| {
            let mut project = self.require_project(project_id)?;
            let previous = project.contractor_id.replace(contractor_id);
            if previous == Some(contractor_id) {
                return Ok((Vec::new(), project));
            }

            let project_complaints = self.repository.complaints_for_project(project_id)?;
            let mut gaining = self.require_snapshot(contractor_id)?;
            gaining.projects.push(project.clone());
            gaining.complaints.extend(project_complaints);
            gaining.contractor.total_projects += 1;

            let mut changes = vec![
                LedgerChange::UpdateProject(project.clone()),
                LedgerChange::UpdateContractor(self.rescore(gaining, now)?.0),
            ];

            if let Some(previous) = previous {
                if let Some(mut losing) = self.repository.snapshot(previous)? {
                    losing.projects.retain(|owned| owned.id != project_id);
                    losing
                        .complaints
                        .retain(|complaint| complaint.project_id != project_id);
                    losing.contractor.total_projects =
                        losing.contractor.total_projects.saturating_sub(1);
                    changes.push(LedgerChange::UpdateContractor(self.rescore(losing, now)?.0));
                }
            }

            Ok((changes, project))
        })
    }

    pub fn file_complaint(
        &self,
        intake: ComplaintIntake,
        now: DateTime<Utc>,
    ) -> Result<ComplaintReceipt, RatingServiceError> {
        let complaint = Complaint {
            id: ComplaintId(next_id(&COMPLAINT_SEQUENCE)),
            project_id: intake.project_id,
            damage_type: intake.damage_type,
            description: intake.description,
            severity: intake.severity,
            status: ComplaintStatus::Open,
            reporter: intake.reporter,
            created_at: now,
            resolved_at: None,
            resolution: None,
        };

        let updated_rating = self.commit_with_retry(|| {
            let project = self.require_project(complaint.project_id)?;
            let mut changes = vec![LedgerChange::InsertComplaint(complaint.clone())];
            let Some(contractor_id) = project.contractor_id else {
                return Ok((changes, None));
            };

            let mut snapshot = self.require_snapshot(contractor_id)?;
            snapshot.complaints.push(complaint.clone());
            snapshot.contractor.total_complaints += 1;
            let (contractor, result) = self.rescore(snapshot, now)?;
            changes.push(LedgerChange::UpdateContractor(contractor));
            Ok((changes, Some(result.final_rating)))
        })?;
        debug!(complaint_id = %complaint.id, project_id = %complaint.project_id, "complaint filed");

        Ok(ComplaintReceipt {
            complaint,
            updated_rating,
        })
    }

    pub fn update_complaint_status(
        &self,
        complaint_id: ComplaintId,
        update: ComplaintStatusUpdate,
        now: DateTime<Utc>,
    ) -> Result<ComplaintReceipt, RatingServiceError> {
        self.commit_with_retry(|| {
            let mut complaint = self
                .repository
                .complaint(complaint_id)?
                .ok_or(RatingServiceError::UnknownComplaint(complaint_id))?;
            complaint.status = update.status;
            if update.status == ComplaintStatus::Resolved {
                complaint.resolved_at = Some(now);
                complaint.resolution = update.resolution.clone();
            }

            let mut changes = vec![LedgerChange::UpdateComplaint(complaint.clone())];
            let project = self.require_project(complaint.project_id)?;
            let updated_rating = match project.contractor_id {
                Some(contractor_id) => {
                    let mut snapshot = self.require_snapshot(contractor_id)?;
                    for stored in &mut snapshot.complaints {
                        if stored.id == complaint.id {
                            *stored = complaint.clone();
                        }
                    }
                    let (contractor, result) = self.rescore(snapshot, now)?;
                    changes.push(LedgerChange::UpdateContractor(contractor));
                    Some(result.final_rating)
                }
                None => None,
            };

            Ok((
                changes,
                ComplaintReceipt {
                    complaint,
                    updated_rating,
                },
            ))
        })
    }

    /// Store a review for `contractor_id`, optionally tied to one of its own projects.
    pub fn submit_rating(
        &self,
        contractor_id: ContractorId,
        submission: RatingSubmission,
        now: DateTime<Utc>,
    ) -> Result<RatingReceipt, RatingServiceError> {
        let value = validate_rating_value(submission.value)?;
        let rating = Rating {
            id: RatingId(next_id(&RATING_SEQUENCE)),
            contractor_id,
            project_id: submission.project_id,
            value,
            reviewer: submission.reviewer,
            comment: submission.comment,
            created_at: now,
        };

        self.commit_with_retry(|| {
            let mut snapshot = self.require_snapshot(contractor_id)?;
            if let Some(project_id) = rating.project_id {
                let project = self.require_project(project_id)?;
                if project.contractor_id != Some(contractor_id) {
                    return Err(RatingServiceError::ProjectNotOwned {
                        project: project_id,
                        contractor: contractor_id,
                    });
                }
            }

            snapshot.ratings.push(rating.clone());
            let average = average_rating(&snapshot.ratings)?.unwrap_or(value);
            let (contractor, result) = self.rescore(snapshot, now)?;

            Ok((
                vec![
                    LedgerChange::InsertRating(rating.clone()),
                    LedgerChange::UpdateContractor(contractor),
                ],
                RatingReceipt {
                    rating: rating.clone(),
                    average_rating: round_to_hundredths(average),
                    current_rating: result.final_rating,
                },
            ))
        })
    }

    /// Load the projects and complaints of an imported export into the ledger of the
    /// already registered `export.contractor`, then persist the resulting rating.
    pub fn import_ledger(
        &self,
        export: LedgerSnapshot,
        now: DateTime<Utc>,
    ) -> Result<RatingResult, RatingServiceError> {
        let contractor_id = export.contractor.id;
        for project in &export.projects {
            reserve_past(&PROJECT_SEQUENCE, project.id.0);
        }
        for complaint in &export.complaints {
            reserve_past(&COMPLAINT_SEQUENCE, complaint.id.0);
        }

        let result = self.commit_with_retry(|| {
            let mut staged = self.require_snapshot(contractor_id)?;
            staged.projects.extend(export.projects.iter().cloned());
            staged.complaints.extend(export.complaints.iter().cloned());
            staged.contractor.total_projects += export.projects.len() as u32;
            staged.contractor.total_complaints += export.complaints.len() as u32;
            let (contractor, result) = self.rescore(staged, now)?;

            let mut changes = export
                .projects
                .iter()
                .cloned()
                .map(LedgerChange::InsertProject)
                .chain(
                    export
                        .complaints
                        .iter()
                        .cloned()
                        .map(LedgerChange::InsertComplaint),
                )
                .collect::<Vec<_>>();
            changes.push(LedgerChange::UpdateContractor(contractor));
            Ok((changes, result))
        })?;

        info!(
            contractor_id = %contractor_id,
            projects = export.projects.len(),
            complaints = export.complaints.len(),
            final_rating = result.final_rating,
            "ledger export imported"
        );
        Ok(result)
    }

    /// Score the contractor from a fresh snapshot and persist the rating.
    ///
    /// The write carries the snapshot's version. A concurrent writer that got there first
    /// forces a retry from a new snapshot, and after [`COMMIT_ATTEMPTS`] the call fails with
    /// [`RepositoryError::VersionConflict`] instead of losing an update.
    pub fn recompute(
        &self,
        contractor_id: ContractorId,
        now: DateTime<Utc>,
    ) -> Result<RatingResult, RatingServiceError> {
        let result = self.commit_with_retry(|| {
            let snapshot = self.require_snapshot(contractor_id)?;
            let (contractor, result) = self.rescore(snapshot, now)?;
            Ok((vec![LedgerChange::UpdateContractor(contractor)], result))
        })?;

        info!(
            contractor_id = %contractor_id,
            final_rating = result.final_rating,
            category = result.rating_category.label(),
            deductions = result.deductions.len(),
            "contractor rating recomputed"
        );
        Ok(result)
    }

    /// Compute the current rating for display without persisting it.
    pub fn contractor_detail(
        &self,
        contractor_id: ContractorId,
        now: DateTime<Utc>,
    ) -> Result<ContractorDetailView, RatingServiceError> {
        let snapshot = self.require_snapshot(contractor_id)?;
        let result = self.score(&snapshot, now)?;
        Ok(ContractorDetailView::new(&snapshot, &result))
    }

    pub fn contractors(&self) -> Result<Vec<Contractor>, RatingServiceError> {
        Ok(self.repository.contractors()?)
    }

    pub fn contractor_projects(
        &self,
        contractor_id: ContractorId,
    ) -> Result<Vec<ProjectSummary>, RatingServiceError> {
        let snapshot = self.require_snapshot(contractor_id)?;
        Ok(snapshot
            .projects
            .iter()
            .map(|project| ProjectSummary {
                project: project.clone(),
                complaint_count: snapshot.complaints_for(project.id),
            })
            .collect())
    }

    pub fn roads(&self) -> Result<Vec<RoadProject>, RatingServiceError> {
        Ok(self.repository.projects()?)
    }

    pub fn road_detail(&self, project_id: ProjectId) -> Result<RoadDetailView, RatingServiceError> {
        let project = self.require_project(project_id)?;
        let contractor = match project.contractor_id {
            Some(contractor_id) => self.repository.contractor(contractor_id)?,
            None => None,
        };
        let complaints = self.repository.complaints_for_project(project_id)?;
        Ok(RoadDetailView::new(project, contractor.as_ref(), complaints))
    }

    /// Complaints filed against a road, newest first.
    pub fn road_complaints(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Complaint>, RatingServiceError> {
        self.require_project(project_id)?;
        let mut complaints = self.repository.complaints_for_project(project_id)?;
        sort_newest_first(&mut complaints);
        Ok(complaints)
    }

    pub fn performance_report(
        &self,
        contractor_id: ContractorId,
    ) -> Result<PerformanceReport, RatingServiceError> {
        let snapshot = self.require_snapshot(contractor_id)?;
        Ok(PerformanceReport::new(&snapshot)?)
    }

    pub fn performance_dashboard(&self) -> Result<PerformanceDashboard, RatingServiceError> {
        let mut entries = Vec::new();
        for contractor in self.repository.contractors()? {
            let ratings = self.repository.ratings_for(contractor.id)?;
            entries.push(DashboardEntry::new(&contractor, &ratings)?);
        }
        Ok(PerformanceDashboard::from_entries(entries))
    }

    /// Stage a batch with `stage` and commit it, restaging from fresh reads when another
    /// writer bumped a contractor version in between.
    fn commit_with_retry<T, F>(&self, mut stage: F) -> Result<T, RatingServiceError>
    where
        F: FnMut() -> Result<(Vec<LedgerChange>, T), RatingServiceError>,
    {
        let mut attempt = 1;
        loop {
            let (changes, outcome) = stage()?;
            if changes.is_empty() {
                return Ok(outcome);
            }
            match self.repository.commit(changes) {
                Ok(()) => return Ok(outcome),
                Err(RepositoryError::VersionConflict { expected, found })
                    if attempt < COMMIT_ATTEMPTS =>
                {
                    warn!(attempt, expected, found, "ledger write raced another writer, restaging");
                    attempt += 1;
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// Score a staged snapshot and return its contractor row carrying the new rating.
    fn rescore(
        &self,
        snapshot: LedgerSnapshot,
        now: DateTime<Utc>,
    ) -> Result<(Contractor, RatingResult), RatingServiceError> {
        let result = self.score(&snapshot, now)?;
        let mut contractor = snapshot.contractor;
        contractor.current_rating = result.final_rating;
        Ok((contractor, result))
    }

    fn score(
        &self,
        snapshot: &LedgerSnapshot,
        now: DateTime<Utc>,
    ) -> Result<RatingResult, RatingError> {
        self.engine.compute(
            &snapshot.contractor,
            &snapshot.projects,
            &snapshot.complaints,
            now,
        )
    }

    fn require_snapshot(
        &self,
        contractor_id: ContractorId,
    ) -> Result<LedgerSnapshot, RatingServiceError> {
        self.repository
            .snapshot(contractor_id)?
            .ok_or(RatingServiceError::UnknownContractor(contractor_id))
    }

    fn require_contractor(
        &self,
        contractor_id: ContractorId,
    ) -> Result<Contractor, RatingServiceError> {
        self.repository
            .contractor(contractor_id)?
            .ok_or(RatingServiceError::UnknownContractor(contractor_id))
    }

    fn require_project(&self, project_id: ProjectId) -> Result<RoadProject, RatingServiceError> {
        self.repository
            .project(project_id)?
            .ok_or(RatingServiceError::UnknownProject(project_id))
    }
}

/// Error raised by the rating service.
#[derive(Debug, thiserror::Error)]
pub enum RatingServiceError {
    #[error(transparent)]
    Rating(#[from] RatingError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("contractor {0} not found")]
    UnknownContractor(ContractorId),
    #[error("road project {0} not found")]
    UnknownProject(ProjectId),
    #[error("complaint {0} not found")]
    UnknownComplaint(ComplaintId),
    #[error("road project {project} is not assigned to contractor {contractor}")]
    ProjectNotOwned {
        project: ProjectId,
        contractor: ContractorId,
    },
}
