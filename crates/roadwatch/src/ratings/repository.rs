use serde::{Deserialize, Serialize};

use super::domain::{
    Complaint, ComplaintId, ComplaintStatus, Contractor, ContractorId, ProjectId, Rating,
    RoadProject,
};

/// Consistent read of everything the rating engine needs for one contractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub contractor: Contractor,
    pub projects: Vec<RoadProject>,
    /// Complaints filed against `projects`, in filing order.
    pub complaints: Vec<Complaint>,
    pub ratings: Vec<Rating>,
}

impl LedgerSnapshot {
    pub fn resolved_complaints(&self) -> usize {
        self.complaints
            .iter()
            .filter(|complaint| complaint.status == ComplaintStatus::Resolved)
            .count()
    }

    pub fn pending_complaints(&self) -> usize {
        self.complaints
            .iter()
            .filter(|complaint| complaint.status.is_unresolved())
            .count()
    }

    pub fn complaints_for(&self, project_id: ProjectId) -> usize {
        self.complaints
            .iter()
            .filter(|complaint| complaint.project_id == project_id)
            .count()
    }
}

/// One record-level write inside a [`LedgerRepository::commit`] batch.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerChange {
    InsertProject(RoadProject),
    UpdateProject(RoadProject),
    InsertComplaint(Complaint),
    UpdateComplaint(Complaint),
    InsertRating(Rating),
    /// Version-checked; the stored version is bumped on success.
    UpdateContractor(Contractor),
}

/// Storage abstraction so the rating service can be exercised in isolation.
///
/// `commit` is the only write path after registration. A batch is applied all or nothing:
/// when any change fails (a stale contractor version, a duplicate, a missing row) the store
/// is left exactly as it was.
pub trait LedgerRepository: Send + Sync {
    fn insert_contractor(&self, contractor: Contractor) -> Result<Contractor, RepositoryError>;
    fn contractor(&self, id: ContractorId) -> Result<Option<Contractor>, RepositoryError>;
    fn contractors(&self) -> Result<Vec<Contractor>, RepositoryError>;

    fn project(&self, id: ProjectId) -> Result<Option<RoadProject>, RepositoryError>;
    fn projects(&self) -> Result<Vec<RoadProject>, RepositoryError>;

    fn complaint(&self, id: ComplaintId) -> Result<Option<Complaint>, RepositoryError>;
    fn complaints_for_project(&self, id: ProjectId) -> Result<Vec<Complaint>, RepositoryError>;

    fn ratings_for(&self, id: ContractorId) -> Result<Vec<Rating>, RepositoryError>;

    fn snapshot(&self, id: ContractorId) -> Result<Option<LedgerSnapshot>, RepositoryError>;

    fn commit(&self, changes: Vec<LedgerChange>) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("stale write: expected version {expected}, stored version is {found}")]
    VersionConflict { expected: u64, found: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
