use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    Complaint, ComplaintId, Contractor, ContractorId, ProjectId, Rating, RatingId, RoadProject,
};
use super::repository::{LedgerChange, LedgerRepository, LedgerSnapshot, RepositoryError};

#[derive(Debug, Default, Clone)]
struct LedgerState {
    contractors: BTreeMap<ContractorId, Contractor>,
    projects: BTreeMap<ProjectId, RoadProject>,
    complaints: BTreeMap<ComplaintId, Complaint>,
    ratings: BTreeMap<RatingId, Rating>,
}

impl LedgerState {
    fn apply(&mut self, change: LedgerChange) -> Result<(), RepositoryError> {
        match change {
            LedgerChange::InsertProject(project) => {
                if self.projects.contains_key(&project.id)
                    || self
                        .projects
                        .values()
                        .any(|existing| existing.road_code == project.road_code)
                {
                    return Err(RepositoryError::Conflict);
                }
                self.projects.insert(project.id, project);
            }
            LedgerChange::UpdateProject(project) => {
                let stored = self
                    .projects
                    .get_mut(&project.id)
                    .ok_or(RepositoryError::NotFound)?;
                *stored = project;
            }
            LedgerChange::InsertComplaint(complaint) => {
                if self.complaints.contains_key(&complaint.id) {
                    return Err(RepositoryError::Conflict);
                }
                if !self.projects.contains_key(&complaint.project_id) {
                    return Err(RepositoryError::NotFound);
                }
                self.complaints.insert(complaint.id, complaint);
            }
            LedgerChange::UpdateComplaint(complaint) => {
                let stored = self
                    .complaints
                    .get_mut(&complaint.id)
                    .ok_or(RepositoryError::NotFound)?;
                *stored = complaint;
            }
            LedgerChange::InsertRating(rating) => {
                if self.ratings.contains_key(&rating.id) {
                    return Err(RepositoryError::Conflict);
                }
                self.ratings.insert(rating.id, rating);
            }
            LedgerChange::UpdateContractor(mut contractor) => {
                let stored = self
                    .contractors
                    .get_mut(&contractor.id)
                    .ok_or(RepositoryError::NotFound)?;
                if stored.version != contractor.version {
                    return Err(RepositoryError::VersionConflict {
                        expected: contractor.version,
                        found: stored.version,
                    });
                }
                contractor.version += 1;
                *stored = contractor;
            }
        }
        Ok(())
    }
}

/// Process-local ledger guarded by a single lock so snapshots are always consistent.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedger {
    fn state(&self) -> Result<MutexGuard<'_, LedgerState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("ledger mutex poisoned".to_string()))
    }
}

impl LedgerRepository for InMemoryLedger {
    fn insert_contractor(&self, contractor: Contractor) -> Result<Contractor, RepositoryError> {
        let mut state = self.state()?;
        if state.contractors.contains_key(&contractor.id)
            || state
                .contractors
                .values()
                .any(|existing| existing.code == contractor.code)
        {
            return Err(RepositoryError::Conflict);
        }
        state.contractors.insert(contractor.id, contractor.clone());
        Ok(contractor)
    }

    fn contractor(&self, id: ContractorId) -> Result<Option<Contractor>, RepositoryError> {
        Ok(self.state()?.contractors.get(&id).cloned())
    }

    fn contractors(&self) -> Result<Vec<Contractor>, RepositoryError> {
        Ok(self.state()?.contractors.values().cloned().collect())
    }

    fn project(&self, id: ProjectId) -> Result<Option<RoadProject>, RepositoryError> {
        Ok(self.state()?.projects.get(&id).cloned())
    }

    fn projects(&self) -> Result<Vec<RoadProject>, RepositoryError> {
        Ok(self.state()?.projects.values().cloned().collect())
    }

    fn complaint(&self, id: ComplaintId) -> Result<Option<Complaint>, RepositoryError> {
        Ok(self.state()?.complaints.get(&id).cloned())
    }

    fn complaints_for_project(&self, id: ProjectId) -> Result<Vec<Complaint>, RepositoryError> {
        Ok(self
            .state()?
            .complaints
            .values()
            .filter(|complaint| complaint.project_id == id)
            .cloned()
            .collect())
    }

    fn ratings_for(&self, id: ContractorId) -> Result<Vec<Rating>, RepositoryError> {
        Ok(self
            .state()?
            .ratings
            .values()
            .filter(|rating| rating.contractor_id == id)
            .cloned()
            .collect())
    }

    fn snapshot(&self, id: ContractorId) -> Result<Option<LedgerSnapshot>, RepositoryError> {
        let state = self.state()?;
        let Some(contractor) = state.contractors.get(&id).cloned() else {
            return Ok(None);
        };

        let projects = state
            .projects
            .values()
            .filter(|project| project.contractor_id == Some(id))
            .cloned()
            .collect::<Vec<_>>();
        let complaints = state
            .complaints
            .values()
            .filter(|complaint| {
                projects
                    .iter()
                    .any(|project| project.id == complaint.project_id)
            })
            .cloned()
            .collect();
        let ratings = state
            .ratings
            .values()
            .filter(|rating| rating.contractor_id == id)
            .cloned()
            .collect();

        Ok(Some(LedgerSnapshot {
            contractor,
            projects,
            complaints,
            ratings,
        }))
    }

    fn commit(&self, changes: Vec<LedgerChange>) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let mut staged = state.clone();
        for change in changes {
            staged.apply(change)?;
        }
        *state = staged;
        Ok(())
    }
}
