use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::config::LedgerConfig;
use crate::ratings::domain::{
    Complaint, ComplaintId, ComplaintStatus, Contractor, ContractorId, DamageType, ProjectId,
    Rating, RatingId, RoadProject, Severity,
};
use crate::ratings::memory::InMemoryLedger;
use crate::ratings::repository::{
    LedgerChange, LedgerRepository, LedgerSnapshot, RepositoryError,
};
use crate::ratings::service::{ContractorRegistration, RoadRegistration};
use crate::ratings::{ledger_router, RatingEngine, RatingService};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn contractor() -> Contractor {
    Contractor::new(
        ContractorId(1),
        "CON-001".to_string(),
        "Deccan Infra Works".to_string(),
        "ops@deccan-infra.example".to_string(),
    )
}

/// Project built two years before [`now`] with a ten year warranty.
pub(super) fn warranty_project(id: u64) -> RoadProject {
    RoadProject::register(
        ProjectId(id),
        format!("ROAD-{id:04}"),
        format!("Ring Road Phase {id}"),
        now() - Duration::days(730),
        10,
    )
    .with_contractor(ContractorId(1))
}

/// Project whose one-year warranty lapsed long before [`now`].
pub(super) fn expired_project(id: u64) -> RoadProject {
    RoadProject::register(
        ProjectId(id),
        format!("ROAD-{id:04}"),
        format!("Old Market Street {id}"),
        now() - Duration::days(3 * 365),
        1,
    )
    .with_contractor(ContractorId(1))
}

pub(super) fn complaint(
    id: u64,
    project: &RoadProject,
    severity: Severity,
    status: ComplaintStatus,
    created_at: DateTime<Utc>,
) -> Complaint {
    Complaint {
        id: ComplaintId(id),
        project_id: project.id,
        damage_type: DamageType::Pothole,
        description: "Pothole near the bus stop".to_string(),
        severity,
        status,
        reporter: Some("resident".to_string()),
        created_at,
        resolved_at: None,
        resolution: None,
    }
}

pub(super) fn rating(id: u64, value: f64, created_at: DateTime<Utc>) -> Rating {
    Rating {
        id: RatingId(id),
        contractor_id: ContractorId(1),
        project_id: None,
        value,
        reviewer: Some("inspector".to_string()),
        comment: None,
        created_at,
    }
}

pub(super) fn snapshot(
    projects: Vec<RoadProject>,
    complaints: Vec<Complaint>,
    ratings: Vec<Rating>,
) -> LedgerSnapshot {
    LedgerSnapshot {
        contractor: contractor(),
        projects,
        complaints,
        ratings,
    }
}

pub(super) fn registration(code: &str) -> ContractorRegistration {
    ContractorRegistration {
        code: code.to_string(),
        name: format!("{code} Constructions"),
        email: format!("{}@roads.example", code.to_ascii_lowercase()),
    }
}

pub(super) fn road(road_code: &str, contractor_id: Option<ContractorId>) -> RoadRegistration {
    RoadRegistration {
        road_code: road_code.to_string(),
        name: format!("{road_code} Arterial"),
        contractor_id,
        address: Some("Ward 12".to_string()),
        construction_date: Some(now() - Duration::days(400)),
        completion_date: Some(now() - Duration::days(380)),
        warranty_period_years: None,
    }
}

pub(super) fn build_service() -> (RatingService<InMemoryLedger>, Arc<InMemoryLedger>) {
    let ledger = Arc::new(InMemoryLedger::default());
    let service = RatingService::new(
        ledger.clone(),
        RatingEngine::default(),
        LedgerConfig::default(),
    );
    (service, ledger)
}

pub(super) fn ledger_router_with_service(service: RatingService<InMemoryLedger>) -> axum::Router {
    ledger_router(Arc::new(service))
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn assert_status(response: &Response, status: StatusCode) {
    assert_eq!(response.status(), status);
}

pub(super) struct UnavailableRepository;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl LedgerRepository for UnavailableRepository {
    fn insert_contractor(&self, _contractor: Contractor) -> Result<Contractor, RepositoryError> {
        offline()
    }

    fn contractor(&self, _id: ContractorId) -> Result<Option<Contractor>, RepositoryError> {
        offline()
    }

    fn contractors(&self) -> Result<Vec<Contractor>, RepositoryError> {
        offline()
    }

    fn project(&self, _id: ProjectId) -> Result<Option<RoadProject>, RepositoryError> {
        offline()
    }

    fn projects(&self) -> Result<Vec<RoadProject>, RepositoryError> {
        offline()
    }

    fn complaint(&self, _id: ComplaintId) -> Result<Option<Complaint>, RepositoryError> {
        offline()
    }

    fn complaints_for_project(&self, _id: ProjectId) -> Result<Vec<Complaint>, RepositoryError> {
        offline()
    }

    fn ratings_for(&self, _id: ContractorId) -> Result<Vec<Rating>, RepositoryError> {
        offline()
    }

    fn snapshot(&self, _id: ContractorId) -> Result<Option<LedgerSnapshot>, RepositoryError> {
        offline()
    }

    fn commit(&self, _changes: Vec<LedgerChange>) -> Result<(), RepositoryError> {
        offline()
    }
}

/// Delegates to an in-memory ledger but bumps the stored version behind the service's back
/// whenever a snapshot is taken, simulating a concurrent writer that always wins.
pub(super) struct RacingLedger {
    pub(super) inner: InMemoryLedger,
}

impl LedgerRepository for RacingLedger {
    fn insert_contractor(&self, contractor: Contractor) -> Result<Contractor, RepositoryError> {
        self.inner.insert_contractor(contractor)
    }

    fn contractor(&self, id: ContractorId) -> Result<Option<Contractor>, RepositoryError> {
        self.inner.contractor(id)
    }

    fn contractors(&self) -> Result<Vec<Contractor>, RepositoryError> {
        self.inner.contractors()
    }

    fn project(&self, id: ProjectId) -> Result<Option<RoadProject>, RepositoryError> {
        self.inner.project(id)
    }

    fn projects(&self) -> Result<Vec<RoadProject>, RepositoryError> {
        self.inner.projects()
    }

    fn complaint(&self, id: ComplaintId) -> Result<Option<Complaint>, RepositoryError> {
        self.inner.complaint(id)
    }

    fn complaints_for_project(&self, id: ProjectId) -> Result<Vec<Complaint>, RepositoryError> {
        self.inner.complaints_for_project(id)
    }

    fn ratings_for(&self, id: ContractorId) -> Result<Vec<Rating>, RepositoryError> {
        self.inner.ratings_for(id)
    }

    fn snapshot(&self, id: ContractorId) -> Result<Option<LedgerSnapshot>, RepositoryError> {
        let snapshot = self.inner.snapshot(id)?;
        if let Some(contractor) = self.inner.contractor(id)? {
            self.inner
                .commit(vec![LedgerChange::UpdateContractor(contractor)])?;
        }
        Ok(snapshot)
    }

    fn commit(&self, changes: Vec<LedgerChange>) -> Result<(), RepositoryError> {
        self.inner.commit(changes)
    }
}

pub(super) fn racing_service() -> (RatingService<RacingLedger>, Arc<RacingLedger>) {
    let ledger = Arc::new(RacingLedger {
        inner: InMemoryLedger::default(),
    });
    let service = RatingService::new(
        ledger.clone(),
        RatingEngine::default(),
        LedgerConfig::default(),
    );
    (service, ledger)
}
