//! Contractor rating ledger: road projects, public complaints, and the warranty-aware scoring
//! engine that turns complaint history into a 0-5 contractor rating with an audit trail.

pub mod domain;
pub mod engine;
pub mod import;
pub mod memory;
pub mod performance;
pub mod repository;
pub mod router;
pub mod service;
mod validation;
pub mod views;

#[cfg(test)]
mod tests;

pub use domain::{
    warranty_end_for, Complaint, ComplaintId, ComplaintStatus, Contractor, ContractorId,
    DamageType, ProjectId, Rating, RatingId, RoadProject, Severity, UnknownLabel,
};
pub use engine::{
    rating_category, rating_color, risk_level, Deduction, RatingCategory, RatingEngine,
    RatingResult, RatingRubric, RiskAssessment, RiskLevel,
};
pub use import::{LedgerImportError, LedgerImporter};
pub use memory::InMemoryLedger;
pub use performance::{
    average_rating, performance_rank, performance_score, rating_distribution, PerformanceRank,
    PerformanceTier, RatingDistribution,
};
pub use repository::{LedgerChange, LedgerRepository, LedgerSnapshot, RepositoryError};
pub use router::ledger_router;
pub use service::{
    ComplaintIntake, ComplaintReceipt, ComplaintStatusUpdate, ContractorRegistration,
    RatingReceipt, RatingService, RatingServiceError, RatingSubmission, RoadRegistration,
};
pub use validation::{validate_rating_value, InputViolation, RatingError};
pub use views::{
    ContractorDetailView, ContractorSummary, DashboardEntry, PerformanceDashboard,
    PerformanceReport, ProjectSummary, RoadDetailView,
};
