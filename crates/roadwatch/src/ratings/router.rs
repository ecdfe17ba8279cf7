use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::domain::{ComplaintId, ContractorId, ProjectId};
use super::repository::{LedgerRepository, RepositoryError};
use super::service::{
    ComplaintIntake, ComplaintStatusUpdate, ContractorRegistration, RatingService,
    RatingServiceError, RatingSubmission, RoadRegistration,
};

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ContractorAssignment {
    pub contractor_id: ContractorId,
}

/// Router builder exposing the contractor ledger and rating endpoints.
pub fn ledger_router<R>(service: Arc<RatingService<R>>) -> Router
where
    R: LedgerRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/contractors",
            get(list_contractors_handler::<R>).post(register_contractor_handler::<R>),
        )
        .route(
            "/api/v1/contractors/:contractor_id",
            get(contractor_detail_handler::<R>),
        )
        .route(
            "/api/v1/contractors/:contractor_id/projects",
            get(contractor_projects_handler::<R>),
        )
        .route(
            "/api/v1/contractors/:contractor_id/recompute",
            post(recompute_handler::<R>),
        )
        .route(
            "/api/v1/contractors/:contractor_id/ratings",
            post(submit_rating_handler::<R>),
        )
        .route(
            "/api/v1/contractors/:contractor_id/performance",
            get(performance_handler::<R>),
        )
        .route(
            "/api/v1/performance/dashboard",
            get(dashboard_handler::<R>),
        )
        .route(
            "/api/v1/roads",
            get(list_roads_handler::<R>).post(register_road_handler::<R>),
        )
        .route("/api/v1/roads/:project_id", get(road_detail_handler::<R>))
        .route(
            "/api/v1/roads/:project_id/complaints",
            get(road_complaints_handler::<R>),
        )
        .route(
            "/api/v1/roads/:project_id/contractor",
            put(assign_contractor_handler::<R>),
        )
        .route("/api/v1/complaints", post(file_complaint_handler::<R>))
        .route(
            "/api/v1/complaints/:complaint_id/status",
            put(complaint_status_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn register_contractor_handler<R>(
    State(service): State<Arc<RatingService<R>>>,
    axum::Json(registration): axum::Json<ContractorRegistration>,
) -> Response
where
    R: LedgerRepository + 'static,
{
    match service.register_contractor(registration) {
        Ok(contractor) => (StatusCode::CREATED, axum::Json(contractor)).into_response(),
        Err(RatingServiceError::Repository(RepositoryError::Conflict)) => {
            let payload = json!({
                "error": "contractor code already registered",
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(other) => error_response(other),
    }
}

pub(crate) async fn list_contractors_handler<R>(
    State(service): State<Arc<RatingService<R>>>,
) -> Response
where
    R: LedgerRepository + 'static,
{
    match service.contractors() {
        Ok(contractors) => {
            let payload = json!({
                "count": contractors.len(),
                "contractors": contractors,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn contractor_projects_handler<R>(
    State(service): State<Arc<RatingService<R>>>,
    Path(contractor_id): Path<u64>,
) -> Response
where
    R: LedgerRepository + 'static,
{
    match service.contractor_projects(ContractorId(contractor_id)) {
        Ok(projects) => {
            let payload = json!({
                "count": projects.len(),
                "projects": projects,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn contractor_detail_handler<R>(
    State(service): State<Arc<RatingService<R>>>,
    Path(contractor_id): Path<u64>,
) -> Response
where
    R: LedgerRepository + 'static,
{
    match service.contractor_detail(ContractorId(contractor_id), Utc::now()) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn recompute_handler<R>(
    State(service): State<Arc<RatingService<R>>>,
    Path(contractor_id): Path<u64>,
) -> Response
where
    R: LedgerRepository + 'static,
{
    match service.recompute(ContractorId(contractor_id), Utc::now()) {
        Ok(result) => {
            let risk = result.risk();
            let payload = json!({
                "contractor_id": contractor_id,
                "final_rating": result.final_rating,
                "rating_category": result.rating_category,
                "rating_color": result.color(),
                "risk_level": risk.level,
                "recommendation": risk.recommendation,
                "total_deduction": result.total_deduction,
                "deductions": result.deductions,
                "timestamp": result.timestamp,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_rating_handler<R>(
    State(service): State<Arc<RatingService<R>>>,
    Path(contractor_id): Path<u64>,
    axum::Json(submission): axum::Json<RatingSubmission>,
) -> Response
where
    R: LedgerRepository + 'static,
{
    match service.submit_rating(ContractorId(contractor_id), submission, Utc::now()) {
        Ok(receipt) => (StatusCode::CREATED, axum::Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn performance_handler<R>(
    State(service): State<Arc<RatingService<R>>>,
    Path(contractor_id): Path<u64>,
) -> Response
where
    R: LedgerRepository + 'static,
{
    match service.performance_report(ContractorId(contractor_id)) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn dashboard_handler<R>(State(service): State<Arc<RatingService<R>>>) -> Response
where
    R: LedgerRepository + 'static,
{
    match service.performance_dashboard() {
        Ok(dashboard) => (StatusCode::OK, axum::Json(dashboard)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn register_road_handler<R>(
    State(service): State<Arc<RatingService<R>>>,
    axum::Json(registration): axum::Json<RoadRegistration>,
) -> Response
where
    R: LedgerRepository + 'static,
{
    match service.register_road(registration, Utc::now()) {
        Ok(project) => (StatusCode::CREATED, axum::Json(project)).into_response(),
        Err(RatingServiceError::Repository(RepositoryError::Conflict)) => {
            let payload = json!({
                "error": "road code already registered",
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(other) => error_response(other),
    }
}

pub(crate) async fn list_roads_handler<R>(State(service): State<Arc<RatingService<R>>>) -> Response
where
    R: LedgerRepository + 'static,
{
    match service.roads() {
        Ok(roads) => {
            let payload = json!({
                "count": roads.len(),
                "roads": roads,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn road_detail_handler<R>(
    State(service): State<Arc<RatingService<R>>>,
    Path(project_id): Path<u64>,
) -> Response
where
    R: LedgerRepository + 'static,
{
    match service.road_detail(ProjectId(project_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn road_complaints_handler<R>(
    State(service): State<Arc<RatingService<R>>>,
    Path(project_id): Path<u64>,
) -> Response
where
    R: LedgerRepository + 'static,
{
    match service.road_complaints(ProjectId(project_id)) {
        Ok(complaints) => {
            let payload = json!({
                "count": complaints.len(),
                "complaints": complaints,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn assign_contractor_handler<R>(
    State(service): State<Arc<RatingService<R>>>,
    Path(project_id): Path<u64>,
    axum::Json(assignment): axum::Json<ContractorAssignment>,
) -> Response
where
    R: LedgerRepository + 'static,
{
    match service.assign_contractor(ProjectId(project_id), assignment.contractor_id, Utc::now()) {
        Ok(project) => (StatusCode::OK, axum::Json(project)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn file_complaint_handler<R>(
    State(service): State<Arc<RatingService<R>>>,
    axum::Json(intake): axum::Json<ComplaintIntake>,
) -> Response
where
    R: LedgerRepository + 'static,
{
    match service.file_complaint(intake, Utc::now()) {
        Ok(receipt) => (StatusCode::CREATED, axum::Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn complaint_status_handler<R>(
    State(service): State<Arc<RatingService<R>>>,
    Path(complaint_id): Path<u64>,
    axum::Json(update): axum::Json<ComplaintStatusUpdate>,
) -> Response
where
    R: LedgerRepository + 'static,
{
    match service.update_complaint_status(ComplaintId(complaint_id), update, Utc::now()) {
        Ok(receipt) => (StatusCode::OK, axum::Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: RatingServiceError) -> Response {
    let status = match &error {
        RatingServiceError::Rating(_) | RatingServiceError::ProjectNotOwned { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        RatingServiceError::UnknownContractor(_)
        | RatingServiceError::UnknownProject(_)
        | RatingServiceError::UnknownComplaint(_)
        | RatingServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        RatingServiceError::Repository(
            RepositoryError::Conflict | RepositoryError::VersionConflict { .. },
        ) => StatusCode::CONFLICT,
        RatingServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
