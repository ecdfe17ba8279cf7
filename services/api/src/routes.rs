use crate::infra::{deserialize_optional_timestamp, AppState};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::{DateTime, Utc};
use roadwatch::error::AppError;
use roadwatch::ratings::{
    ledger_router, Contractor, ContractorDetailView, ContractorId, LedgerImporter,
    LedgerRepository, RatingEngine, RatingService, RatingServiceError,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct LedgerReportRequest {
    pub(crate) contractor_code: String,
    pub(crate) contractor_name: String,
    #[serde(default)]
    pub(crate) contractor_email: Option<String>,
    pub(crate) projects_csv: String,
    pub(crate) complaints_csv: String,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub(crate) now: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LedgerReportResponse {
    pub(crate) evaluated_at: DateTime<Utc>,
    pub(crate) project_count: usize,
    pub(crate) complaint_count: usize,
    pub(crate) detail: ContractorDetailView,
}

pub(crate) fn with_ledger_routes<R>(service: Arc<RatingService<R>>) -> axum::Router
where
    R: LedgerRepository + 'static,
{
    ledger_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/ledger/report",
            axum::routing::post(ledger_report_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Score an uploaded ledger export without touching the service's own ledger.
pub(crate) async fn ledger_report_endpoint(
    Json(payload): Json<LedgerReportRequest>,
) -> Result<Json<LedgerReportResponse>, AppError> {
    let LedgerReportRequest {
        contractor_code,
        contractor_name,
        contractor_email,
        projects_csv,
        complaints_csv,
        now,
    } = payload;

    let contractor = Contractor::new(
        ContractorId(0),
        contractor_code,
        contractor_name,
        contractor_email.unwrap_or_default(),
    );
    let snapshot = LedgerImporter::from_readers(
        contractor,
        Cursor::new(projects_csv.into_bytes()),
        Cursor::new(complaints_csv.into_bytes()),
    )?;

    let evaluated_at = now.unwrap_or_else(Utc::now);
    let result = RatingEngine::default()
        .compute(
            &snapshot.contractor,
            &snapshot.projects,
            &snapshot.complaints,
            evaluated_at,
        )
        .map_err(RatingServiceError::from)?;

    Ok(Json(LedgerReportResponse {
        evaluated_at,
        project_count: snapshot.projects.len(),
        complaint_count: snapshot.complaints.len(),
        detail: ContractorDetailView::new(&snapshot, &result),
    }))
}
