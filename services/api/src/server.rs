use crate::cli::{LedgerSeedArgs, ServeArgs};
use crate::infra::AppState;
use crate::routes::with_ledger_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use roadwatch::config::AppConfig;
use roadwatch::error::AppError;
use roadwatch::ratings::{
    ContractorRegistration, InMemoryLedger, LedgerImporter, LedgerRepository, RatingEngine,
    RatingService,
};
use roadwatch::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(args: ServeArgs) -> Result<(), AppError> {
    let ServeArgs { host, port, seed } = args;
    let mut config = AppConfig::load()?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let rating_service = Arc::new(RatingService::new(
        Arc::new(InMemoryLedger::default()),
        RatingEngine::default(),
        config.ledger.clone(),
    ));
    seed_ledger(&rating_service, seed)?;

    let app = with_ledger_routes(rating_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        default_warranty_years = config.ledger.default_warranty_years,
        "contractor rating service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Register the seed contractor and import its export when both CSV paths were given.
pub(crate) fn seed_ledger<R>(
    service: &RatingService<R>,
    seed: LedgerSeedArgs,
) -> Result<(), AppError>
where
    R: LedgerRepository + 'static,
{
    let LedgerSeedArgs {
        seed_projects,
        seed_complaints,
        seed_code,
        seed_name,
    } = seed;
    let (Some(projects), Some(complaints)) = (seed_projects, seed_complaints) else {
        return Ok(());
    };

    let contractor = service.register_contractor(ContractorRegistration {
        code: seed_code,
        name: seed_name,
        email: String::new(),
    })?;
    let code = contractor.code.clone();
    let export = LedgerImporter::from_paths(contractor, projects, complaints)?;
    let projects = export.projects.len();
    let result = service.import_ledger(export, Utc::now())?;

    info!(
        %code,
        projects,
        final_rating = result.final_rating,
        category = result.rating_category.label(),
        "ledger seeded from export"
    );
    Ok(())
}
