use crate::infra::parse_timestamp;
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use roadwatch::config::LedgerConfig;
use roadwatch::error::AppError;
use roadwatch::ratings::{
    ComplaintIntake, ComplaintStatus, ComplaintStatusUpdate, Contractor, ContractorDetailView,
    ContractorId, ContractorRegistration, DamageType, InMemoryLedger, LedgerImporter,
    PerformanceDashboard, ProjectId, RatingEngine, RatingService, RatingServiceError,
    RatingSubmission, RoadRegistration, Severity,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ContractorReportArgs {
    /// Road project export (Project ID, Road ID, Road Name, Construction Date, Warranty Years)
    #[arg(long)]
    pub(crate) projects: PathBuf,
    /// Complaint export (Complaint ID, Project ID, Severity, Status, Created At)
    #[arg(long)]
    pub(crate) complaints: PathBuf,
    /// Contractor code printed in the report header
    #[arg(long, default_value = "CON-0001")]
    pub(crate) code: String,
    /// Contractor display name
    #[arg(long, default_value = "Unnamed contractor")]
    pub(crate) name: String,
    /// Evaluation instant (YYYY-MM-DD or RFC 3339). Defaults to now.
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Print the detail view as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluation instant (YYYY-MM-DD or RFC 3339). Defaults to now.
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Skip the performance dashboard portion of the demo.
    #[arg(long)]
    pub(crate) skip_dashboard: bool,
}

pub(crate) fn run_contractor_report(args: ContractorReportArgs) -> Result<(), AppError> {
    let ContractorReportArgs {
        projects,
        complaints,
        code,
        name,
        now,
        json,
    } = args;

    let now = now.unwrap_or_else(Utc::now);
    let contractor = Contractor::new(ContractorId(0), code, name, String::new());
    let snapshot = LedgerImporter::from_paths(contractor, projects, complaints)?;
    let result = RatingEngine::default()
        .compute(
            &snapshot.contractor,
            &snapshot.projects,
            &snapshot.complaints,
            now,
        )
        .map_err(RatingServiceError::from)?;
    let detail = ContractorDetailView::new(&snapshot, &result);

    if json {
        match serde_json::to_string_pretty(&detail) {
            Ok(payload) => println!("{payload}"),
            Err(err) => println!("Detail payload unavailable: {err}"),
        }
    } else {
        render_detail(&detail);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        now,
        skip_dashboard,
    } = args;
    let now = now.unwrap_or_else(Utc::now);

    println!("Contractor rating demo (evaluated {})", now.format("%Y-%m-%d %H:%M UTC"));
    let service = RatingService::new(
        Arc::new(InMemoryLedger::default()),
        RatingEngine::default(),
        LedgerConfig::default(),
    );

    let (reliable, reliable_road) =
        seed_contractor(&service, "CON-0101", "Konkan Highways", now, &[])?;
    let (troubled, troubled_road) = seed_contractor(
        &service,
        "CON-0102",
        "Vidarbha Paving Co",
        now,
        &[
            (Severity::High, DamageType::Pothole, 2),
            (Severity::Critical, DamageType::Crack, 12),
            (Severity::Medium, DamageType::Flooding, 45),
        ],
    )?;

    for (contractor_id, project_id, value) in [
        (reliable, reliable_road, 4.6),
        (reliable, reliable_road, 4.2),
        (troubled, troubled_road, 2.5),
    ] {
        service.submit_rating(
            contractor_id,
            RatingSubmission {
                project_id: Some(project_id),
                value,
                reviewer: Some("district engineer".to_string()),
                comment: None,
            },
            now,
        )?;
    }

    for contractor_id in [reliable, troubled] {
        let detail = service.contractor_detail(contractor_id, now)?;
        println!();
        render_detail(&detail);
    }

    if skip_dashboard {
        return Ok(());
    }

    let dashboard = service.performance_dashboard()?;
    render_dashboard(&dashboard);
    Ok(())
}

fn seed_contractor(
    service: &RatingService<InMemoryLedger>,
    code: &str,
    name: &str,
    now: DateTime<Utc>,
    complaints: &[(Severity, DamageType, i64)],
) -> Result<(ContractorId, ProjectId), AppError> {
    let contractor = service.register_contractor(ContractorRegistration {
        code: code.to_string(),
        name: name.to_string(),
        email: format!("{}@roads.example", code.to_ascii_lowercase()),
    })?;
    let project = service.register_road(
        RoadRegistration {
            road_code: format!("{code}-R1"),
            name: format!("{name} Corridor"),
            contractor_id: Some(contractor.id),
            address: None,
            construction_date: Some(now - Duration::days(540)),
            completion_date: Some(now - Duration::days(500)),
            warranty_period_years: None,
        },
        now,
    )?;

    for (severity, damage_type, age_days) in complaints {
        let receipt = service.file_complaint(
            ComplaintIntake {
                project_id: project.id,
                damage_type: *damage_type,
                description: format!("{} reported by residents", damage_type.label()),
                severity: *severity,
                reporter: None,
            },
            now - Duration::days(*age_days),
        )?;
        if *age_days > 30 {
            service.update_complaint_status(
                receipt.complaint.id,
                ComplaintStatusUpdate {
                    status: ComplaintStatus::Resolved,
                    resolution: Some("Repaired under warranty".to_string()),
                },
                now,
            )?;
        }
    }

    service.recompute(contractor.id, now)?;
    Ok((contractor.id, project.id))
}

fn render_detail(detail: &ContractorDetailView) {
    println!("{} ({})", detail.name, detail.code);
    println!(
        "- Rating {:.2} / 5.00 -> {} [{}]",
        detail.current_rating,
        detail.rating_category.label(),
        detail.rating_color
    );
    println!(
        "- Risk {} -> {}",
        detail.risk_level.label(),
        detail.recommendation
    );
    println!(
        "- {} projects | {} complaints ({} resolved, {} pending)",
        detail.total_projects,
        detail.total_complaints,
        detail.resolved_complaints,
        detail.pending_complaints
    );

    if detail.deductions.is_empty() {
        println!("- Deductions: none");
    } else {
        println!("- Deductions (total {:.2}):", detail.total_deduction);
        for deduction in &detail.deductions {
            println!("    - {:.2} {}", deduction.deduction, deduction.reason);
        }
    }
}

fn render_dashboard(dashboard: &PerformanceDashboard) {
    println!(
        "\nPerformance dashboard ({} contractors)",
        dashboard.total_contractors
    );
    for entry in &dashboard.all_contractors {
        println!(
            "- {} {}: score {:.2} | avg review {:.2} | {} complaints | tier {:?}",
            entry.code,
            entry.name,
            entry.performance_score,
            entry.average_rating,
            entry.total_complaints,
            entry.tier
        );
    }
    println!(
        "Top: {} | Average: {} | Bottom: {}",
        dashboard.top_performers.len(),
        dashboard.average_performers.len(),
        dashboard.bottom_performers.len()
    );
}
