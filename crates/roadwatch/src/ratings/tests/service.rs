use super::common::*;
use chrono::Duration;
use std::sync::Arc;

use crate::config::LedgerConfig;
use crate::ratings::domain::{
    ComplaintId, ComplaintStatus, ContractorId, DamageType, ProjectId, Severity,
};
use crate::ratings::memory::InMemoryLedger;
use crate::ratings::repository::{LedgerChange, LedgerRepository, RepositoryError};
use crate::ratings::service::{
    ComplaintIntake, ComplaintStatusUpdate, RatingServiceError, RatingSubmission,
};
use crate::ratings::{LedgerImporter, RatingCategory, RatingEngine, RatingError, RatingService};

fn intake(project_id: ProjectId, severity: Severity) -> ComplaintIntake {
    ComplaintIntake {
        project_id,
        damage_type: DamageType::Crack,
        description: "Longitudinal crack across both lanes".to_string(),
        severity,
        reporter: None,
    }
}

#[test]
fn register_road_derives_warranty_and_counts_project() {
    let (service, ledger) = build_service();
    let contractor = service
        .register_contractor(registration("CON-100"))
        .expect("contractor registered");

    let project = service
        .register_road(road("NH-44", Some(contractor.id)), now())
        .expect("road registered");

    assert_eq!(project.contractor_id, Some(contractor.id));
    assert_eq!(project.warranty_period_years, 10);
    assert_eq!(
        project.warranty_end_date,
        Some(project.construction_date + Duration::days(3650))
    );

    let stored = ledger
        .contractor(contractor.id)
        .expect("lookup")
        .expect("present");
    assert_eq!(stored.total_projects, 1);
    assert_eq!(stored.version, contractor.version + 1);
}

#[test]
fn register_road_uses_configured_default_warranty() {
    let ledger = Arc::new(InMemoryLedger::default());
    let service = RatingService::new(
        ledger,
        RatingEngine::default(),
        LedgerConfig {
            default_warranty_years: 3,
        },
    );

    let mut registration = road("SH-7", None);
    registration.construction_date = None;
    let project = service.register_road(registration, now()).expect("road registered");

    assert_eq!(project.construction_date, now());
    assert_eq!(project.contractor_id, None);
    assert_eq!(
        project.warranty_end_date,
        Some(now() + Duration::days(3 * 365))
    );
}

#[test]
fn register_road_rejects_unknown_contractor() {
    let (service, _) = build_service();

    let error = service
        .register_road(road("NH-48", Some(ContractorId(u64::MAX))), now())
        .expect_err("unknown contractor");

    assert!(matches!(error, RatingServiceError::UnknownContractor(_)));
}

#[test]
fn filing_complaints_recomputes_and_persists_the_rating() {
    let (service, ledger) = build_service();
    let contractor = service
        .register_contractor(registration("CON-200"))
        .expect("contractor registered");
    let project = service
        .register_road(road("NH-16", Some(contractor.id)), now())
        .expect("road registered");

    let receipt = service
        .file_complaint(intake(project.id, Severity::High), now())
        .expect("complaint filed");

    assert_eq!(receipt.complaint.status, ComplaintStatus::Open);
    assert_eq!(receipt.complaint.created_at, now());
    // 0.3 count + 0.7 severity + 0.2 unresolved + 0.15 recent
    let updated = receipt.updated_rating.expect("rating recomputed");
    assert_close(updated, 3.65);

    let stored = ledger
        .contractor(contractor.id)
        .expect("lookup")
        .expect("present");
    assert_eq!(stored.total_complaints, 1);
    assert_close(stored.current_rating, 3.65);
}

#[test]
fn complaints_against_unassigned_roads_skip_scoring() {
    let (service, _) = build_service();
    let project = service
        .register_road(road("MDR-3", None), now())
        .expect("road registered");

    let receipt = service
        .file_complaint(intake(project.id, Severity::Low), now())
        .expect("complaint filed");

    assert!(receipt.updated_rating.is_none());
}

#[test]
fn resolving_a_complaint_stamps_resolution_and_restores_points() {
    let (service, ledger) = build_service();
    let contractor = service
        .register_contractor(registration("CON-300"))
        .expect("contractor registered");
    let project = service
        .register_road(road("NH-66", Some(contractor.id)), now())
        .expect("road registered");
    let filed = service
        .file_complaint(intake(project.id, Severity::Medium), now())
        .expect("complaint filed");

    let resolved_at = now() + Duration::days(2);
    let receipt = service
        .update_complaint_status(
            filed.complaint.id,
            ComplaintStatusUpdate {
                status: ComplaintStatus::Resolved,
                resolution: Some("Resurfaced".to_string()),
            },
            resolved_at,
        )
        .expect("status updated");

    assert_eq!(receipt.complaint.resolved_at, Some(resolved_at));
    assert_eq!(receipt.complaint.resolution.as_deref(), Some("Resurfaced"));
    let before = filed.updated_rating.expect("scored on intake");
    let after = receipt.updated_rating.expect("scored on resolution");
    assert_close(after - before, 0.2);

    let stored = ledger
        .complaint(filed.complaint.id)
        .expect("lookup")
        .expect("present");
    assert_eq!(stored.status, ComplaintStatus::Resolved);
}

#[test]
fn review_status_leaves_resolution_unset() {
    let (service, _) = build_service();
    let contractor = service
        .register_contractor(registration("CON-310"))
        .expect("contractor registered");
    let project = service
        .register_road(road("NH-67", Some(contractor.id)), now())
        .expect("road registered");
    let filed = service
        .file_complaint(intake(project.id, Severity::Medium), now())
        .expect("complaint filed");

    let receipt = service
        .update_complaint_status(
            filed.complaint.id,
            ComplaintStatusUpdate {
                status: ComplaintStatus::UnderReview,
                resolution: Some("ignored".to_string()),
            },
            now(),
        )
        .expect("status updated");

    assert!(receipt.complaint.resolved_at.is_none());
    assert!(receipt.complaint.resolution.is_none());
    assert_close(
        receipt.updated_rating.expect("scored"),
        filed.updated_rating.expect("scored"),
    );
}

#[test]
fn unknown_complaint_status_update_is_reported() {
    let (service, _) = build_service();

    let error = service
        .update_complaint_status(
            ComplaintId(u64::MAX),
            ComplaintStatusUpdate {
                status: ComplaintStatus::Rejected,
                resolution: None,
            },
            now(),
        )
        .expect_err("missing complaint");

    assert!(matches!(error, RatingServiceError::UnknownComplaint(_)));
}

#[test]
fn submit_rating_validates_scale_and_reports_average() {
    let (service, ledger) = build_service();
    let contractor = service
        .register_contractor(registration("CON-400"))
        .expect("contractor registered");
    let project = service
        .register_road(road("NH-2", Some(contractor.id)), now())
        .expect("road registered");

    let rejected = service
        .submit_rating(
            contractor.id,
            RatingSubmission {
                project_id: Some(project.id),
                value: 5.5,
                reviewer: None,
                comment: None,
            },
            now(),
        )
        .expect_err("out of range");
    assert!(matches!(
        rejected,
        RatingServiceError::Rating(RatingError::OutOfRangeRating { .. })
    ));

    for value in [4.0, 3.0] {
        service
            .submit_rating(
                contractor.id,
                RatingSubmission {
                    project_id: Some(project.id),
                    value,
                    reviewer: Some("ward engineer".to_string()),
                    comment: None,
                },
                now(),
            )
            .expect("rating stored");
    }
    let receipt = service
        .submit_rating(
            contractor.id,
            RatingSubmission {
                project_id: Some(project.id),
                value: 5.0,
                reviewer: None,
                comment: Some("Smooth surface".to_string()),
            },
            now(),
        )
        .expect("rating stored");

    assert_close(receipt.average_rating, 4.0);
    assert_close(receipt.current_rating, 5.0);
    assert_eq!(ledger.ratings_for(contractor.id).expect("ratings").len(), 3);
}

#[test]
fn recompute_without_history_restores_baseline() {
    let (service, ledger) = build_service();
    let contractor = service
        .register_contractor(registration("CON-500"))
        .expect("contractor registered");
    let mut degraded = ledger
        .contractor(contractor.id)
        .expect("lookup")
        .expect("present");
    degraded.current_rating = 1.0;
    ledger
        .commit(vec![LedgerChange::UpdateContractor(degraded)])
        .expect("seeded");

    let result = service.recompute(contractor.id, now()).expect("recomputed");

    assert_close(result.final_rating, 5.0);
    assert_eq!(result.rating_category, RatingCategory::Excellent);
    let stored = ledger
        .contractor(contractor.id)
        .expect("lookup")
        .expect("present");
    assert_close(stored.current_rating, 5.0);
}

#[test]
fn recompute_surfaces_concurrent_writes_as_version_conflicts() {
    let (service, _) = racing_service();
    let contractor = service
        .register_contractor(registration("CON-600"))
        .expect("contractor registered");

    let error = service
        .recompute(contractor.id, now())
        .expect_err("stale write rejected");

    assert!(matches!(
        error,
        RatingServiceError::Repository(RepositoryError::VersionConflict { .. })
    ));
}

#[test]
fn contractor_detail_does_not_persist() {
    let (service, ledger) = build_service();
    let contractor = service
        .register_contractor(registration("CON-700"))
        .expect("contractor registered");
    let project = service
        .register_road(road("NH-9", Some(contractor.id)), now())
        .expect("road registered");
    service
        .file_complaint(intake(project.id, Severity::Critical), now())
        .expect("complaint filed");

    let before = ledger
        .contractor(contractor.id)
        .expect("lookup")
        .expect("present");
    // the complaint ages out of the recency window
    let view = service
        .contractor_detail(contractor.id, now() + Duration::days(45))
        .expect("detail");
    let after = ledger
        .contractor(contractor.id)
        .expect("lookup")
        .expect("present");

    assert_close(view.current_rating, before.current_rating + 0.15);
    assert_eq!(before, after);
    assert_eq!(view.total_projects, 1);
    assert_eq!(view.pending_complaints, 1);
}

#[test]
fn assign_contractor_moves_the_project_between_ledgers() {
    let (service, ledger) = build_service();
    let first = service
        .register_contractor(registration("CON-800"))
        .expect("registered");
    let second = service
        .register_contractor(registration("CON-801"))
        .expect("registered");
    let project = service
        .register_road(road("NH-10", Some(first.id)), now())
        .expect("road registered");
    service
        .file_complaint(intake(project.id, Severity::High), now())
        .expect("complaint filed");

    let moved = service
        .assign_contractor(project.id, second.id, now())
        .expect("assigned");

    assert_eq!(moved.contractor_id, Some(second.id));
    let first = ledger.contractor(first.id).expect("lookup").expect("present");
    let second = ledger.contractor(second.id).expect("lookup").expect("present");
    assert_eq!(first.total_projects, 0);
    assert_close(first.current_rating, 5.0);
    assert_eq!(second.total_projects, 1);
    assert!(second.current_rating < 5.0);
}

#[test]
fn dashboard_ranks_every_registered_contractor() {
    let (service, _) = build_service();
    let strong = service
        .register_contractor(registration("CON-900"))
        .expect("registered");
    let weak = service
        .register_contractor(registration("CON-901"))
        .expect("registered");
    let project = service
        .register_road(road("NH-11", Some(weak.id)), now())
        .expect("road registered");
    for severity in [Severity::Low, Severity::Medium, Severity::High] {
        service
            .file_complaint(intake(project.id, severity), now())
            .expect("complaint filed");
    }
    service
        .submit_rating(
            weak.id,
            RatingSubmission {
                project_id: Some(project.id),
                value: 2.0,
                reviewer: None,
                comment: None,
            },
            now(),
        )
        .expect("rating stored");

    let dashboard = service.performance_dashboard().expect("dashboard");

    assert_eq!(dashboard.total_contractors, 2);
    assert_eq!(dashboard.all_contractors[0].contractor_id, weak.id);
    assert_eq!(dashboard.all_contractors[1].contractor_id, strong.id);
    assert_eq!(dashboard.bottom_performers.len(), 2);
}

#[test]
fn repository_outages_propagate() {
    let service = RatingService::new(
        Arc::new(UnavailableRepository),
        RatingEngine::default(),
        LedgerConfig::default(),
    );

    let error = service
        .performance_report(ContractorId(1))
        .expect_err("repository offline");

    assert!(matches!(
        error,
        RatingServiceError::Repository(RepositoryError::Unavailable(_))
    ));
}

#[test]
fn rejected_complaint_writes_leave_nothing_behind() {
    let (service, ledger) = racing_service();
    let contractor = service
        .register_contractor(registration("CON-610"))
        .expect("contractor registered");
    let project = service
        .register_road(road("NH-61", Some(contractor.id)), now())
        .expect("road registered");

    for _ in 0..2 {
        let error = service
            .file_complaint(intake(project.id, Severity::Critical), now())
            .expect_err("every attempt loses the race");
        assert!(matches!(
            error,
            RatingServiceError::Repository(RepositoryError::VersionConflict { .. })
        ));
    }

    assert!(ledger
        .complaints_for_project(project.id)
        .expect("complaints")
        .is_empty());
    let stored = ledger
        .contractor(contractor.id)
        .expect("lookup")
        .expect("present");
    assert_eq!(stored.total_complaints, 0);
    assert_close(stored.current_rating, 5.0);
}

#[test]
fn rejected_reassignment_keeps_the_original_owner() {
    let (service, ledger) = racing_service();
    let first = service
        .register_contractor(registration("CON-620"))
        .expect("registered");
    let second = service
        .register_contractor(registration("CON-621"))
        .expect("registered");
    let project = service
        .register_road(road("NH-62", Some(first.id)), now())
        .expect("road registered");

    service
        .assign_contractor(project.id, second.id, now())
        .expect_err("stale write rejected");

    let stored = ledger.project(project.id).expect("lookup").expect("present");
    assert_eq!(stored.contractor_id, Some(first.id));
    let first = ledger.contractor(first.id).expect("lookup").expect("present");
    let second = ledger.contractor(second.id).expect("lookup").expect("present");
    assert_eq!(first.total_projects, 1);
    assert_eq!(second.total_projects, 0);
}

#[test]
fn ratings_without_a_project_are_accepted() {
    let (service, ledger) = build_service();
    let contractor = service
        .register_contractor(registration("CON-410"))
        .expect("contractor registered");

    let receipt = service
        .submit_rating(
            contractor.id,
            RatingSubmission {
                project_id: None,
                value: 3.5,
                reviewer: Some("citizen panel".to_string()),
                comment: None,
            },
            now(),
        )
        .expect("rating stored");

    assert_eq!(receipt.rating.project_id, None);
    assert_close(receipt.average_rating, 3.5);
    assert_eq!(ledger.ratings_for(contractor.id).expect("ratings").len(), 1);
}

#[test]
fn ratings_for_another_contractors_project_are_rejected() {
    let (service, ledger) = build_service();
    let rated = service
        .register_contractor(registration("CON-420"))
        .expect("registered");
    let owner = service
        .register_contractor(registration("CON-421"))
        .expect("registered");
    let project = service
        .register_road(road("NH-42", Some(owner.id)), now())
        .expect("road registered");

    let error = service
        .submit_rating(
            rated.id,
            RatingSubmission {
                project_id: Some(project.id),
                value: 4.0,
                reviewer: None,
                comment: None,
            },
            now(),
        )
        .expect_err("foreign project");

    assert!(matches!(
        error,
        RatingServiceError::ProjectNotOwned { project: rejected, contractor }
            if rejected == project.id && contractor == rated.id
    ));
    assert!(ledger.ratings_for(rated.id).expect("ratings").is_empty());
}

#[test]
fn contractor_projects_count_complaints_per_road() {
    let (service, _) = build_service();
    let contractor = service
        .register_contractor(registration("CON-630"))
        .expect("registered");
    let busy = service
        .register_road(road("NH-63", Some(contractor.id)), now())
        .expect("road registered");
    let quiet = service
        .register_road(road("NH-64", Some(contractor.id)), now())
        .expect("road registered");
    for severity in [Severity::Low, Severity::High] {
        service
            .file_complaint(intake(busy.id, severity), now())
            .expect("complaint filed");
    }

    let projects = service
        .contractor_projects(contractor.id)
        .expect("projects listed");

    let counts = projects
        .iter()
        .map(|summary| (summary.project.id, summary.complaint_count))
        .collect::<Vec<_>>();
    assert_eq!(counts, vec![(busy.id, 2), (quiet.id, 0)]);
}

#[test]
fn road_views_list_complaints_newest_first() {
    let (service, _) = build_service();
    let contractor = service
        .register_contractor(registration("CON-640"))
        .expect("registered");
    let project = service
        .register_road(road("NH-65", Some(contractor.id)), now())
        .expect("road registered");
    let older = service
        .file_complaint(intake(project.id, Severity::Low), now() - Duration::days(3))
        .expect("complaint filed");
    let newer = service
        .file_complaint(intake(project.id, Severity::Medium), now())
        .expect("complaint filed");

    let complaints = service.road_complaints(project.id).expect("complaints");
    let ids = complaints.iter().map(|complaint| complaint.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![newer.complaint.id, older.complaint.id]);

    let detail = service.road_detail(project.id).expect("road detail");
    assert_eq!(detail.project.road_code, "NH-65");
    assert_eq!(
        detail.contractor.map(|summary| summary.code),
        Some("CON-640".to_string())
    );
    assert_eq!(detail.complaints.len(), 2);
    assert_eq!(detail.complaints[0].id, newer.complaint.id);

    assert!(service.roads().expect("roads").iter().any(|road| road.id == project.id));
    assert!(matches!(
        service.road_complaints(ProjectId(u64::MAX)),
        Err(RatingServiceError::UnknownProject(_))
    ));
}

#[test]
fn imported_exports_join_the_ledger_and_are_scored() {
    let (service, ledger) = build_service();
    let contractor = service
        .register_contractor(registration("CON-650"))
        .expect("registered");
    let projects = "Project ID,Road ID,Road Name,Construction Date,Warranty Years\n\
9001,ROAD-9001,Outer Ring Road,2023-04-01,10\n";
    let complaints = "Complaint ID,Project ID,Severity,Status,Created At\n\
9001,9001,High,Open,2025-09-28\n\
9002,9001,High,Resolved,2025-09-29\n\
9003,9001,Low,Resolved,2025-09-30\n";
    let export = LedgerImporter::from_readers(
        contractor.clone(),
        projects.as_bytes(),
        complaints.as_bytes(),
    )
    .expect("export parses");

    let result = service.import_ledger(export, now()).expect("imported");

    assert_close(result.final_rating, 1.95);
    let stored = ledger
        .contractor(contractor.id)
        .expect("lookup")
        .expect("present");
    assert_eq!(stored.total_projects, 1);
    assert_eq!(stored.total_complaints, 3);
    assert_close(stored.current_rating, 1.95);

    let registered = service
        .register_road(road("NH-90", Some(contractor.id)), now())
        .expect("sequence skips imported identities");
    assert!(registered.id > ProjectId(9001));
}
