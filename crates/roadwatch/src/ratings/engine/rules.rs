use chrono::{DateTime, Utc};

use super::super::domain::{Complaint, RoadProject};
use super::rubric::RatingRubric;
use super::Deduction;

/// Deductions contributed by a single project, in the order they are logged.
pub(crate) fn project_deductions(
    project: &RoadProject,
    complaints: &[&Complaint],
    rubric: &RatingRubric,
    now: DateTime<Utc>,
) -> Vec<Deduction> {
    let mut deductions = Vec::new();
    if complaints.is_empty() {
        return deductions;
    }

    let count = complaints.len();
    if project.is_under_warranty(now) {
        deductions.push(Deduction {
            reason: format!(
                "{count} complaints during warranty (Road: {})",
                project.name
            ),
            deduction: rubric.warranty_complaints.apply(count),
        });
    } else {
        deductions.push(Deduction {
            reason: format!("{count} complaints post-warranty (Road: {})", project.name),
            deduction: rubric.post_warranty_complaints.apply(count),
        });
    }

    let severity_impact = complaints
        .iter()
        .map(|complaint| rubric.severity.weight(complaint.severity))
        .sum::<f64>();
    deductions.push(Deduction {
        reason: "Severity impact from complaints".to_string(),
        deduction: severity_impact,
    });

    let unresolved = complaints
        .iter()
        .filter(|complaint| complaint.status.is_unresolved())
        .count();
    if unresolved > 0 {
        deductions.push(Deduction {
            reason: format!("{unresolved} unresolved complaints"),
            deduction: rubric.unresolved.apply(unresolved),
        });
    }

    let recent = complaints
        .iter()
        .filter(|complaint| is_recent(complaint, rubric, now))
        .count();
    if recent > 0 {
        deductions.push(Deduction {
            reason: format!(
                "Recent complaints (within {} days): {recent}",
                rubric.recency_window_days
            ),
            deduction: rubric.recent.apply(recent),
        });
    }

    deductions
}

/// Whole elapsed days are compared, so a complaint 30 days and 23 hours old is still recent.
fn is_recent(complaint: &Complaint, rubric: &RatingRubric, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(complaint.created_at).num_days() <= rubric.recency_window_days
}
