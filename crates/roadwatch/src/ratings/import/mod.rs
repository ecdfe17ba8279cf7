//! Batch import of ledger exports so a contractor can be scored offline.

mod parser;

pub use parser::parse_timestamp;

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::domain::{
    warranty_end_for, Complaint, ComplaintId, ComplaintStatus, Contractor, DamageType, ProjectId,
    RoadProject, Severity,
};
use super::repository::LedgerSnapshot;
use parser::{parse_rows, ComplaintRow, ProjectRow};

#[derive(Debug, thiserror::Error)]
pub enum LedgerImportError {
    #[error("failed to read ledger export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid ledger CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: '{value}' in column '{column}' is not a valid date or timestamp")]
    InvalidTimestamp {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("row {row}: unrecognized value '{value}' in column '{column}'")]
    UnknownLabel {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("row {row}: complaint references unknown project {project}")]
    UnknownProject { row: usize, project: ProjectId },
    #[error("row {row}: project {project} is listed more than once")]
    DuplicateProject { row: usize, project: ProjectId },
}

pub struct LedgerImporter;

impl LedgerImporter {
    pub fn from_paths<P: AsRef<Path>, Q: AsRef<Path>>(
        contractor: Contractor,
        projects: P,
        complaints: Q,
    ) -> Result<LedgerSnapshot, LedgerImportError> {
        let projects = File::open(projects)?;
        let complaints = File::open(complaints)?;
        Self::from_readers(contractor, projects, complaints)
    }

    /// Every imported project is bound to `contractor`.
    pub fn from_readers<P: Read, C: Read>(
        contractor: Contractor,
        projects: P,
        complaints: C,
    ) -> Result<LedgerSnapshot, LedgerImportError> {
        let projects = parse_rows::<ProjectRow, _>(projects)?
            .into_iter()
            .map(|(row, record)| project_from_row(row, record, &contractor))
            .collect::<Result<Vec<_>, _>>()?;

        let mut known = HashSet::with_capacity(projects.len());
        for (index, project) in projects.iter().enumerate() {
            if !known.insert(project.id) {
                return Err(LedgerImportError::DuplicateProject {
                    row: index + 2,
                    project: project.id,
                });
            }
        }

        let complaints = parse_rows::<ComplaintRow, _>(complaints)?
            .into_iter()
            .map(|(row, record)| complaint_from_row(row, record, &known))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LedgerSnapshot {
            contractor,
            projects,
            complaints,
            ratings: Vec::new(),
        })
    }
}

fn project_from_row(
    row: usize,
    record: ProjectRow,
    contractor: &Contractor,
) -> Result<RoadProject, LedgerImportError> {
    let construction_date = timestamp(row, "Construction Date", &record.construction_date)?;
    let warranty_end_date = match record.warranty_end_date.as_deref() {
        Some(raw) => Some(timestamp(row, "Warranty End Date", raw)?),
        None => warranty_end_for(construction_date, record.warranty_years),
    };

    Ok(RoadProject {
        id: ProjectId(record.project_id),
        road_code: record.road_code,
        name: record.name,
        contractor_id: Some(contractor.id),
        address: None,
        construction_date,
        completion_date: None,
        warranty_period_years: record.warranty_years,
        warranty_end_date,
    })
}

fn complaint_from_row(
    row: usize,
    record: ComplaintRow,
    known: &HashSet<ProjectId>,
) -> Result<Complaint, LedgerImportError> {
    let project_id = ProjectId(record.project_id);
    if !known.contains(&project_id) {
        return Err(LedgerImportError::UnknownProject {
            row,
            project: project_id,
        });
    }

    let severity = label::<Severity>(row, "Severity", record.severity)?.unwrap_or_default();
    let status = label::<ComplaintStatus>(row, "Status", record.status)?.unwrap_or_default();
    let damage_type =
        label::<DamageType>(row, "Damage Type", record.damage_type)?.unwrap_or(DamageType::Other);
    let created_at = timestamp(row, "Created At", &record.created_at)?;

    Ok(Complaint {
        id: ComplaintId(record.complaint_id),
        project_id,
        damage_type,
        description: record.description.unwrap_or_default(),
        severity,
        status,
        reporter: None,
        created_at,
        resolved_at: None,
        resolution: None,
    })
}

fn timestamp(
    row: usize,
    column: &'static str,
    raw: &str,
) -> Result<chrono::DateTime<chrono::Utc>, LedgerImportError> {
    parse_timestamp(raw).ok_or_else(|| LedgerImportError::InvalidTimestamp {
        row,
        column,
        value: raw.to_string(),
    })
}

fn label<T: std::str::FromStr>(
    row: usize,
    column: &'static str,
    raw: Option<String>,
) -> Result<Option<T>, LedgerImportError> {
    raw.map(|value| {
        value
            .parse::<T>()
            .map_err(|_| LedgerImportError::UnknownLabel { row, column, value })
    })
    .transpose()
}
