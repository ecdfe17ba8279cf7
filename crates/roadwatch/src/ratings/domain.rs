use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Days counted per warranty year when deriving a warranty end date.
pub const DAYS_PER_WARRANTY_YEAR: i64 = 365;

macro_rules! ledger_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{:04}"), self.0)
            }
        }
    };
}

ledger_id!(
    /// Storage identity of a contractor.
    ContractorId,
    "CON"
);
ledger_id!(
    /// Storage identity of a road project; complaints reference projects by this value.
    ProjectId,
    "ROAD"
);
ledger_id!(
    /// Storage identity of a public complaint.
    ComplaintId,
    "COMPLAINT"
);
ledger_id!(RatingId, "RATING");

/// Contractor record with the aggregate counters maintained by the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contractor {
    pub id: ContractorId,
    pub code: String,
    pub name: String,
    pub email: String,
    /// Last persisted output of the rating engine.
    pub current_rating: f64,
    pub total_complaints: u32,
    pub total_projects: u32,
    /// Optimistic concurrency token, bumped by the repository on every write.
    pub version: u64,
}

impl Contractor {
    pub fn new(id: ContractorId, code: String, name: String, email: String) -> Self {
        Self {
            id,
            code,
            name,
            email,
            current_rating: 5.0,
            total_complaints: 0,
            total_projects: 0,
            version: 0,
        }
    }
}

/// Road project under a contractor's warranty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadProject {
    pub id: ProjectId,
    pub road_code: String,
    pub name: String,
    pub contractor_id: Option<ContractorId>,
    pub address: Option<String>,
    pub construction_date: DateTime<Utc>,
    pub completion_date: Option<DateTime<Utc>>,
    pub warranty_period_years: u32,
    pub warranty_end_date: Option<DateTime<Utc>>,
}

impl RoadProject {
    /// Build a project record, deriving the warranty end date from the construction date.
    pub fn register(
        id: ProjectId,
        road_code: String,
        name: String,
        construction_date: DateTime<Utc>,
        warranty_period_years: u32,
    ) -> Self {
        Self {
            id,
            road_code,
            name,
            contractor_id: None,
            address: None,
            construction_date,
            completion_date: None,
            warranty_period_years,
            warranty_end_date: warranty_end_for(construction_date, warranty_period_years),
        }
    }

    pub fn with_contractor(mut self, contractor_id: ContractorId) -> Self {
        self.contractor_id = Some(contractor_id);
        self
    }

    /// A project without a warranty end date is never under warranty.
    pub fn is_under_warranty(&self, now: DateTime<Utc>) -> bool {
        self.warranty_end_date.is_some_and(|end| now <= end)
    }
}

pub fn warranty_end_for(
    construction_date: DateTime<Utc>,
    warranty_period_years: u32,
) -> Option<DateTime<Utc>> {
    let days = i64::from(warranty_period_years) * DAYS_PER_WARRANTY_YEAR;
    construction_date.checked_add_signed(Duration::days(days))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ComplaintStatus {
    #[default]
    Open,
    #[serde(rename = "Under Review")]
    UnderReview,
    Resolved,
    Rejected,
}

impl ComplaintStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::UnderReview => "Under Review",
            Self::Resolved => "Resolved",
            Self::Rejected => "Rejected",
        }
    }

    /// Open and under-review complaints still count against the contractor.
    pub const fn is_unresolved(self) -> bool {
        matches!(self, Self::Open | Self::UnderReview)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    Pothole,
    Crack,
    Erosion,
    Flooding,
    Other,
}

impl DamageType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pothole => "Pothole",
            Self::Crack => "Crack",
            Self::Erosion => "Erosion",
            Self::Flooding => "Flooding",
            Self::Other => "Other",
        }
    }
}

/// Citizen complaint filed against a single road project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complaint {
    pub id: ComplaintId,
    pub project_id: ProjectId,
    pub damage_type: DamageType,
    pub description: String,
    pub severity: Severity,
    pub status: ComplaintStatus,
    pub reporter: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution: Option<String>,
}

/// Explicit 1-5 review of a contractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub id: RatingId,
    pub contractor_id: ContractorId,
    pub project_id: Option<ProjectId>,
    pub value: f64,
    pub reviewer: Option<String>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Raised when a textual label cannot be mapped onto a ledger enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized {kind} '{value}'")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for Severity {
    type Err = UnknownLabel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(UnknownLabel {
                kind: "severity",
                value: value.to_string(),
            }),
        }
    }
}

impl FromStr for ComplaintStatus {
    type Err = UnknownLabel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value
            .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_lowercase();

        match normalized.as_str() {
            "open" => Ok(Self::Open),
            "under review" => Ok(Self::UnderReview),
            "resolved" => Ok(Self::Resolved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(UnknownLabel {
                kind: "complaint status",
                value: value.to_string(),
            }),
        }
    }
}

impl FromStr for DamageType {
    type Err = UnknownLabel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pothole" => Ok(Self::Pothole),
            "crack" => Ok(Self::Crack),
            "erosion" => Ok(Self::Erosion),
            "flooding" => Ok(Self::Flooding),
            "other" => Ok(Self::Other),
            _ => Err(UnknownLabel {
                kind: "damage type",
                value: value.to_string(),
            }),
        }
    }
}
