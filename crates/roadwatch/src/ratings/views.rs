use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{Complaint, Contractor, ContractorId, Rating, RoadProject};
use super::engine::{round_to_hundredths, Deduction, RatingCategory, RatingResult, RiskLevel};
use super::performance::{
    average_rating, performance_score, rating_distribution, PerformanceRank, PerformanceTier,
    RatingDistribution,
};
use super::repository::LedgerSnapshot;
use super::validation::RatingError;

const RECENT_RATING_LIMIT: usize = 5;

/// Contractor profile enriched with a freshly computed rating and risk assessment.
#[derive(Debug, Clone, Serialize)]
pub struct ContractorDetailView {
    pub contractor_id: ContractorId,
    pub code: String,
    pub name: String,
    pub email: String,
    pub current_rating: f64,
    pub rating_category: RatingCategory,
    pub rating_color: &'static str,
    pub deductions: Vec<Deduction>,
    pub total_deduction: f64,
    pub total_projects: usize,
    pub total_complaints: usize,
    pub resolved_complaints: usize,
    pub pending_complaints: usize,
    pub risk_level: RiskLevel,
    pub recommendation: String,
    pub evaluated_at: DateTime<Utc>,
}

impl ContractorDetailView {
    pub fn new(snapshot: &LedgerSnapshot, result: &RatingResult) -> Self {
        let risk = result.risk();
        let contractor = &snapshot.contractor;

        Self {
            contractor_id: contractor.id,
            code: contractor.code.clone(),
            name: contractor.name.clone(),
            email: contractor.email.clone(),
            current_rating: result.final_rating,
            rating_category: result.rating_category,
            rating_color: result.color(),
            deductions: result.deductions.clone(),
            total_deduction: result.total_deduction,
            total_projects: snapshot.projects.len(),
            total_complaints: snapshot.complaints.len(),
            resolved_complaints: snapshot.resolved_complaints(),
            pending_complaints: snapshot.pending_complaints(),
            risk_level: risk.level,
            recommendation: risk.recommendation,
            evaluated_at: result.timestamp,
        }
    }
}

/// Review-based performance metrics for a single contractor.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub contractor_id: ContractorId,
    pub code: String,
    pub name: String,
    pub average_rating: f64,
    pub total_ratings: usize,
    pub total_complaints: u32,
    pub total_projects: usize,
    pub performance_score: f64,
    pub performance_rank: PerformanceRank,
    pub rating_distribution: RatingDistribution,
    pub recent_ratings: Vec<Rating>,
}

impl PerformanceReport {
    /// Contractors without reviews are scored with an average of zero.
    pub fn new(snapshot: &LedgerSnapshot) -> Result<Self, RatingError> {
        let contractor = &snapshot.contractor;
        let average = average_rating(&snapshot.ratings)?.unwrap_or(0.0);
        let score = performance_score(average, contractor.total_complaints);

        let mut recent_ratings = snapshot.ratings.clone();
        recent_ratings.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        recent_ratings.truncate(RECENT_RATING_LIMIT);

        Ok(Self {
            contractor_id: contractor.id,
            code: contractor.code.clone(),
            name: contractor.name.clone(),
            average_rating: round_to_hundredths(average),
            total_ratings: snapshot.ratings.len(),
            total_complaints: contractor.total_complaints,
            total_projects: snapshot.projects.len(),
            performance_score: score,
            performance_rank: PerformanceRank::from_score(score),
            rating_distribution: rating_distribution(&snapshot.ratings),
            recent_ratings,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardEntry {
    pub contractor_id: ContractorId,
    pub code: String,
    pub name: String,
    pub average_rating: f64,
    pub total_ratings: usize,
    pub total_complaints: u32,
    pub total_projects: u32,
    pub performance_score: f64,
    pub tier: PerformanceTier,
}

impl DashboardEntry {
    pub fn new(contractor: &Contractor, ratings: &[Rating]) -> Result<Self, RatingError> {
        let average = average_rating(ratings)?.unwrap_or(0.0);

        Ok(Self {
            contractor_id: contractor.id,
            code: contractor.code.clone(),
            name: contractor.name.clone(),
            average_rating: round_to_hundredths(average),
            total_ratings: ratings.len(),
            total_complaints: contractor.total_complaints,
            total_projects: contractor.total_projects,
            performance_score: performance_score(average, contractor.total_complaints),
            tier: PerformanceTier::classify(average, contractor.total_complaints),
        })
    }
}

/// Every contractor ranked by performance score, highest first, plus per-tier shortlists.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceDashboard {
    pub total_contractors: usize,
    pub top_performers: Vec<DashboardEntry>,
    pub average_performers: Vec<DashboardEntry>,
    pub bottom_performers: Vec<DashboardEntry>,
    pub all_contractors: Vec<DashboardEntry>,
}

impl PerformanceDashboard {
    pub fn from_entries(mut entries: Vec<DashboardEntry>) -> Self {
        entries.sort_by(|left, right| right.performance_score.total_cmp(&left.performance_score));

        let in_tier = |tier: PerformanceTier| {
            entries
                .iter()
                .filter(|entry| entry.tier == tier)
                .cloned()
                .collect::<Vec<_>>()
        };
        let top_performers = in_tier(PerformanceTier::Top);
        let average_performers = in_tier(PerformanceTier::Average);
        let bottom_performers = in_tier(PerformanceTier::Bottom);

        Self {
            total_contractors: entries.len(),
            top_performers,
            average_performers,
            bottom_performers,
            all_contractors: entries,
        }
    }
}

/// Road project row with the number of complaints filed against it.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    #[serde(flatten)]
    pub project: RoadProject,
    pub complaint_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContractorSummary {
    pub contractor_id: ContractorId,
    pub code: String,
    pub name: String,
}

/// Road project with its owning contractor and complaint history, newest complaint first.
#[derive(Debug, Clone, Serialize)]
pub struct RoadDetailView {
    #[serde(flatten)]
    pub project: RoadProject,
    pub contractor: Option<ContractorSummary>,
    pub complaints: Vec<Complaint>,
}

impl RoadDetailView {
    pub fn new(
        project: RoadProject,
        contractor: Option<&Contractor>,
        mut complaints: Vec<Complaint>,
    ) -> Self {
        sort_newest_first(&mut complaints);
        Self {
            project,
            contractor: contractor.map(|contractor| ContractorSummary {
                contractor_id: contractor.id,
                code: contractor.code.clone(),
                name: contractor.name.clone(),
            }),
            complaints,
        }
    }
}

pub(crate) fn sort_newest_first(complaints: &mut [Complaint]) {
    complaints.sort_by(|left, right| {
        right
            .created_at
            .cmp(&left.created_at)
            .then_with(|| right.id.cmp(&left.id))
    });
}
