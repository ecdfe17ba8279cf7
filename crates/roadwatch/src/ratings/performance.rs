//! Review-sentiment scoring, independent of the warranty deduction engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::Rating;
use super::engine::round_to_hundredths;
use super::validation::{validate_rating_value, RatingError};

const RATING_WEIGHT: f64 = 60.0;
const COMPLAINT_WEIGHT: f64 = 40.0;
const COMPLAINT_PENALTY_PERCENT: f64 = 5.0;

/// Blend the average review (weight 60) with inverse complaint volume (weight 40).
pub fn performance_score(avg_rating: f64, total_complaints: u32) -> f64 {
    let rating_score = (avg_rating / 5.0) * RATING_WEIGHT;
    let complaint_share =
        ((100.0 - f64::from(total_complaints) * COMPLAINT_PENALTY_PERCENT) / 100.0).max(0.0);
    let complaint_score = complaint_share * COMPLAINT_WEIGHT;

    round_to_hundredths(rating_score + complaint_score)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PerformanceRank {
    Excellent,
    Good,
    Average,
    Poor,
}

impl PerformanceRank {
    pub fn from_score(score: f64) -> Self {
        if score >= 85.0 {
            Self::Excellent
        } else if score >= 70.0 {
            Self::Good
        } else if score >= 50.0 {
            Self::Average
        } else {
            Self::Poor
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Average => "Average",
            Self::Poor => "Poor",
        }
    }
}

pub fn performance_rank(score: f64) -> PerformanceRank {
    PerformanceRank::from_score(score)
}

/// Dashboard grouping used to shortlist contractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTier {
    Top,
    Average,
    Bottom,
}

impl PerformanceTier {
    pub fn classify(avg_rating: f64, total_complaints: u32) -> Self {
        if total_complaints < 5 && avg_rating >= 4.0 {
            Self::Top
        } else if total_complaints > 15 || avg_rating < 3.0 {
            Self::Bottom
        } else {
            Self::Average
        }
    }
}

/// Count of reviews per whole star, with every bucket from 1 to 5 present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatingDistribution(BTreeMap<u8, u32>);

impl RatingDistribution {
    pub fn empty() -> Self {
        Self((1..=5).map(|stars| (stars, 0)).collect())
    }

    /// Values are truncated toward zero; anything outside 1..=5 afterwards is skipped.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut distribution = Self::empty();
        for value in values {
            let stars = value.trunc();
            if (1.0..=5.0).contains(&stars) {
                *distribution.0.entry(stars as u8).or_insert(0) += 1;
            }
        }
        distribution
    }

    pub fn count(&self, stars: u8) -> u32 {
        self.0.get(&stars).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.0.values().sum()
    }

    pub fn buckets(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.0.iter().map(|(stars, count)| (*stars, *count))
    }
}

impl Default for RatingDistribution {
    fn default() -> Self {
        Self::empty()
    }
}

pub fn rating_distribution(ratings: &[Rating]) -> RatingDistribution {
    RatingDistribution::from_values(ratings.iter().map(|rating| rating.value))
}

/// Arithmetic mean of the submitted reviews; `None` when nothing has been submitted.
pub fn average_rating(ratings: &[Rating]) -> Result<Option<f64>, RatingError> {
    if ratings.is_empty() {
        return Ok(None);
    }

    let mut sum = 0.0;
    for rating in ratings {
        sum += validate_rating_value(rating.value)?;
    }

    Ok(Some(sum / ratings.len() as f64))
}
