use serde::{Deserialize, Serialize};

/// Display bracket for a contractor rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RatingCategory {
    Excellent,
    #[serde(rename = "Very Good")]
    VeryGood,
    Good,
    Fair,
    Poor,
}

impl RatingCategory {
    /// Brackets are lower-bound inclusive and checked from the top.
    pub fn from_rating(rating: f64) -> Self {
        if rating >= 4.5 {
            Self::Excellent
        } else if rating >= 4.0 {
            Self::VeryGood
        } else if rating >= 3.0 {
            Self::Good
        } else if rating >= 2.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::VeryGood => "Very Good",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        }
    }

    /// Hex color used by dashboards for this bracket.
    pub const fn color(self) -> &'static str {
        match self {
            Self::Excellent => "#10b981",
            Self::VeryGood => "#3b82f6",
            Self::Good => "#f59e0b",
            Self::Fair => "#ef6354",
            Self::Poor => "#dc2626",
        }
    }

    pub const fn risk_level(self) -> RiskLevel {
        match self {
            Self::Excellent => RiskLevel::VeryLow,
            Self::VeryGood => RiskLevel::Low,
            Self::Good => RiskLevel::Medium,
            Self::Fair => RiskLevel::High,
            Self::Poor => RiskLevel::VeryHigh,
        }
    }
}

/// Procurement risk attached to a rating bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "Very Low")]
    VeryLow,
    Low,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl RiskLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::VeryLow => "Very Low",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }

    pub const fn recommendation(self) -> &'static str {
        match self {
            Self::VeryLow => "Approve for future contracts",
            Self::Low => "Approve with monitoring",
            Self::Medium => "Conditional approval",
            Self::High => "Restricted participation",
            Self::VeryHigh => "Blacklist from contracts",
        }
    }
}

/// Risk level paired with its fixed recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub recommendation: String,
}

pub fn rating_category(rating: f64) -> RatingCategory {
    RatingCategory::from_rating(rating)
}

pub fn rating_color(rating: f64) -> &'static str {
    RatingCategory::from_rating(rating).color()
}

pub fn risk_level(rating: f64) -> RiskAssessment {
    let level = RatingCategory::from_rating(rating).risk_level();
    RiskAssessment {
        level,
        recommendation: level.recommendation().to_string(),
    }
}
