//! Prediction outcome data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Class label interpreted as "will default".
pub const POSITIVE_LABEL: u8 = 1;

/// Binary risk banner shown under the probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBanner {
    Low,
    High,
}

impl RiskBanner {
    /// High risk if and only if the predicted class is the positive class
    pub fn from_label(label: u8) -> Self {
        if label == POSITIVE_LABEL {
            RiskBanner::High
        } else {
            RiskBanner::Low
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RiskBanner::High => "⚠️ HIGH RISK of Default",
            RiskBanner::Low => "✅ LOW RISK of Default",
        }
    }
}

/// Result of scoring one loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted class (0 or 1)
    pub label: u8,

    /// Probability of the positive class (0.0 - 1.0)
    pub probability: f64,

    pub risk: RiskBanner,

    pub scored_at: DateTime<Utc>,
}

impl Prediction {
    pub fn new(label: u8, probability: f64) -> Self {
        Self {
            label,
            probability,
            risk: RiskBanner::from_label(label),
            scored_at: Utc::now(),
        }
    }

    /// Probability as a percentage with two decimals, e.g. `73.40%`
    pub fn probability_percent(&self) -> String {
        format_percent(self.probability)
    }

    /// Text of the probability output region
    pub fn probability_message(&self) -> String {
        format!("Default Probability: {}", self.probability_percent())
    }

    pub fn is_high_risk(&self) -> bool {
        self.risk == RiskBanner::High
    }
}

/// Format a probability as a two-decimal percentage.
pub fn format_percent(probability: f64) -> String {
    format!("{:.2}%", probability * 100.0)
}

/// Wire shape of a prediction for the JSON API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub label: u8,
    pub probability: f64,
    pub probability_text: String,
    pub risk: RiskBanner,
    pub risk_text: String,
    pub scored_at: DateTime<Utc>,
}

impl From<&Prediction> for PredictionResponse {
    fn from(p: &Prediction) -> Self {
        Self {
            label: p.label,
            probability: p.probability,
            probability_text: p.probability_percent(),
            risk: p.risk,
            risk_text: p.risk.message().to_string(),
            scored_at: p.scored_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_from_label() {
        assert_eq!(RiskBanner::from_label(1), RiskBanner::High);
        assert_eq!(RiskBanner::from_label(0), RiskBanner::Low);
    }

    #[test]
    fn test_banner_follows_label_not_probability() {
        // A low probability with label 1 still shows the high-risk banner
        let p = Prediction::new(1, 0.2);
        assert!(p.is_high_risk());
        let p = Prediction::new(0, 0.9);
        assert!(!p.is_high_risk());
    }

    #[test]
    fn test_percent_formatting() {
        assert_eq!(format_percent(0.734), "73.40%");
        assert_eq!(format_percent(0.0), "0.00%");
        assert_eq!(format_percent(1.0), "100.00%");
        assert_eq!(format_percent(0.5), "50.00%");
        assert_eq!(
            Prediction::new(1, 0.734).probability_message(),
            "Default Probability: 73.40%"
        );
    }

    #[test]
    fn test_response_serialization() {
        let p = Prediction::new(0, 0.25);
        let json = serde_json::to_value(PredictionResponse::from(&p)).unwrap();
        assert_eq!(json["risk"], "low");
        assert_eq!(json["probability_text"], "25.00%");
    }
}
