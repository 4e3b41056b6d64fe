//! Loan attributes captured from the form and their fixed domains

use crate::schema::{Cell, Record};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator};
use validator::Validate;

/// Column names the persisted model was trained with.
pub mod columns {
    pub const INITIAL_LOAN_AMOUNT: &str = "INITIAL_LOAN_AMOUNT";
    pub const LOAN_TERM_LENGTH: &str = "LOAN_TERM_LENGTH";
    pub const REPEAT_BORROWER: &str = "REPEAT_BORROWER";
    pub const INDUSTRY: &str = "INDUSTRY";
    pub const COMPANY_TYPE: &str = "COMPANY_TYPE";
    pub const SEGMENT: &str = "SEGMENT";
    pub const COHORT_MONTH: &str = "COHORT_MONTH";
}

/// Upper bound of the loan term slider, in days.
pub const MAX_LOAN_TERM_DAYS: u32 = 2000;

/// A closed set of categorical values with a stable wire spelling.
pub trait Category: IntoEnumIterator + AsRef<str> + Copy + PartialEq {
    /// Wire spelling of every value, in declaration order.
    fn options() -> Vec<String> {
        Self::iter().map(|v| v.as_ref().to_string()).collect()
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumIter, AsRefStr, EnumString,
)]
pub enum Industry {
    #[default]
    #[serde(rename = "retail")]
    #[strum(serialize = "retail")]
    Retail,
    #[serde(rename = "construction")]
    #[strum(serialize = "construction")]
    Construction,
    #[serde(rename = "manufacturing")]
    #[strum(serialize = "manufacturing")]
    Manufacturing,
    #[serde(rename = "commercial & professional services")]
    #[strum(serialize = "commercial & professional services")]
    CommercialProfessionalServices,
    #[serde(rename = "materials")]
    #[strum(serialize = "materials")]
    Materials,
}

impl Category for Industry {}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumIter, AsRefStr, EnumString,
)]
pub enum CompanyType {
    #[default]
    #[serde(rename = "single")]
    #[strum(serialize = "single")]
    Single,
    #[serde(rename = "partnership")]
    #[strum(serialize = "partnership")]
    Partnership,
    #[serde(rename = "corporation")]
    #[strum(serialize = "corporation")]
    Corporation,
}

impl Category for CompanyType {}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumIter, AsRefStr, EnumString,
)]
pub enum Segment {
    #[default]
    #[serde(rename = "Segment 1")]
    #[strum(serialize = "Segment 1")]
    Segment1,
    #[serde(rename = "Segment 2")]
    #[strum(serialize = "Segment 2")]
    Segment2,
    #[serde(rename = "Segment 3")]
    #[strum(serialize = "Segment 3")]
    Segment3,
    #[serde(rename = "Segment 4")]
    #[strum(serialize = "Segment 4")]
    Segment4,
}

impl Category for Segment {}

/// Origination cohort. Only the months the model has seen are offered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumIter, AsRefStr, EnumString,
)]
pub enum CohortMonth {
    #[default]
    #[serde(rename = "2023-01")]
    #[strum(serialize = "2023-01")]
    Jan2023,
    #[serde(rename = "2023-02")]
    #[strum(serialize = "2023-02")]
    Feb2023,
    #[serde(rename = "2023-03")]
    #[strum(serialize = "2023-03")]
    Mar2023,
    #[serde(rename = "2020-01")]
    #[strum(serialize = "2020-01")]
    Jan2020,
    #[serde(rename = "2019-05")]
    #[strum(serialize = "2019-05")]
    May2019,
}

impl Category for CohortMonth {}

/// One prediction request, as captured from the form or the JSON API.
///
/// Field names on the wire are the model's column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct PredictionRequest {
    /// Requested principal
    pub initial_loan_amount: f64,

    /// Term in days
    #[validate(range(max = MAX_LOAN_TERM_DAYS))]
    pub loan_term_length: u32,

    pub repeat_borrower: bool,

    pub industry: Industry,

    pub company_type: CompanyType,

    pub segment: Segment,

    pub cohort_month: CohortMonth,
}

impl Default for PredictionRequest {
    fn default() -> Self {
        Self {
            initial_loan_amount: 500_000.0,
            loan_term_length: 180,
            repeat_borrower: true,
            industry: Industry::default(),
            company_type: CompanyType::default(),
            segment: Segment::default(),
            cohort_month: CohortMonth::default(),
        }
    }
}

impl PredictionRequest {
    /// Assemble the single-row record handed to the model.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert(
            columns::INITIAL_LOAN_AMOUNT,
            Cell::Number(self.initial_loan_amount),
        );
        record.insert(
            columns::LOAN_TERM_LENGTH,
            Cell::Integer(i64::from(self.loan_term_length)),
        );
        record.insert(columns::REPEAT_BORROWER, Cell::Boolean(self.repeat_borrower));
        record.insert(columns::INDUSTRY, Cell::category(self.industry));
        record.insert(columns::COMPANY_TYPE, Cell::category(self.company_type));
        record.insert(columns::SEGMENT, Cell::category(self.segment));
        record.insert(columns::COHORT_MONTH, Cell::category(self.cohort_month));
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_default_request() {
        let req = PredictionRequest::default();
        assert_eq!(req.initial_loan_amount, 500_000.0);
        assert_eq!(req.loan_term_length, 180);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_category_options() {
        assert_eq!(Industry::options().len(), 5);
        assert_eq!(CompanyType::options(), vec!["single", "partnership", "corporation"]);
        assert_eq!(Segment::options()[3], "Segment 4");
        assert_eq!(
            CohortMonth::options(),
            vec!["2023-01", "2023-02", "2023-03", "2020-01", "2019-05"]
        );
        assert_eq!(
            Industry::from_str("commercial & professional services").unwrap(),
            Industry::CommercialProfessionalServices
        );
    }

    #[test]
    fn test_term_out_of_range() {
        let req = PredictionRequest {
            loan_term_length: MAX_LOAN_TERM_DAYS + 1,
            ..Default::default()
        };
        assert!(req.validate().is_err());

        let longest = PredictionRequest {
            loan_term_length: MAX_LOAN_TERM_DAYS,
            ..Default::default()
        };
        assert!(longest.validate().is_ok());
    }

    #[test]
    fn test_json_uses_column_names() {
        let json = r#"{
            "INITIAL_LOAN_AMOUNT": 500000,
            "LOAN_TERM_LENGTH": 180,
            "REPEAT_BORROWER": false,
            "INDUSTRY": "retail",
            "COMPANY_TYPE": "single",
            "SEGMENT": "Segment 1",
            "COHORT_MONTH": "2023-01"
        }"#;
        let req: PredictionRequest = serde_json::from_str(json).unwrap();
        assert!(!req.repeat_borrower);
        assert_eq!(req.segment, Segment::Segment1);
    }

    #[test]
    fn test_unknown_industry_rejected() {
        let json = r#"{
            "INITIAL_LOAN_AMOUNT": 1,
            "LOAN_TERM_LENGTH": 1,
            "REPEAT_BORROWER": true,
            "INDUSTRY": "mining",
            "COMPANY_TYPE": "single",
            "SEGMENT": "Segment 1",
            "COHORT_MONTH": "2023-01"
        }"#;
        assert!(serde_json::from_str::<PredictionRequest>(json).is_err());
    }

    #[test]
    fn test_to_record_has_seven_columns() {
        let record = PredictionRequest::default().to_record();
        assert_eq!(
            record.column_names(),
            vec![
                "INITIAL_LOAN_AMOUNT",
                "LOAN_TERM_LENGTH",
                "REPEAT_BORROWER",
                "INDUSTRY",
                "COMPANY_TYPE",
                "SEGMENT",
                "COHORT_MONTH",
            ]
        );
        assert_eq!(record.get("INDUSTRY"), Some(&Cell::Category("retail".to_string())));
    }
}
