//! Type definitions for the loan default predictor

pub mod loan;
pub mod prediction;

pub use loan::{CohortMonth, CompanyType, Industry, PredictionRequest, Segment};
pub use prediction::{Prediction, PredictionResponse, RiskBanner};
