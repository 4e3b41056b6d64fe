//! Feature extraction for loan default model inference.
//!
//! Turns a validated record into the dense float vector the estimators were
//! trained on. The layout is derived from the model's declared schema:
//! numeric and integer columns pass through, booleans become 0/1, and each
//! categorical column expands to one-hot slots in declared category order.

use crate::error::SchemaError;
use crate::schema::{Cell, ColumnKind, FeatureSchema, Record};

/// Feature extractor that transforms records into model input features.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    schema: FeatureSchema,
    feature_names: Vec<String>,
}

impl FeatureExtractor {
    /// Create an extractor for the given schema.
    pub fn new(schema: FeatureSchema) -> Self {
        let feature_names = schema
            .columns
            .iter()
            .flat_map(|col| match &col.kind {
                ColumnKind::Categorical { categories } => categories
                    .iter()
                    .map(|c| format!("{}={}", col.name, c))
                    .collect::<Vec<_>>(),
                _ => vec![col.name.clone()],
            })
            .collect();

        Self {
            schema,
            feature_names,
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Extract features from a record.
    ///
    /// The record is validated first, so a successful call always yields
    /// exactly [`feature_count`](Self::feature_count) values.
    pub fn extract(&self, record: &Record) -> Result<Vec<f32>, SchemaError> {
        self.schema.validate(record)?;

        let mut features = Vec::with_capacity(self.feature_names.len());

        for col in &self.schema.columns {
            let cell = record
                .get(&col.name)
                .ok_or_else(|| SchemaError::MissingColumn(col.name.clone()))?;

            match (&col.kind, cell) {
                (ColumnKind::Categorical { categories }, Cell::Category(value)) => {
                    features.extend(
                        categories
                            .iter()
                            .map(|c| if c == value { 1.0 } else { 0.0 }),
                    );
                }
                (_, Cell::Number(v)) => features.push(*v as f32),
                (_, Cell::Integer(v)) => features.push(*v as f32),
                (_, Cell::Boolean(b)) => features.push(if *b { 1.0 } else { 0.0 }),
                (_, Cell::Category(_)) => {
                    return Err(SchemaError::TypeMismatch {
                        column: col.name.clone(),
                        expected: "numeric",
                        found: "categorical",
                    });
                }
            }
        }

        Ok(features)
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }

    /// Get feature names in vector order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(FeatureSchema::loan_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::loan::{CohortMonth, Industry};
    use crate::types::PredictionRequest;

    #[test]
    fn test_feature_count() {
        let extractor = FeatureExtractor::default();
        // 3 scalar columns + 5 + 3 + 4 + 5 one-hot slots
        assert_eq!(extractor.feature_count(), 20);
        assert_eq!(extractor.feature_names().len(), 20);
        assert_eq!(extractor.feature_names()[3], "INDUSTRY=retail");
        assert_eq!(extractor.feature_names()[19], "COHORT_MONTH=2019-05");
    }

    #[test]
    fn test_feature_extraction() {
        let extractor = FeatureExtractor::default();
        let req = PredictionRequest {
            repeat_borrower: false,
            industry: Industry::Manufacturing,
            cohort_month: CohortMonth::May2019,
            ..Default::default()
        };

        let features = extractor.extract(&req.to_record()).unwrap();

        assert_eq!(features.len(), extractor.feature_count());
        assert_eq!(features[0], 500000.0); // loan amount
        assert_eq!(features[1], 180.0); // term
        assert_eq!(features[2], 0.0); // repeat borrower
        assert_eq!(&features[3..8], &[0.0, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(&features[8..11], &[1.0, 0.0, 0.0]);
        assert_eq!(&features[11..15], &[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(&features[15..20], &[0.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_extraction_rejects_missing_column() {
        let extractor = FeatureExtractor::default();
        let mut record = PredictionRequest::default().to_record();
        record.remove("LOAN_TERM_LENGTH");

        assert_eq!(
            extractor.extract(&record),
            Err(SchemaError::MissingColumn("LOAN_TERM_LENGTH".to_string()))
        );
    }
}
