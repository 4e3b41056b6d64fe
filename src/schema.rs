//! Single-row records and the input schema a model declares.
//!
//! A [`Record`] is what the form produces; a [`FeatureSchema`] is what the
//! persisted model expects. The two are checked against each other before
//! every inference call so that a drift in column names, kinds or category
//! sets fails with a descriptive error instead of inside the model runtime.

use crate::error::SchemaError;
use crate::types::loan::{columns, Category, CohortMonth, CompanyType, Industry, Segment};
use serde::{Deserialize, Serialize};

/// One typed cell of a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Boolean(bool),
    Integer(i64),
    Number(f64),
    Category(String),
}

impl Cell {
    pub fn category<C: Category>(value: C) -> Self {
        Cell::Category(value.as_ref().to_string())
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Cell::Boolean(_) => "boolean",
            Cell::Integer(_) => "integer",
            Cell::Number(_) => "numeric",
            Cell::Category(_) => "categorical",
        }
    }
}

/// A single-row tabular record with named columns, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    cells: Vec<(String, Cell)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column, replacing any previous value under the same name
    pub fn insert(&mut self, name: &str, cell: Cell) {
        match self.cells.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = cell,
            None => self.cells.push((name.to_string(), cell)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Cell> {
        let idx = self.cells.iter().position(|(n, _)| n == name)?;
        Some(self.cells.remove(idx).1)
    }

    pub fn get(&self, name: &str) -> Option<&Cell> {
        self.cells.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.cells.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.cells.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Kind of value a column holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Integer,
    Boolean,
    Categorical { categories: Vec<String> },
}

impl ColumnKind {
    fn name(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Integer => "integer",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Categorical { .. } => "categorical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub fn new(name: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }

    fn categorical<C: Category>(name: &str) -> Self {
        Self::new(
            name,
            ColumnKind::Categorical {
                categories: C::options(),
            },
        )
    }
}

/// Ordered list of the columns a model expects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub columns: Vec<ColumnSpec>,
}

impl FeatureSchema {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self { columns }
    }

    /// Schema of the loan default model.
    pub fn loan_default() -> Self {
        Self::new(vec![
            ColumnSpec::new(columns::INITIAL_LOAN_AMOUNT, ColumnKind::Numeric),
            ColumnSpec::new(columns::LOAN_TERM_LENGTH, ColumnKind::Integer),
            ColumnSpec::new(columns::REPEAT_BORROWER, ColumnKind::Boolean),
            ColumnSpec::categorical::<Industry>(columns::INDUSTRY),
            ColumnSpec::categorical::<CompanyType>(columns::COMPANY_TYPE),
            ColumnSpec::categorical::<Segment>(columns::SEGMENT),
            ColumnSpec::categorical::<CohortMonth>(columns::COHORT_MONTH),
        ])
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Check that `record` has exactly the declared columns with matching kinds.
    ///
    /// Integer cells are accepted for numeric columns; nothing else is coerced.
    pub fn validate(&self, record: &Record) -> Result<(), SchemaError> {
        for (name, _) in record.iter() {
            if self.column(name).is_none() {
                return Err(SchemaError::UnexpectedColumn(name.to_string()));
            }
        }

        for spec in &self.columns {
            let cell = record
                .get(&spec.name)
                .ok_or_else(|| SchemaError::MissingColumn(spec.name.clone()))?;

            match (&spec.kind, cell) {
                // Features are encoded as f32
                (ColumnKind::Numeric, Cell::Number(v))
                    if !v.is_finite() || !(*v as f32).is_finite() =>
                {
                    return Err(SchemaError::NonFinite(spec.name.clone()));
                }
                (ColumnKind::Numeric, Cell::Number(_) | Cell::Integer(_)) => {}
                (ColumnKind::Integer, Cell::Integer(_)) => {}
                (ColumnKind::Boolean, Cell::Boolean(_)) => {}
                (ColumnKind::Categorical { categories }, Cell::Category(value)) => {
                    if !categories.iter().any(|c| c == value) {
                        return Err(SchemaError::UnknownCategory {
                            column: spec.name.clone(),
                            value: value.clone(),
                        });
                    }
                }
                (kind, cell) => {
                    return Err(SchemaError::TypeMismatch {
                        column: spec.name.clone(),
                        expected: kind.name(),
                        found: cell.kind_name(),
                    });
                }
            }
        }

        Ok(())
    }
}
