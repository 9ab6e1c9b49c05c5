//! Labeled tabular input handed to estimators.

use hprisk_features::{FeatureField, FeatureVector};

/// Rows of numeric features under named columns.
///
/// The service always builds a single row whose columns are the canonical
/// questionnaire labels, which is the calling convention the artifact was
/// trained with.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureFrame {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Self {
        Self { columns, rows }
    }

    /// One labeled row from an encoded vector, missing slots imputed to `fill`.
    pub fn single_row(vector: &FeatureVector, fill: f64) -> Self {
        Self {
            columns: FeatureField::labels().iter().map(|s| s.to_string()).collect(),
            rows: vec![vector.impute(fill).to_vec()],
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }
}
