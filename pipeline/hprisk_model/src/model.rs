//! Capability interface for loaded model objects
//!
//! A loaded artifact is opaque: it may be a classifier, a regressor, or an
//! auxiliary object that was bundled with the model. Callers never inspect
//! its concrete type; they ask which capabilities it exposes.

use crate::error::ModelError;
use crate::frame::FeatureFrame;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-class probability output ("score").
pub trait ProbabilityScorer {
    /// One probability vector per row of `frame`.
    fn score_probabilities(&self, frame: &FeatureFrame) -> Result<Vec<Vec<f64>>, ModelError>;
}

/// Scalar or label output ("predict").
pub trait ScalarPredictor {
    /// One value per row of `frame`.
    fn predict_scalar(&self, frame: &FeatureFrame) -> Result<Vec<PredictedValue>, ModelError>;
}

/// Any object produced by deserializing an artifact.
pub trait Model: Send + Sync + fmt::Debug {
    /// Human-readable type label, e.g. `LogisticRegression` or `dict`.
    fn type_name(&self) -> &str;

    fn probability_scorer(&self) -> Option<&dyn ProbabilityScorer> {
        None
    }

    fn scalar_predictor(&self) -> Option<&dyn ScalarPredictor> {
        None
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            score: self.probability_scorer().is_some(),
            predict: self.scalar_predictor().is_some(),
        }
    }
}

/// Result of a capability probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub score: bool,
    pub predict: bool,
}

impl Capabilities {
    /// Whether the object can produce any prediction at all.
    pub fn any(&self) -> bool {
        self.score || self.predict
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.score, self.predict) {
            (true, true) => f.write_str("score+predict"),
            (true, false) => f.write_str("score"),
            (false, true) => f.write_str("predict"),
            (false, false) => f.write_str("none"),
        }
    }
}

/// A single `predict` output: numeric for regressors and numeric class
/// labels, text for string class labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictedValue {
    Number(f64),
    Label(String),
}

impl PredictedValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PredictedValue::Number(v) => Some(*v),
            PredictedValue::Label(s) => s.parse().ok(),
        }
    }
}

impl fmt::Display for PredictedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictedValue::Number(v) => write!(f, "{v}"),
            PredictedValue::Label(s) => f.write_str(s),
        }
    }
}

/// Checks a frame against the column count and, when the estimator was fit
/// on named columns, against those names.
pub(crate) fn check_frame(
    frame: &FeatureFrame,
    n_features: usize,
    feature_names: Option<&[String]>,
) -> Result<(), ModelError> {
    if frame.n_columns() != n_features {
        return Err(ModelError::ShapeMismatch {
            expected: n_features,
            got: frame.n_columns(),
        });
    }
    if let Some(row) = frame.rows().iter().find(|r| r.len() != n_features) {
        return Err(ModelError::ShapeMismatch {
            expected: n_features,
            got: row.len(),
        });
    }
    if let Some(names) = feature_names {
        if names != frame.columns() {
            return Err(ModelError::FeatureNames {
                expected: names.to_vec(),
                got: frame.columns().to_vec(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Aux;

    impl Model for Aux {
        fn type_name(&self) -> &str {
            "LabelEncoder"
        }
    }

    #[test]
    fn default_capabilities_are_empty() {
        let caps = Aux.capabilities();
        assert!(!caps.any());
        assert_eq!(caps.to_string(), "none");
    }

    #[test]
    fn check_frame_rejects_renamed_columns() {
        let frame = FeatureFrame::new(vec!["a".into(), "b".into()], vec![vec![1.0, 2.0]]);
        assert!(check_frame(&frame, 2, None).is_ok());
        let names = vec!["a".to_string(), "c".to_string()];
        assert!(matches!(
            check_frame(&frame, 2, Some(&names)),
            Err(ModelError::FeatureNames { .. })
        ));
        assert_eq!(
            check_frame(&frame, 3, None),
            Err(ModelError::ShapeMismatch { expected: 3, got: 2 })
        );
    }

    #[test]
    fn label_values_parse_when_numeric() {
        assert_eq!(PredictedValue::Label("1".into()).as_f64(), Some(1.0));
        assert_eq!(PredictedValue::Label("positive".into()).as_f64(), None);
    }
}
