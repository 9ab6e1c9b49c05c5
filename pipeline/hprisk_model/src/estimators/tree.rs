use super::{
    argmax, as_f64_vec, as_i64, as_i64_vec, as_seq, classes, feature_names, flatten_f64, get,
    require, Dict,
};
use crate::error::ModelError;
use crate::frame::FeatureFrame;
use crate::model::{check_frame, Model, PredictedValue, ProbabilityScorer, ScalarPredictor};
use serde_pickle::Value;

const LEAF: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeKind {
    Classifier,
    Regressor,
}

impl TreeKind {
    fn class_name(self) -> &'static str {
        match self {
            TreeKind::Classifier => "DecisionTreeClassifier",
            TreeKind::Regressor => "DecisionTreeRegressor",
        }
    }
}

/// Fitted decision tree in scikit-learn's flat-array layout.
///
/// A sample goes left when `x[feature] <= threshold`. Classifiers expose
/// `score` and `predict`; regressors expose `predict`.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    kind: TreeKind,
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<i64>,
    threshold: Vec<f64>,
    value: Vec<Vec<f64>>,
    classes: Vec<PredictedValue>,
    n_features: Option<usize>,
    feature_names: Option<Vec<String>>,
}

impl DecisionTree {
    pub(crate) fn from_dict(kind: TreeKind, dict: &Dict) -> Result<Self, String> {
        let class = kind.class_name();
        let Value::Dict(tree) = require(dict, class, "tree_")? else {
            return Err(format!("{class}: `tree_` must be a dict"));
        };
        let ints = |key: &str| -> Result<Vec<i64>, String> {
            as_i64_vec(require(tree, class, key)?)
                .ok_or_else(|| format!("{class}: `tree_.{key}` must be a list of integers"))
        };
        let children_left = ints("children_left")?;
        let children_right = ints("children_right")?;
        let feature = ints("feature")?;
        let threshold = require(tree, class, "threshold")
            .ok()
            .and_then(as_f64_vec)
            .ok_or_else(|| format!("{class}: `tree_.threshold` must be numeric"))?;
        let value = as_seq(require(tree, class, "value")?)
            .and_then(|nodes| {
                nodes
                    .iter()
                    .map(|node| {
                        let mut out = Vec::new();
                        flatten_f64(node, &mut out).map(|_| out)
                    })
                    .collect::<Option<Vec<_>>>()
            })
            .ok_or_else(|| format!("{class}: `tree_.value` must be numeric"))?;

        let n_nodes = children_left.len();
        if n_nodes == 0 {
            return Err(format!("{class}: tree has no nodes"));
        }
        if [children_right.len(), feature.len(), threshold.len(), value.len()]
            .iter()
            .any(|len| *len != n_nodes)
        {
            return Err(format!("{class}: tree arrays differ in length"));
        }
        for (node, (&l, &r)) in children_left.iter().zip(&children_right).enumerate() {
            let in_range = |c: i64| c == LEAF || (0..n_nodes as i64).contains(&c);
            if !in_range(l) || !in_range(r) || (l == LEAF) != (r == LEAF) {
                return Err(format!("{class}: node {node} has invalid children ({l}, {r})"));
            }
            if l != LEAF && feature[node] < 0 {
                return Err(format!("{class}: split node {node} has no feature"));
            }
            if value[node].is_empty() {
                return Err(format!("{class}: node {node} has no value"));
            }
        }

        let n_outputs = value[0].len();
        if let Some(node) = value.iter().position(|v| v.len() != n_outputs) {
            return Err(format!(
                "{class}: node {node} has {} value entries, node 0 has {n_outputs}",
                value[node].len()
            ));
        }
        let classes = match kind {
            TreeKind::Classifier => {
                let classes = classes(dict, class, n_outputs)?;
                if classes.len() != n_outputs {
                    return Err(format!(
                        "{class}: {} classes but node values have {n_outputs} entries",
                        classes.len()
                    ));
                }
                classes
            }
            TreeKind::Regressor => Vec::new(),
        };
        let n_features = match get(dict, "n_features_in_") {
            Some(v) => Some(
                as_i64(v)
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| format!("{class}: `n_features_in_` must be a count"))?,
            ),
            None => None,
        };

        Ok(Self {
            kind,
            children_left,
            children_right,
            feature,
            threshold,
            value,
            classes,
            n_features,
            feature_names: feature_names(dict, class)?,
        })
    }

    fn leaf_for(&self, row: &[f64]) -> Result<usize, ModelError> {
        let mut node = 0usize;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..self.children_left.len() {
            if self.children_left[node] == LEAF {
                return Ok(node);
            }
            let feature = self.feature[node] as usize;
            let x = *row.get(feature).ok_or(ModelError::ShapeMismatch {
                expected: feature + 1,
                got: row.len(),
            })?;
            let next = if x <= self.threshold[node] {
                self.children_left[node]
            } else {
                self.children_right[node]
            };
            node = next as usize;
        }
        Err(ModelError::InvalidParameters("tree contains a cycle".to_string()))
    }

    /// Column checks; the width falls back to the fitted names when
    /// `n_features_in_` was not recorded.
    fn check(&self, frame: &FeatureFrame) -> Result<(), ModelError> {
        let names = self.feature_names.as_deref();
        match self.n_features.or(names.map(<[String]>::len)) {
            Some(n) => check_frame(frame, n, names),
            None => Ok(()),
        }
    }

    fn leaf_probabilities(&self, leaf: usize) -> Vec<f64> {
        let counts = &self.value[leaf];
        let total: f64 = counts.iter().sum();
        if total > 0.0 {
            counts.iter().map(|c| c / total).collect()
        } else {
            counts.clone()
        }
    }
}

impl Model for DecisionTree {
    fn type_name(&self) -> &str {
        self.kind.class_name()
    }

    fn probability_scorer(&self) -> Option<&dyn ProbabilityScorer> {
        match self.kind {
            TreeKind::Classifier => Some(self),
            TreeKind::Regressor => None,
        }
    }

    fn scalar_predictor(&self) -> Option<&dyn ScalarPredictor> {
        Some(self)
    }
}

impl ProbabilityScorer for DecisionTree {
    fn score_probabilities(&self, frame: &FeatureFrame) -> Result<Vec<Vec<f64>>, ModelError> {
        self.check(frame)?;
        frame
            .rows()
            .iter()
            .map(|row| -> Result<Vec<f64>, ModelError> {
                Ok(self.leaf_probabilities(self.leaf_for(row)?))
            })
            .collect()
    }
}

impl ScalarPredictor for DecisionTree {
    fn predict_scalar(&self, frame: &FeatureFrame) -> Result<Vec<PredictedValue>, ModelError> {
        self.check(frame)?;
        frame
            .rows()
            .iter()
            .map(|row| -> Result<PredictedValue, ModelError> {
                let leaf = self.leaf_for(row)?;
                match self.kind {
                    TreeKind::Classifier => {
                        let best = argmax(&self.leaf_probabilities(leaf));
                        self.classes.get(best).cloned().ok_or_else(|| {
                            ModelError::InvalidParameters(format!(
                                "leaf {leaf} has no class for entry {best}"
                            ))
                        })
                    }
                    TreeKind::Regressor => Ok(PredictedValue::Number(self.value[leaf][0])),
                }
            })
            .collect()
    }
}
