use super::{
    argmax, as_f64_vec, as_matrix, as_str, classes, feature_names, get, require, Dict,
};
use crate::error::ModelError;
use crate::frame::FeatureFrame;
use crate::model::{check_frame, Model, PredictedValue, ProbabilityScorer, ScalarPredictor};

/// How a multi-class logistic model turns decision values into probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MultiClass {
    Multinomial,
    OneVsRest,
}

/// Fitted logistic regression: `score` and `predict`.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
    classes: Vec<PredictedValue>,
    feature_names: Option<Vec<String>>,
    multi_class: MultiClass,
}

impl LogisticRegression {
    pub(crate) fn from_dict(dict: &Dict) -> Result<Self, String> {
        const CLASS: &str = "LogisticRegression";
        let coef = as_matrix(require(dict, CLASS, "coef_")?)
            .ok_or_else(|| format!("{CLASS}: `coef_` must be a numeric matrix"))?;
        if coef.is_empty() || coef[0].is_empty() {
            return Err(format!("{CLASS}: `coef_` is empty"));
        }
        let width = coef[0].len();
        if coef.iter().any(|row| row.len() != width) {
            return Err(format!("{CLASS}: `coef_` rows differ in length"));
        }
        let intercept = match get(dict, "intercept_") {
            Some(v) => as_f64_vec(v)
                .ok_or_else(|| format!("{CLASS}: `intercept_` must be numeric"))?,
            None => vec![0.0; coef.len()],
        };
        if intercept.len() != coef.len() {
            return Err(format!(
                "{CLASS}: {} intercepts for {} coefficient rows",
                intercept.len(),
                coef.len()
            ));
        }
        let n_classes = if coef.len() == 1 { 2 } else { coef.len() };
        let classes = classes(dict, CLASS, n_classes)?;
        if classes.len() != n_classes {
            return Err(format!(
                "{CLASS}: {} classes for {} coefficient rows",
                classes.len(),
                coef.len()
            ));
        }
        let multi_class = match get(dict, "multi_class").and_then(as_str) {
            Some("ovr") => MultiClass::OneVsRest,
            _ => MultiClass::Multinomial,
        };
        Ok(Self {
            coef,
            intercept,
            classes,
            feature_names: feature_names(dict, CLASS)?,
            multi_class,
        })
    }

    fn n_features(&self) -> usize {
        self.coef[0].len()
    }

    fn decision(&self, row: &[f64]) -> Vec<f64> {
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(w, b)| dot(w, row) + b)
            .collect()
    }

    fn row_probabilities(&self, row: &[f64]) -> Vec<f64> {
        let z = self.decision(row);
        if z.len() == 1 {
            let p = sigmoid(z[0]);
            return vec![1.0 - p, p];
        }
        match self.multi_class {
            MultiClass::Multinomial => softmax(&z),
            MultiClass::OneVsRest => {
                let raw: Vec<f64> = z.iter().map(|v| sigmoid(*v)).collect();
                let total: f64 = raw.iter().sum();
                raw.iter().map(|p| p / total).collect()
            }
        }
    }
}

impl Model for LogisticRegression {
    fn type_name(&self) -> &str {
        "LogisticRegression"
    }

    fn probability_scorer(&self) -> Option<&dyn ProbabilityScorer> {
        Some(self)
    }

    fn scalar_predictor(&self) -> Option<&dyn ScalarPredictor> {
        Some(self)
    }
}

impl ProbabilityScorer for LogisticRegression {
    fn score_probabilities(&self, frame: &FeatureFrame) -> Result<Vec<Vec<f64>>, ModelError> {
        check_frame(frame, self.n_features(), self.feature_names.as_deref())?;
        Ok(frame
            .rows()
            .iter()
            .map(|row| self.row_probabilities(row))
            .collect())
    }
}

impl ScalarPredictor for LogisticRegression {
    fn predict_scalar(&self, frame: &FeatureFrame) -> Result<Vec<PredictedValue>, ModelError> {
        Ok(self
            .score_probabilities(frame)?
            .iter()
            .map(|p| self.classes[argmax(p)].clone())
            .collect())
    }
}

/// Fitted linear regressor (`LinearRegression`, `Ridge`, `Lasso`): `predict` only.
#[derive(Debug, Clone)]
pub struct LinearRegression {
    class: String,
    coef: Vec<f64>,
    intercept: f64,
    feature_names: Option<Vec<String>>,
}

impl LinearRegression {
    pub(crate) fn from_dict(class: &str, dict: &Dict) -> Result<Self, String> {
        let coef = as_matrix(require(dict, class, "coef_")?)
            .ok_or_else(|| format!("{class}: `coef_` must be numeric"))?;
        let [coef] = <[Vec<f64>; 1]>::try_from(coef)
            .map_err(|_| format!("{class}: only single-target models are supported"))?;
        if coef.is_empty() {
            return Err(format!("{class}: `coef_` is empty"));
        }
        let intercept = match get(dict, "intercept_") {
            Some(v) => match as_f64_vec(v).as_deref() {
                Some([b]) => *b,
                _ => return Err(format!("{class}: `intercept_` must be a single number")),
            },
            None => 0.0,
        };
        Ok(Self {
            class: class.to_string(),
            coef,
            intercept,
            feature_names: feature_names(dict, class)?,
        })
    }
}

impl Model for LinearRegression {
    fn type_name(&self) -> &str {
        &self.class
    }

    fn scalar_predictor(&self) -> Option<&dyn ScalarPredictor> {
        Some(self)
    }
}

impl ScalarPredictor for LinearRegression {
    fn predict_scalar(&self, frame: &FeatureFrame) -> Result<Vec<PredictedValue>, ModelError> {
        check_frame(frame, self.coef.len(), self.feature_names.as_deref())?;
        Ok(frame
            .rows()
            .iter()
            .map(|row| PredictedValue::Number(dot(&self.coef, row) + self.intercept))
            .collect())
    }
}

fn dot(w: &[f64], x: &[f64]) -> f64 {
    w.iter().zip(x).map(|(a, b)| a * b).sum()
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn softmax(z: &[f64]) -> Vec<f64> {
    let max = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp: Vec<f64> = z.iter().map(|v| (v - max).exp()).collect();
    let total: f64 = exp.iter().sum();
    exp.iter().map(|e| e / total).collect()
}
