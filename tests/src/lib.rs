//! Shared fixtures for the cross-crate integration tests.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use hprisk_features::{FeatureField, RawAnswers};
use hprisk_model::{
    FeatureFrame, Model, ModelError, PredictedValue, ProbabilityScorer, ScalarPredictor,
};
use parking_lot::Mutex;
use serde_pickle::{HashableValue, SerOptions, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Once;

static INIT: Once = Once::new();

/// Routes `log` output through the test harness.
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .is_test(true)
            .try_init();
    });
}

/// Answers that encode to `[1, 0, 1, 3, 1]`.
pub fn reference_answers() -> RawAnswers {
    RawAnswers::default()
        .with(FeatureField::ToiletLid, "是")
        .with(FeatureField::ToiletType, "传统旱厕")
        .with(FeatureField::HouseOwnership, "租房")
        .with(FeatureField::SnackFrequency, "1-2次/周")
        .with(FeatureField::VegetablePurchase, "超市")
}

pub fn s(text: &str) -> Value {
    Value::String(text.to_string())
}

pub fn floats(values: &[f64]) -> Value {
    Value::List(values.iter().map(|v| Value::F64(*v)).collect())
}

pub fn dict(entries: Vec<(&str, Value)>) -> Value {
    Value::Dict(
        entries
            .into_iter()
            .map(|(k, v)| (HashableValue::String(k.to_string()), v))
            .collect(),
    )
}

pub fn estimator(class: &str, mut entries: Vec<(&str, Value)>) -> Value {
    entries.push(("__class__", s(class)));
    dict(entries)
}

fn canonical_labels() -> Value {
    Value::List(FeatureField::labels().iter().map(|l| s(l)).collect())
}

/// A regressor fitted on the canonical columns.
pub fn linear_regression(coef: [f64; 5], intercept: f64) -> Value {
    estimator(
        "LinearRegression",
        vec![
            ("coef_", floats(&coef)),
            ("intercept_", Value::F64(intercept)),
            ("feature_names_in_", canonical_labels()),
            ("n_features_in_", Value::I64(5)),
        ],
    )
}

/// A binary classifier fitted on the canonical columns.
pub fn logistic_regression(coef: [f64; 5], intercept: f64) -> Value {
    estimator(
        "LogisticRegression",
        vec![
            ("coef_", Value::List(vec![floats(&coef)])),
            ("intercept_", floats(&[intercept])),
            ("classes_", Value::List(vec![Value::I64(0), Value::I64(1)])),
            ("feature_names_in_", canonical_labels()),
        ],
    )
}

pub fn pickle_bytes(value: &Value) -> Vec<u8> {
    serde_pickle::value_to_vec(value, SerOptions::new()).expect("pickle")
}

/// Writes `value` as a pickle named `name` inside `dir`.
pub fn write_artifact(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, pickle_bytes(value)).expect("write artifact");
    path
}

/// Writes `value` zlib-compressed, as joblib does with `compress=True`.
pub fn write_compressed_artifact(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&pickle_bytes(value)).expect("compress");
    let path = dir.join(name);
    fs::write(&path, encoder.finish().expect("compress")).expect("write artifact");
    path
}

/// Scalar-only model that returns a fixed value and records every frame.
#[derive(Debug, Default)]
pub struct RecordingStub {
    pub value: f64,
    pub seen: Mutex<Vec<FeatureFrame>>,
}

impl RecordingStub {
    pub fn returning(value: f64) -> Self {
        Self {
            value,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn last_frame(&self) -> Option<FeatureFrame> {
        self.seen.lock().last().cloned()
    }
}

impl Model for RecordingStub {
    fn type_name(&self) -> &str {
        "RecordingStub"
    }

    fn scalar_predictor(&self) -> Option<&dyn ScalarPredictor> {
        Some(self)
    }
}

impl ScalarPredictor for RecordingStub {
    fn predict_scalar(&self, frame: &FeatureFrame) -> Result<Vec<PredictedValue>, ModelError> {
        self.seen.lock().push(frame.clone());
        Ok(vec![PredictedValue::Number(self.value)])
    }
}

/// Probability-only model with fixed output.
#[derive(Debug)]
pub struct FixedScorer(pub Vec<f64>);

impl Model for FixedScorer {
    fn type_name(&self) -> &str {
        "FixedScorer"
    }

    fn probability_scorer(&self) -> Option<&dyn ProbabilityScorer> {
        Some(self)
    }
}

impl ProbabilityScorer for FixedScorer {
    fn score_probabilities(&self, _frame: &FeatureFrame) -> Result<Vec<Vec<f64>>, ModelError> {
        Ok(vec![self.0.clone()])
    }
}
