use hprisk_features::{encode_all, FeatureField, FeatureVector, RawAnswers};
use hprisk_model::{
    ArtifactLocator, ArtifactSource, InferenceService, PredictedValue, Prediction, SelectionRule,
    ServiceOptions, ServiceState, Verdict,
};
use hprisk_tests::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn search(dir: &std::path::Path) -> InferenceService {
    InferenceService::new(
        ArtifactSource::Search(ArtifactLocator::new(vec![dir.to_path_buf()])),
        ServiceOptions::default(),
    )
}

#[test]
fn reference_record_reaches_the_model_labeled() {
    init_test_logger();
    let stub = Arc::new(RecordingStub::returning(0.42));
    let service = InferenceService::with_model(stub.clone(), ServiceOptions::default());

    let vector = encode_all(&reference_answers());
    assert_eq!(
        vector,
        FeatureVector::from_values([1.0, 0.0, 1.0, 3.0, 1.0])
    );

    let prediction = service.predict(&vector).unwrap();
    assert_eq!(prediction, Prediction::Value(PredictedValue::Number(0.42)));
    assert_eq!(prediction.verdict(), Some(Verdict::Negative));

    let frame = stub.last_frame().unwrap();
    assert_eq!(frame.columns().to_vec(), FeatureField::labels().map(String::from).to_vec());
    assert_eq!(frame.rows(), &[vec![1.0, 0.0, 1.0, 3.0, 1.0]]);
}

#[test]
fn missing_slots_are_imputed_to_zero() {
    let stub = Arc::new(RecordingStub::returning(1.0));
    let service = InferenceService::with_model(stub.clone(), ServiceOptions::default());

    let answers = RawAnswers::default()
        .with(FeatureField::ToiletLid, "未填")
        .with(FeatureField::HouseOwnership, "自建房")
        .with(FeatureField::SnackFrequency, "未填");
    let vector = encode_all(&answers);
    assert_eq!(
        vector.missing(),
        vec![FeatureField::ToiletLid, FeatureField::SnackFrequency]
    );

    service.predict(&vector).unwrap();
    assert_eq!(stub.last_frame().unwrap().rows(), &[vec![0.0, 0.0, 2.0, 0.0, 0.0]]);
}

#[test]
fn pickled_regressor_scores_the_reference_record() {
    init_test_logger();
    let tmp = tempfile::tempdir().unwrap();
    write_artifact(tmp.path(), "hp_risk.pkl", &linear_regression([0.0; 5], 0.42));
    let service = search(tmp.path());

    let prediction = service.predict_answers(&reference_answers()).unwrap();
    assert_eq!(prediction, Prediction::Value(PredictedValue::Number(0.42)));

    let info = service.info();
    assert_eq!(info.state, ServiceState::Loaded);
    assert_eq!(info.model_type, "LinearRegression");
    assert_eq!(info.selection, Some(SelectionRule::Direct));
}

#[test]
fn classifier_returns_both_class_probabilities() {
    let tmp = tempfile::tempdir().unwrap();
    // positive class driven by snack frequency
    write_artifact(
        tmp.path(),
        "hp_risk.pickle",
        &logistic_regression([0.0, 0.0, 0.0, 1.0, 0.0], -2.0),
    );
    let service = search(tmp.path());

    let prediction = service.predict_answers(&reference_answers()).unwrap();
    let Prediction::Probabilities(p) = &prediction else {
        panic!("expected probabilities, got {prediction:?}");
    };
    assert_eq!(p.len(), 2);
    assert!((p[0] + p[1] - 1.0).abs() < 1e-12);
    let expected = 1.0 / (1.0 + (-1.0f64).exp());
    assert!((p[1] - expected).abs() < 1e-12);
    assert_eq!(prediction.verdict(), Some(Verdict::Positive));
}

#[test]
fn compressed_joblib_artifact_loads() {
    let tmp = tempfile::tempdir().unwrap();
    write_compressed_artifact(tmp.path(), "hp_risk.joblib", &linear_regression([0.1; 5], 0.0));
    let service = search(tmp.path());

    let prediction = service.predict_answers(&reference_answers()).unwrap();
    let Prediction::Value(PredictedValue::Number(v)) = prediction else {
        panic!("expected a number");
    };
    assert!((v - 0.6).abs() < 1e-12);
}

#[test]
fn renamed_columns_fail_inference_without_panicking() {
    let tmp = tempfile::tempdir().unwrap();
    let model = estimator(
        "LinearRegression",
        vec![
            ("coef_", floats(&[0.0; 5])),
            ("intercept_", floats(&[0.0])),
            (
                "feature_names_in_",
                serde_pickle::Value::List(
                    ["lid", "toilet", "house", "snack", "veg"].iter().map(|n| s(n)).collect(),
                ),
            ),
        ],
    );
    write_artifact(tmp.path(), "hp_risk.pkl", &model);
    let service = search(tmp.path());

    assert_eq!(service.predict(&FeatureVector::empty()), None);
    let info = service.info();
    assert_eq!(info.state, ServiceState::Loaded);
    let error = info.last_error.unwrap().to_string();
    assert!(error.starts_with("inference failed"), "{error}");
}
