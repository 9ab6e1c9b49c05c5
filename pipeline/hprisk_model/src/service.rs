//! The stateful inference service.
//!
//! An [`InferenceService`] is usable as soon as it is constructed. The first
//! call that needs the model resolves, reads and unwraps the artifact; the
//! outcome is cached for the lifetime of the instance. Every failure is
//! recorded and reported through [`InferenceService::info`] rather than
//! propagated out of [`InferenceService::predict`].

use crate::artifact::{load_artifact, DirectoryProbe, SelectedModel, SelectionRule};
use crate::bounded::run_bounded;
use crate::config::{ArtifactSource, ServiceConfig, ServiceOptions};
use crate::error::{ServiceError, Stage};
use crate::frame::FeatureFrame;
use crate::model::{Capabilities, Model};
use crate::prediction::Prediction;
use hprisk_features::{encode_all, FeatureVector, RawAnswers};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Value substituted for every missing slot before invocation.
pub const MISSING_FILL: f64 = 0.0;

/// Lifecycle of the cached model.
///
/// `Unloaded` covers both "never tried" and "no artifact could be found";
/// `LoadFailed` means an artifact was chosen but could not be used.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Unloaded,
    Loaded,
    LoadFailed(ServiceError),
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceState::Unloaded => f.write_str("unloaded"),
            ServiceState::Loaded => f.write_str("loaded"),
            ServiceState::LoadFailed(reason) => write!(f, "load failed: {reason}"),
        }
    }
}

/// Snapshot of the service for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub state: ServiceState,
    pub model_loaded: bool,
    pub artifact_path: Option<PathBuf>,
    pub active_dir: Option<PathBuf>,
    /// Type label of the selected object; the literal `"None"` when nothing
    /// is selected.
    pub model_type: String,
    pub capabilities: Option<Capabilities>,
    pub selection: Option<SelectionRule>,
    /// Directories probed by the most recent search.
    pub probes: Vec<DirectoryProbe>,
    pub last_error: Option<ServiceError>,
    pub load_attempts: u64,
}

#[derive(Debug)]
struct Inner {
    state: ServiceState,
    selected: Option<SelectedModel>,
    artifact_path: Option<PathBuf>,
    active_dir: Option<PathBuf>,
    probes: Vec<DirectoryProbe>,
    load_error: Option<ServiceError>,
    last_error: Option<ServiceError>,
}

impl Inner {
    fn unloaded() -> Self {
        Self {
            state: ServiceState::Unloaded,
            selected: None,
            artifact_path: None,
            active_dir: None,
            probes: Vec::new(),
            load_error: None,
            last_error: None,
        }
    }
}

/// What a load attempt found, whether or not it produced a model.
struct LoadOutcome {
    probes: Vec<DirectoryProbe>,
    active_dir: Option<PathBuf>,
    artifact_path: Option<PathBuf>,
    selected: Result<SelectedModel, ServiceError>,
}

fn attempt(source: ArtifactSource, strict_unwrap: bool) -> LoadOutcome {
    match source {
        ArtifactSource::File(path) => LoadOutcome {
            probes: Vec::new(),
            active_dir: path.parent().map(Path::to_path_buf),
            selected: load_artifact(&path, strict_unwrap),
            artifact_path: Some(path),
        },
        ArtifactSource::Search(locator) => {
            let resolution = locator.resolve();
            match resolution.result {
                Ok(found) => LoadOutcome {
                    probes: resolution.probes,
                    selected: load_artifact(&found.file, strict_unwrap),
                    active_dir: Some(found.dir),
                    artifact_path: Some(found.file),
                },
                Err(e) => LoadOutcome {
                    probes: resolution.probes,
                    active_dir: None,
                    artifact_path: None,
                    selected: Err(e),
                },
            }
        }
    }
}

/// Runs one record through whichever capability the model exposes,
/// preferring probabilities.
pub fn invoke(model: &dyn Model, frame: &FeatureFrame) -> Result<Prediction, ServiceError> {
    if let Some(scorer) = model.probability_scorer() {
        return scorer
            .score_probabilities(frame)?
            .into_iter()
            .next()
            .map(Prediction::Probabilities)
            .ok_or_else(|| ServiceError::InferenceFailed("estimator returned no rows".into()));
    }
    if let Some(predictor) = model.scalar_predictor() {
        return predictor
            .predict_scalar(frame)?
            .into_iter()
            .next()
            .map(Prediction::Value)
            .ok_or_else(|| ServiceError::InferenceFailed("estimator returned no rows".into()));
    }
    Err(ServiceError::ArtifactUnusable {
        type_name: model.type_name().to_string(),
    })
}

pub struct InferenceService {
    source: Option<ArtifactSource>,
    options: ServiceOptions,
    attempts: AtomicU64,
    inner: Mutex<Inner>,
}

impl fmt::Debug for InferenceService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceService")
            .field("source", &self.source)
            .field("options", &self.options)
            .field("state", &self.inner.lock().state)
            .finish()
    }
}

impl InferenceService {
    pub fn new(source: ArtifactSource, options: ServiceOptions) -> Self {
        let service = Self {
            source: Some(source),
            options,
            attempts: AtomicU64::new(0),
            inner: Mutex::new(Inner::unloaded()),
        };
        if options.eager_load {
            // failures are recorded and retried lazily
            let _ = service.load();
        }
        service
    }

    /// Builds the source from `config`; `cwd` is the directory probed last
    /// when `search_current_dir` is on.
    pub fn from_config(config: &ServiceConfig, cwd: Option<&Path>) -> Self {
        Self::new(config.artifact_source(cwd), config.options())
    }

    /// A service that is already Loaded with `model`.
    pub fn with_model(model: Arc<dyn Model>, options: ServiceOptions) -> Self {
        let mut inner = Inner::unloaded();
        inner.state = ServiceState::Loaded;
        inner.selected = Some(SelectedModel {
            model,
            rule: SelectionRule::Injected,
        });
        Self {
            source: None,
            options,
            attempts: AtomicU64::new(0),
            inner: Mutex::new(inner),
        }
    }

    pub fn state(&self) -> ServiceState {
        self.inner.lock().state.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.lock().state == ServiceState::Loaded
    }

    /// Attempts a load now unless one already succeeded.
    pub fn load(&self) -> Result<(), ServiceError> {
        let mut inner = self.inner.lock();
        if inner.selected.is_some() {
            return Ok(());
        }
        self.load_locked(&mut inner).map(|_| ())
    }

    fn ensure_loaded(&self) -> Result<Arc<dyn Model>, ServiceError> {
        let seen = self.attempts.load(Ordering::Acquire);
        let mut inner = self.inner.lock();
        if let Some(selected) = &inner.selected {
            return Ok(Arc::clone(&selected.model));
        }
        // An attempt finished while this caller waited for the lock: report
        // its outcome instead of starting another.
        if self.attempts.load(Ordering::Acquire) != seen {
            if let Some(e) = &inner.load_error {
                return Err(e.clone());
            }
        }
        self.load_locked(&mut inner)
    }

    fn load_locked(&self, inner: &mut Inner) -> Result<Arc<dyn Model>, ServiceError> {
        let Some(source) = self.source.clone() else {
            return Err(ServiceError::ArtifactUnusable {
                type_name: "None".to_string(),
            });
        };
        let strict = self.options.strict_unwrap;
        let outcome = run_bounded(Stage::Load, self.options.load_timeout, move || {
            Ok(attempt(source, strict))
        });
        self.attempts.fetch_add(1, Ordering::AcqRel);

        let selected = match outcome {
            Ok(outcome) => {
                inner.probes = outcome.probes;
                inner.active_dir = outcome.active_dir;
                inner.artifact_path = outcome.artifact_path;
                outcome.selected
            }
            Err(e) => Err(e),
        };
        match selected {
            Ok(selected) => {
                log::info!(
                    "loaded {} from {} ({})",
                    selected.model.type_name(),
                    inner
                        .artifact_path
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default(),
                    selected.rule
                );
                let model = Arc::clone(&selected.model);
                inner.state = ServiceState::Loaded;
                inner.selected = Some(selected);
                inner.load_error = None;
                Ok(model)
            }
            Err(e) => {
                log::warn!("model load failed: {e}");
                inner.state = if e.is_resolution_failure() {
                    ServiceState::Unloaded
                } else {
                    ServiceState::LoadFailed(e.clone())
                };
                inner.load_error = Some(e.clone());
                inner.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Scores one encoded record, reporting the reason on failure.
    pub fn try_predict(&self, vector: &FeatureVector) -> Result<Prediction, ServiceError> {
        let model = self.ensure_loaded()?;
        let frame = FeatureFrame::single_row(vector, MISSING_FILL);
        let result = run_bounded(Stage::Inference, self.options.inference_timeout, move || {
            invoke(model.as_ref(), &frame)
        });
        if let Err(e) = &result {
            log::warn!("inference failed: {e}");
            self.inner.lock().last_error = Some(e.clone());
        }
        result
    }

    /// Scores one encoded record; `None` when no result is available.
    pub fn predict(&self, vector: &FeatureVector) -> Option<Prediction> {
        self.try_predict(vector).ok()
    }

    /// Encodes `answers` and scores them.
    pub fn predict_answers(&self, answers: &RawAnswers) -> Option<Prediction> {
        self.predict(&encode_all(answers))
    }

    /// Current diagnostics. Never triggers a load.
    pub fn info(&self) -> ServiceInfo {
        let inner = self.inner.lock();
        let model = inner.selected.as_ref().map(|s| &s.model);
        ServiceInfo {
            state: inner.state.clone(),
            model_loaded: inner.selected.is_some(),
            artifact_path: inner.artifact_path.clone(),
            active_dir: inner.active_dir.clone(),
            model_type: model
                .map(|m| m.type_name().to_string())
                .unwrap_or_else(|| "None".to_string()),
            capabilities: model.map(|m| m.capabilities()),
            selection: inner.selected.as_ref().map(|s| s.rule),
            probes: inner.probes.clone(),
            last_error: inner.last_error.clone(),
            load_attempts: self.attempts.load(Ordering::Acquire),
        }
    }
}
