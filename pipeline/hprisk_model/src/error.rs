//! Error types for artifact loading and inference

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Operation bounded by a timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Load,
    Inference,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Load => f.write_str("artifact load"),
            Stage::Inference => f.write_str("inference"),
        }
    }
}

/// Failures of the inference service.
///
/// None of these escape [`InferenceService::predict`](crate::InferenceService::predict);
/// they are recorded and reported through [`ServiceInfo`](crate::ServiceInfo).
#[derive(Debug, Clone, Error, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceError {
    #[error("no candidate model directory exists (searched: {})", join_paths(.searched))]
    DirectoryNotFound { searched: Vec<PathBuf> },
    #[error("no artifact with a recognized extension found (searched: {})", join_paths(.searched))]
    ArtifactNotFound { searched: Vec<PathBuf> },
    #[error("failed to load artifact {}: {reason}", .path.display())]
    ArtifactLoadFailed { path: PathBuf, reason: String },
    #[error("selected object `{type_name}` exposes neither probability nor scalar output")]
    ArtifactUnusable { type_name: String },
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("{stage} timed out after {after:?}")]
    TimedOut { stage: Stage, after: Duration },
    /// The worker running a bounded operation ended without a result.
    #[error("{stage} worker failed: {reason}")]
    WorkerFailed { stage: Stage, reason: String },
}

impl ServiceError {
    /// Whether the failure happened before any artifact file was chosen.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            ServiceError::DirectoryNotFound { .. } | ServiceError::ArtifactNotFound { .. }
        )
    }
}

/// Errors raised by an estimator while scoring a record.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    #[error("expected {expected} features, got {got}")]
    ShapeMismatch { expected: usize, got: usize },
    #[error("feature names do not match those seen at fit time: expected {expected:?}, got {got:?}")]
    FeatureNames {
        expected: Vec<String>,
        got: Vec<String>,
    },
    #[error("invalid model parameters: {0}")]
    InvalidParameters(String),
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        ServiceError::InferenceFailed(e.to_string())
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "<none>".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
