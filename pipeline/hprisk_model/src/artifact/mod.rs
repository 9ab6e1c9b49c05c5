//! Locating, reading and unwrapping a model artifact on disk

mod format;
mod locate;
mod unwrap;

pub use format::ArtifactFormat;
pub use locate::{
    ArtifactLocator, DirectoryProbe, ProbeOutcome, Resolution, ResolvedArtifact,
    DEFAULT_EXTENSIONS,
};
pub use unwrap::{
    select_model, BundleItem, LoadedArtifact, Rejection, SelectedModel, SelectionRule,
};

use crate::error::ServiceError;
use std::fs;
use std::path::Path;

/// Reads the file at `path`, deserializes it by extension and selects the
/// model inside it.
pub fn load_artifact(path: &Path, strict_unwrap: bool) -> Result<SelectedModel, ServiceError> {
    let failed = |reason: String| ServiceError::ArtifactLoadFailed {
        path: path.to_path_buf(),
        reason,
    };
    let format = ArtifactFormat::from_path(path)
        .ok_or_else(|| failed("no deserializer registered for this extension".to_string()))?;
    let bytes = fs::read(path).map_err(|e| failed(e.to_string()))?;
    let value = format.read(&bytes).map_err(failed)?;
    let loaded = LoadedArtifact::from_value(&value).map_err(failed)?;
    select_model(loaded, strict_unwrap).map_err(|r| r.at(path))
}
