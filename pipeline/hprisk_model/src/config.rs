//! Service configuration, read from the `[model]` table of `hprisk.toml`.

use crate::artifact::{ArtifactLocator, DEFAULT_EXTENSIONS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Where the service gets its artifact from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    /// A fixed file; no directory search.
    File(PathBuf),
    /// Probe candidate directories in order.
    Search(ArtifactLocator),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Load this file directly instead of searching.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_file: Option<PathBuf>,
    /// First candidate directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_dir: Option<PathBuf>,
    /// Further candidates, probed after `model_dir`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fallback_dirs: Vec<PathBuf>,
    /// Probe the caller's working directory last.
    pub search_current_dir: bool,
    pub extensions: Vec<String>,
    /// Attempt a load at construction instead of on first use.
    pub eager_load: bool,
    /// Reject bundles in which no element is capable.
    pub strict_unwrap: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inference_timeout_ms: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_file: None,
            model_dir: None,
            fallback_dirs: Vec::new(),
            search_current_dir: true,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            eager_load: false,
            strict_unwrap: false,
            load_timeout_ms: None,
            inference_timeout_ms: None,
        }
    }
}

/// Runtime switches derived from [`ServiceConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceOptions {
    pub eager_load: bool,
    pub strict_unwrap: bool,
    pub load_timeout: Option<Duration>,
    pub inference_timeout: Option<Duration>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    model: ServiceConfig,
}

impl ServiceConfig {
    /// Parses the `[model]` table; relative paths stay as written.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text)?;
        file.model.validate()?;
        Ok(file.model)
    }

    /// Reads a config file. Relative paths in it are taken relative to the
    /// file's own directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.extensions.iter().all(|e| e.trim_start_matches('.').is_empty()) {
            return Err(ConfigError::Invalid(
                "`extensions` must name at least one extension".to_string(),
            ));
        }
        if self.load_timeout_ms == Some(0) || self.inference_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid("timeouts must be positive".to_string()));
        }
        Ok(())
    }

    fn rebase(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        self.model_file.iter_mut().for_each(join);
        self.model_dir.iter_mut().for_each(join);
        self.fallback_dirs.iter_mut().for_each(join);
    }

    /// Ordered candidate directories: `model_dir`, the fallbacks, then `cwd`
    /// when `search_current_dir` is on and one is supplied.
    pub fn candidate_dirs(&self, cwd: Option<&Path>) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.model_dir.iter().cloned().collect();
        dirs.extend(self.fallback_dirs.iter().cloned());
        if self.search_current_dir {
            dirs.extend(cwd.map(Path::to_path_buf));
        }
        dirs
    }

    pub fn artifact_source(&self, cwd: Option<&Path>) -> ArtifactSource {
        match &self.model_file {
            Some(file) => ArtifactSource::File(file.clone()),
            None => ArtifactSource::Search(ArtifactLocator::with_extensions(
                self.candidate_dirs(cwd),
                self.extensions.clone(),
            )),
        }
    }

    pub fn options(&self) -> ServiceOptions {
        ServiceOptions {
            eager_load: self.eager_load,
            strict_unwrap: self.strict_unwrap,
            load_timeout: self.load_timeout_ms.map(Duration::from_millis),
            inference_timeout: self.inference_timeout_ms.map(Duration::from_millis),
        }
    }
}
