//! Candidate-directory probing and artifact file discovery.

use crate::error::ServiceError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Recognized artifact extensions, in the order they are listed by default.
pub const DEFAULT_EXTENSIONS: [&str; 4] = ["joblib", "pkl", "pickle", "model"];

/// What probing one candidate directory found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// The path does not exist or is not a directory.
    Missing,
    /// The directory could not be listed.
    Unreadable(String),
    /// The directory holds no file with a recognized extension.
    NoArtifacts,
    /// The directory was chosen; holds the artifact file found in it.
    Selected(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryProbe {
    pub dir: PathBuf,
    pub outcome: ProbeOutcome,
}

/// Outcome of a full resolution pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Probes in candidate order, up to and including the selected one.
    pub probes: Vec<DirectoryProbe>,
    pub result: Result<ResolvedArtifact, ServiceError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub dir: PathBuf,
    pub file: PathBuf,
}

/// Probes an explicit, ordered list of candidate directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocator {
    candidates: Vec<PathBuf>,
    extensions: Vec<String>,
}

impl ArtifactLocator {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self::with_extensions(
            candidates,
            DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        )
    }

    /// `extensions` are given without the leading dot.
    pub fn with_extensions(candidates: Vec<PathBuf>, extensions: Vec<String>) -> Self {
        let extensions = extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_string())
            .filter(|e| !e.is_empty())
            .collect();
        Self {
            candidates,
            extensions,
        }
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Whether the file name ends with `.<ext>` for a recognized extension.
    pub fn is_recognized(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        self.extensions.iter().any(|ext| {
            name.len() > ext.len()
                && name.ends_with(ext.as_str())
                && name[..name.len() - ext.len()].ends_with('.')
        })
    }

    /// First recognized file in `dir`, in directory-listing order.
    pub fn first_artifact_in(&self, dir: &Path) -> io::Result<Option<PathBuf>> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && self.is_recognized(&path) {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    /// Selects the first candidate that exists and holds an artifact.
    ///
    /// Later candidates are not probed once one matches.
    pub fn resolve(&self) -> Resolution {
        let mut probes = Vec::new();
        let mut existing = Vec::new();
        for dir in &self.candidates {
            let outcome = if !dir.is_dir() {
                ProbeOutcome::Missing
            } else {
                existing.push(dir.clone());
                match self.first_artifact_in(dir) {
                    Ok(Some(file)) => ProbeOutcome::Selected(file),
                    Ok(None) => ProbeOutcome::NoArtifacts,
                    Err(e) => ProbeOutcome::Unreadable(e.to_string()),
                }
            };
            log::debug!("probe {}: {:?}", dir.display(), outcome);
            let selected = match &outcome {
                ProbeOutcome::Selected(file) => Some(file.clone()),
                _ => None,
            };
            probes.push(DirectoryProbe {
                dir: dir.clone(),
                outcome,
            });
            if let Some(file) = selected {
                return Resolution {
                    probes,
                    result: Ok(ResolvedArtifact {
                        dir: dir.clone(),
                        file,
                    }),
                };
            }
        }
        let result = if existing.is_empty() {
            Err(ServiceError::DirectoryNotFound {
                searched: self.candidates.clone(),
            })
        } else {
            Err(ServiceError::ArtifactNotFound { searched: existing })
        };
        Resolution { probes, result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn recognizes_by_name_suffix() {
        let locator = ArtifactLocator::new(vec![]);
        assert!(locator.is_recognized(Path::new("models/risk.joblib")));
        assert!(locator.is_recognized(Path::new("risk.v2.pkl")));
        assert!(locator.is_recognized(Path::new("m.model")));
        assert!(!locator.is_recognized(Path::new("risk.json")));
        assert!(!locator.is_recognized(Path::new("notes_pkl")));
        assert!(!locator.is_recognized(Path::new("risk.PKL")));
    }

    #[test]
    fn custom_extensions_strip_leading_dot() {
        let locator = ArtifactLocator::with_extensions(vec![], vec![".bin".into(), "".into()]);
        assert_eq!(locator.extensions(), &["bin".to_string()]);
        assert!(locator.is_recognized(Path::new("x.bin")));
    }

    #[test]
    fn missing_everywhere_is_directory_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        let res = ArtifactLocator::new(vec![a.clone(), b.clone()]).resolve();
        assert_eq!(
            res.result,
            Err(ServiceError::DirectoryNotFound {
                searched: vec![a, b]
            })
        );
        assert!(res.probes.iter().all(|p| p.outcome == ProbeOutcome::Missing));
    }

    #[test]
    fn existing_but_empty_is_artifact_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("README.txt"), "x").unwrap();
        fs::create_dir(tmp.path().join("nested.pkl")).unwrap();
        let res = ArtifactLocator::new(vec![tmp.path().to_path_buf()]).resolve();
        assert!(matches!(res.result, Err(ServiceError::ArtifactNotFound { .. })));
        assert_eq!(res.probes[0].outcome, ProbeOutcome::NoArtifacts);
    }
}
