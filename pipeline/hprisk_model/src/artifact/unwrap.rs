//! Selection of the usable model from a possibly bundled artifact.

use crate::error::ServiceError;
use crate::estimators::decode;
use crate::model::Model;
use serde::Serialize;
use serde_pickle::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// One bundle element: the decoded object, or why it could not be decoded.
pub type BundleItem = Result<Box<dyn Model>, String>;

/// A deserialized artifact before selection.
#[derive(Debug)]
pub enum LoadedArtifact {
    Single(Box<dyn Model>),
    /// A tuple of objects, in container order. Elements are decoded
    /// independently so a malformed one only matters if it gets selected.
    Bundle(Vec<BundleItem>),
}

impl LoadedArtifact {
    /// Interprets a top-level value. Only tuples are treated as bundles.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Tuple(items) => Ok(LoadedArtifact::Bundle(items.iter().map(decode).collect())),
            other => Ok(LoadedArtifact::Single(decode(other)?)),
        }
    }
}

/// Why no model could be taken out of an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The element that would be selected failed to decode.
    Malformed { index: usize, reason: String },
    /// The element that would be selected exposes no capability.
    Unusable { type_name: String },
}

impl Rejection {
    /// The service error for a rejection of the artifact at `path`.
    pub fn at(self, path: &Path) -> ServiceError {
        match self {
            Rejection::Malformed { index, reason } => ServiceError::ArtifactLoadFailed {
                path: path.to_path_buf(),
                reason: format!("bundle element {index}: {reason}"),
            },
            Rejection::Unusable { type_name } => ServiceError::ArtifactUnusable { type_name },
        }
    }
}

/// How the active model was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionRule {
    /// The artifact was the model itself.
    Direct,
    /// The element at this index was the first capable one in the bundle.
    CapabilityScan { index: usize },
    /// No bundle element was capable; element 0 was taken.
    FallbackFirst,
    /// Supplied in-process rather than loaded from disk.
    Injected,
}

impl fmt::Display for SelectionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionRule::Direct => f.write_str("direct"),
            SelectionRule::CapabilityScan { index } => write!(f, "bundle element {index}"),
            SelectionRule::FallbackFirst => f.write_str("bundle element 0 (fallback)"),
            SelectionRule::Injected => f.write_str("injected"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectedModel {
    pub model: Arc<dyn Model>,
    pub rule: SelectionRule,
}

/// Picks the model out of a loaded artifact.
///
/// A bundle is scanned in order for the first element exposing `score` or
/// `predict`; elements that failed to decode are skipped. When none is
/// capable, element 0 is taken anyway unless `strict` is set, and it is a
/// rejection if element 0 itself failed to decode. A non-bundle artifact is
/// taken as is even if it is incapable; that surfaces later at invocation.
pub fn select_model(artifact: LoadedArtifact, strict: bool) -> Result<SelectedModel, Rejection> {
    let mut items = match artifact {
        LoadedArtifact::Single(model) => {
            return Ok(SelectedModel {
                model: Arc::from(model),
                rule: SelectionRule::Direct,
            })
        }
        LoadedArtifact::Bundle(items) => items,
    };
    if items.is_empty() {
        return Err(Rejection::Unusable {
            type_name: "tuple".to_string(),
        });
    }
    for (index, item) in items.iter().enumerate() {
        if let Err(reason) = item {
            log::debug!("skipping bundle element {index}: {reason}");
        }
    }
    let capable = items
        .iter()
        .position(|item| matches!(item, Ok(m) if m.capabilities().any()));
    if let Some(index) = capable {
        if let Ok(model) = items.swap_remove(index) {
            return Ok(SelectedModel {
                model: Arc::from(model),
                rule: SelectionRule::CapabilityScan { index },
            });
        }
    }
    let first = items
        .swap_remove(0)
        .map_err(|reason| Rejection::Malformed { index: 0, reason })?;
    if strict {
        return Err(Rejection::Unusable {
            type_name: first.type_name().to_string(),
        });
    }
    log::warn!(
        "no bundle element exposes score or predict; falling back to element 0 ({})",
        first.type_name()
    );
    Ok(SelectedModel {
        model: Arc::from(first),
        rule: SelectionRule::FallbackFirst,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimators::testing::*;
    use crate::estimators::OpaqueObject;

    fn logistic() -> Value {
        estimator(
            "LogisticRegression",
            vec![
                ("coef_", floats(&[0.1, 0.2, 0.3, 0.4, 0.5])),
                ("intercept_", floats(&[0.0])),
            ],
        )
    }

    fn bundle(values: Vec<Value>) -> LoadedArtifact {
        LoadedArtifact::from_value(&Value::Tuple(values)).unwrap()
    }

    #[test]
    fn non_tuple_is_direct_even_when_incapable() {
        let loaded = LoadedArtifact::from_value(&Value::List(vec![])).unwrap();
        let selected = select_model(loaded, false).unwrap();
        assert_eq!(selected.rule, SelectionRule::Direct);
        assert_eq!(selected.model.type_name(), "list");
    }

    #[test]
    fn scan_picks_first_capable_element() {
        let loaded = bundle(vec![
            estimator("StandardScaler", vec![]),
            logistic(),
            dict(vec![("version", s("1"))]),
        ]);
        let selected = select_model(loaded, false).unwrap();
        assert_eq!(selected.rule, SelectionRule::CapabilityScan { index: 1 });
        assert_eq!(selected.model.type_name(), "LogisticRegression");
    }

    #[test]
    fn incapable_bundle_falls_back_to_first() {
        let loaded = bundle(vec![s("meta"), Value::I64(3)]);
        let selected = select_model(loaded, false).unwrap();
        assert_eq!(selected.rule, SelectionRule::FallbackFirst);
        assert_eq!(selected.model.type_name(), "str");
    }

    #[test]
    fn strict_rejects_incapable_bundle() {
        let encoder: Box<dyn Model> = Box::new(OpaqueObject::new("LabelEncoder"));
        let loaded = LoadedArtifact::Bundle(vec![Ok(encoder)]);
        assert_eq!(
            select_model(loaded, true).unwrap_err(),
            Rejection::Unusable {
                type_name: "LabelEncoder".into()
            }
        );
    }

    #[test]
    fn empty_bundle_is_unusable() {
        assert!(matches!(
            select_model(bundle(vec![]), false),
            Err(Rejection::Unusable { .. })
        ));
    }

    #[test]
    fn malformed_element_after_capable_one_is_ignored() {
        let loaded = bundle(vec![
            logistic(),
            estimator("LogisticRegression", vec![("intercept_", floats(&[0.0]))]),
        ]);
        let selected = select_model(loaded, false).unwrap();
        assert_eq!(selected.rule, SelectionRule::CapabilityScan { index: 0 });
    }

    #[test]
    fn malformed_element_is_skipped_by_the_scan() {
        let loaded = bundle(vec![estimator("DecisionTreeClassifier", vec![]), logistic()]);
        let selected = select_model(loaded, false).unwrap();
        assert_eq!(selected.rule, SelectionRule::CapabilityScan { index: 1 });
    }

    #[test]
    fn malformed_fallback_element_is_rejected() {
        let loaded = bundle(vec![estimator("LogisticRegression", vec![]), s("metadata")]);
        match select_model(loaded, false) {
            Err(Rejection::Malformed { index: 0, reason }) => {
                assert!(reason.contains("coef_"), "{reason}")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
