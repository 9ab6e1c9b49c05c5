//! Interpretation of deserialized artifact values as model objects
//!
//! Artifacts are exchanged as pickles of plain values. A dict carrying a
//! `__class__` string names an estimator; its fitted attributes use the
//! scikit-learn attribute names (`coef_`, `intercept_`, `classes_`, ...).
//! Anything that is not a recognized estimator becomes an [`OpaqueObject`]
//! that loads fine but exposes no capability.

mod linear;
mod opaque;
mod tree;

pub use linear::{LinearRegression, LogisticRegression};
pub use opaque::OpaqueObject;
pub use tree::{DecisionTree, TreeKind};

use crate::model::{Model, PredictedValue};
use serde_pickle::{HashableValue, Value};
use std::collections::BTreeMap;

/// Dict key naming the estimator class.
pub const CLASS_KEY: &str = "__class__";

type Dict = BTreeMap<HashableValue, Value>;

/// Turns one deserialized value into a model object.
///
/// Errors only when a recognized estimator class carries malformed
/// parameters; unknown shapes are accepted as opaque objects.
pub fn decode(value: &Value) -> Result<Box<dyn Model>, String> {
    let Value::Dict(dict) = value else {
        return Ok(Box::new(OpaqueObject::new(python_type_name(value))));
    };
    let Some(class) = get(dict, CLASS_KEY).and_then(as_str) else {
        return Ok(Box::new(OpaqueObject::new("dict")));
    };
    let model: Box<dyn Model> = match class {
        "LogisticRegression" => Box::new(LogisticRegression::from_dict(dict)?),
        "LinearRegression" | "Ridge" | "Lasso" => {
            Box::new(LinearRegression::from_dict(class, dict)?)
        }
        "DecisionTreeClassifier" => Box::new(DecisionTree::from_dict(TreeKind::Classifier, dict)?),
        "DecisionTreeRegressor" => Box::new(DecisionTree::from_dict(TreeKind::Regressor, dict)?),
        other => Box::new(OpaqueObject::new(other)),
    };
    Ok(model)
}

/// Python-style type name of a plain value.
pub fn python_type_name(value: &Value) -> &'static str {
    match value {
        Value::None => "NoneType",
        Value::Bool(_) => "bool",
        Value::I64(_) | Value::Int(_) => "int",
        Value::F64(_) => "float",
        Value::Bytes(_) => "bytes",
        Value::String(_) => "str",
        Value::List(_) => "list",
        Value::Tuple(_) => "tuple",
        Value::Set(_) => "set",
        Value::FrozenSet(_) => "frozenset",
        Value::Dict(_) => "dict",
        #[allow(unreachable_patterns)]
        _ => "object",
    }
}

fn get<'a>(dict: &'a Dict, key: &str) -> Option<&'a Value> {
    dict.get(&HashableValue::String(key.to_string()))
        .or_else(|| dict.get(&HashableValue::Bytes(key.as_bytes().to_vec())))
}

fn require<'a>(dict: &'a Dict, class: &str, key: &str) -> Result<&'a Value, String> {
    get(dict, key).ok_or_else(|| format!("{class} is missing `{key}`"))
}

fn as_str(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        Value::Bytes(b) => std::str::from_utf8(b).ok(),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::F64(v) => Some(*v),
        Value::I64(v) => Some(*v as f64),
        Value::Bool(b) => Some(f64::from(u8::from(*b))),
        Value::Int(big) => big.to_string().parse().ok(),
        _ => None,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::I64(v) => Some(*v),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::F64(v) if v.fract() == 0.0 => Some(*v as i64),
        _ => None,
    }
}

fn as_seq(value: &Value) -> Option<&[Value]> {
    match value {
        Value::List(items) | Value::Tuple(items) => Some(items.as_slice()),
        _ => None,
    }
}

/// A number, or a flat sequence of numbers.
fn as_f64_vec(value: &Value) -> Option<Vec<f64>> {
    if let Some(v) = as_f64(value) {
        return Some(vec![v]);
    }
    as_seq(value)?.iter().map(as_f64).collect()
}

/// Every number in an arbitrarily nested sequence, in order.
fn flatten_f64(value: &Value, out: &mut Vec<f64>) -> Option<()> {
    if let Some(v) = as_f64(value) {
        out.push(v);
        return Some(());
    }
    for item in as_seq(value)? {
        flatten_f64(item, out)?;
    }
    Some(())
}

/// A flat vector becomes a single row.
fn as_matrix(value: &Value) -> Option<Vec<Vec<f64>>> {
    let items = as_seq(value)?;
    if items.iter().all(|v| as_f64(v).is_some()) {
        return Some(vec![items.iter().filter_map(as_f64).collect()]);
    }
    items.iter().map(as_f64_vec).collect()
}

fn as_i64_vec(value: &Value) -> Option<Vec<i64>> {
    as_seq(value)?.iter().map(as_i64).collect()
}

fn as_label(value: &Value) -> Option<PredictedValue> {
    if let Some(v) = as_f64(value) {
        return Some(PredictedValue::Number(v));
    }
    as_str(value).map(|s| PredictedValue::Label(s.to_string()))
}

fn classes(dict: &Dict, class: &str, fallback_len: usize) -> Result<Vec<PredictedValue>, String> {
    match get(dict, "classes_") {
        Some(v) => as_seq(v)
            .and_then(|items| items.iter().map(as_label).collect::<Option<Vec<_>>>())
            .ok_or_else(|| format!("{class}: `classes_` must be a list of numbers or strings")),
        None => Ok((0..fallback_len)
            .map(|i| PredictedValue::Number(i as f64))
            .collect()),
    }
}

fn feature_names(dict: &Dict, class: &str) -> Result<Option<Vec<String>>, String> {
    match get(dict, "feature_names_in_") {
        None | Some(Value::None) => Ok(None),
        Some(v) => as_seq(v)
            .and_then(|items| {
                items
                    .iter()
                    .map(|i| as_str(i).map(str::to_string))
                    .collect::<Option<Vec<_>>>()
            })
            .map(Some)
            .ok_or_else(|| format!("{class}: `feature_names_in_` must be a list of strings")),
    }
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
