//! The fixed-order encoded feature vector.

use crate::field::FeatureField;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of slots in every [`FeatureVector`].
pub const FEATURE_COUNT: usize = 5;

/// Encoded answers in slot order. `None` is the missing marker, kept apart
/// from any numeric default until [`impute`](Self::impute) is called.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector([Option<f64>; FEATURE_COUNT]);

impl FeatureVector {
    /// A vector with every slot missing.
    pub fn empty() -> Self {
        Self([None; FEATURE_COUNT])
    }

    /// Wraps already-encoded slots.
    pub fn from_slots(slots: [Option<f64>; FEATURE_COUNT]) -> Self {
        Self(slots)
    }

    /// A vector with no missing slot.
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values.map(Some))
    }

    /// Slots in order.
    pub fn slots(&self) -> &[Option<f64>; FEATURE_COUNT] {
        &self.0
    }

    /// Value of one field.
    pub fn get(&self, field: FeatureField) -> Option<f64> {
        self.0[field.slot()]
    }

    /// Sets one field.
    pub fn set(&mut self, field: FeatureField, value: Option<f64>) {
        self.0[field.slot()] = value;
    }

    /// Fields currently holding the missing marker.
    pub fn missing(&self) -> Vec<FeatureField> {
        FeatureField::ALL
            .into_iter()
            .filter(|f| self.get(*f).is_none())
            .collect()
    }

    /// Replaces every missing slot with `fill`.
    pub fn impute(&self, fill: f64) -> [f64; FEATURE_COUNT] {
        self.0.map(|slot| slot.unwrap_or(fill))
    }
}

impl fmt::Display for FeatureVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, slot) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match slot {
                Some(v) => write!(f, "{v}")?,
                None => f.write_str("missing")?,
            }
        }
        f.write_str("]")
    }
}
