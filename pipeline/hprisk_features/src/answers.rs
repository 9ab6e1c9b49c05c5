//! Raw questionnaire answers as entered by the respondent.

use crate::field::FeatureField;
use serde::{Deserialize, Serialize};

/// One respondent's raw answers, keyed by field.
///
/// Every field is optional; an absent answer reads as the empty string.
/// Unknown keys in a deserialized record are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAnswers {
    /// Toilet lid habit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toilet_lid: Option<String>,
    /// Toilet type, `+`-joined when several apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toilet_type: Option<String>,
    /// House ownership.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub house_ownership: Option<String>,
    /// Snack frequency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snack_frequency: Option<String>,
    /// Vegetable source, `+`-joined when several apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vegetable_purchase: Option<String>,
}

impl RawAnswers {
    /// Builds a record from `(key, value)` pairs; unknown keys are skipped.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut answers = Self::default();
        for (key, value) in pairs {
            if let Ok(field) = key.as_ref().parse::<FeatureField>() {
                answers.set(field, value);
            }
        }
        answers
    }

    /// Returns the answer for `field`, or `""` when absent.
    pub fn get(&self, field: FeatureField) -> &str {
        self.slot(field).as_deref().unwrap_or("")
    }

    /// Sets the answer for `field`.
    pub fn set(&mut self, field: FeatureField, value: impl Into<String>) {
        *self.slot_mut(field) = Some(value.into());
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, field: FeatureField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Fields whose answer is absent or empty.
    pub fn unanswered(&self) -> Vec<FeatureField> {
        FeatureField::ALL
            .into_iter()
            .filter(|f| self.get(*f).trim().is_empty())
            .collect()
    }

    /// Fields whose answer contains a category the form never offers.
    ///
    /// Encoding still succeeds for these; this only lets a caller warn.
    pub fn unrecognized(&self) -> Vec<FeatureField> {
        FeatureField::ALL
            .into_iter()
            .filter(|f| {
                let value = self.get(*f);
                if value.is_empty() {
                    return false;
                }
                let options = f.options();
                if f.is_multi_select() {
                    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
                    compact
                        .split(crate::COMPOUND_DELIMITER)
                        .any(|token| !options.contains(&token))
                } else {
                    !options.contains(&value)
                }
            })
            .collect()
    }

    fn slot(&self, field: FeatureField) -> &Option<String> {
        match field {
            FeatureField::ToiletLid => &self.toilet_lid,
            FeatureField::ToiletType => &self.toilet_type,
            FeatureField::HouseOwnership => &self.house_ownership,
            FeatureField::SnackFrequency => &self.snack_frequency,
            FeatureField::VegetablePurchase => &self.vegetable_purchase,
        }
    }

    fn slot_mut(&mut self, field: FeatureField) -> &mut Option<String> {
        match field {
            FeatureField::ToiletLid => &mut self.toilet_lid,
            FeatureField::ToiletType => &mut self.toilet_type,
            FeatureField::HouseOwnership => &mut self.house_ownership,
            FeatureField::SnackFrequency => &mut self.snack_frequency,
            FeatureField::VegetablePurchase => &mut self.vegetable_purchase,
        }
    }
}
