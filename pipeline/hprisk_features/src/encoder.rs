//! Per-field encoding rules.
//!
//! Every rule is total: unrecognized input resolves to the field's default
//! instead of an error. Two defaults exist. Single-choice fields with an
//! explicit "not answered" option (toilet lid, snack frequency) resolve
//! anything unrecognized to missing; the others resolve it to ordinal 0.

use crate::answers::RawAnswers;
use crate::field::FeatureField;
use crate::scale::{
    OrdinalScale, HOUSE_OWNERSHIP, SNACK_FREQUENCY, TOILET_LID, TOILET_TYPE, VEGETABLE_PURCHASE,
};
use crate::vector::FeatureVector;

/// Separator between categories in a multi-select answer.
pub const COMPOUND_DELIMITER: char = '+';

/// Toilet-type answer accidentally recorded in the lid slot.
const FLUSH_TOILET: &str = "抽水马桶";

/// Explicit "not filled in" answer.
const UNSPECIFIED: &str = "未填";

/// Toilet lid habit. `抽水马桶` and `未填` are missing, never 0 or 1.
pub fn encode_toilet_lid(value: &str) -> Option<u8> {
    if value == FLUSH_TOILET || value == UNSPECIFIED {
        return None;
    }
    TOILET_LID.lookup(value).flatten()
}

/// Toilet type, highest facility tier across `+`-joined tokens.
pub fn encode_toilet_type(value: &str) -> Option<u8> {
    Some(max_over_tokens(&TOILET_TYPE, value))
}

/// House ownership; unrecognized or empty is 0.
pub fn encode_house_ownership(value: &str) -> Option<u8> {
    Some(HOUSE_OWNERSHIP.lookup(value).flatten().unwrap_or(0))
}

/// Snack frequency bucket. `未填` is missing while `否` is 0.
pub fn encode_snack_frequency(value: &str) -> Option<u8> {
    SNACK_FREQUENCY.lookup(value).flatten()
}

/// Vegetable source, highest ordinal across `+`-joined tokens.
pub fn encode_vegetable_purchase(value: &str) -> Option<u8> {
    Some(max_over_tokens(&VEGETABLE_PURCHASE, value))
}

/// Encodes one field's raw answer.
pub fn encode_field(field: FeatureField, value: &str) -> Option<u8> {
    match field {
        FeatureField::ToiletLid => encode_toilet_lid(value),
        FeatureField::ToiletType => encode_toilet_type(value),
        FeatureField::HouseOwnership => encode_house_ownership(value),
        FeatureField::SnackFrequency => encode_snack_frequency(value),
        FeatureField::VegetablePurchase => encode_vegetable_purchase(value),
    }
}

/// Encodes a full answer record into the 5-slot vector.
///
/// Absent answers are encoded as the empty string, so each slot takes its
/// field's empty-input default rather than uniformly becoming missing.
pub fn encode_all(answers: &RawAnswers) -> FeatureVector {
    let mut vector = FeatureVector::empty();
    for field in FeatureField::ALL {
        vector.set(field, encode_field(field, answers.get(field)).map(f64::from));
    }
    vector
}

fn max_over_tokens(scale: &OrdinalScale, value: &str) -> u8 {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    compact
        .split(COMPOUND_DELIMITER)
        .map(|token| scale.lookup(token).flatten().unwrap_or(0))
        .max()
        .unwrap_or(0)
}
