//! Feature encoding for the H. pylori lifestyle questionnaire
//!
//! Turns the five categorical survey answers into the fixed-order numeric
//! vector the risk model was trained on. Encoding is pure: unrecognized
//! answers never fail, they fall back to each field's documented default.

#![warn(missing_docs)]

pub mod answers;
pub mod encoder;
pub mod field;
pub mod scale;
pub mod vector;

pub use answers::RawAnswers;
pub use encoder::{
    encode_all, encode_house_ownership, encode_snack_frequency, encode_toilet_lid,
    encode_toilet_type, encode_vegetable_purchase, COMPOUND_DELIMITER,
};
pub use field::FeatureField;
pub use scale::OrdinalScale;
pub use vector::{FeatureVector, FEATURE_COUNT};
