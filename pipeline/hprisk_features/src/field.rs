//! The five questionnaire fields and their fixed slot order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One questionnaire field. The declaration order is the slot order of
/// [`FeatureVector`](crate::FeatureVector).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureField {
    /// Whether the respondent closes the toilet lid before flushing.
    ToiletLid,
    /// Household toilet facility, possibly several joined with `+`.
    ToiletType,
    /// Ownership of the dwelling.
    HouseOwnership,
    /// How often snacks are eaten.
    SnackFrequency,
    /// Where vegetables are bought, possibly several joined with `+`.
    VegetablePurchase,
}

impl FeatureField {
    /// All fields in slot order.
    pub const ALL: [FeatureField; 5] = [
        FeatureField::ToiletLid,
        FeatureField::ToiletType,
        FeatureField::HouseOwnership,
        FeatureField::SnackFrequency,
        FeatureField::VegetablePurchase,
    ];

    /// Position of this field in the encoded vector.
    pub fn slot(self) -> usize {
        self as usize
    }

    /// Key used in raw answer records and answers files.
    pub fn key(self) -> &'static str {
        match self {
            FeatureField::ToiletLid => "toilet_lid",
            FeatureField::ToiletType => "toilet_type",
            FeatureField::HouseOwnership => "house_ownership",
            FeatureField::SnackFrequency => "snack_frequency",
            FeatureField::VegetablePurchase => "vegetable_purchase",
        }
    }

    /// Column label the model was trained with. Must match byte for byte.
    pub fn label(self) -> &'static str {
        match self {
            FeatureField::ToiletLid => "如果使用马桶，是否习惯盖马桶盖",
            FeatureField::ToiletType => "家庭厕所类型",
            FeatureField::HouseOwnership => "居住房屋所有权",
            FeatureField::SnackFrequency => "零食的食用频率",
            FeatureField::VegetablePurchase => "家中蔬菜的购买方式",
        }
    }

    /// Choices offered by the questionnaire form for this field.
    pub fn options(self) -> &'static [&'static str] {
        match self {
            FeatureField::ToiletLid => &["是", "否", "未填"],
            FeatureField::ToiletType => &["传统旱厕", "冲洗坑厕", "抽水马桶"],
            FeatureField::HouseOwnership => &["自己购买新房", "自己购买二手房", "自建房", "租房", "否"],
            FeatureField::SnackFrequency => &[
                "否", "1-2次/年", "1-2次/月", "1-2次/周", "3-5次/周", "＞5次/周", "未填",
            ],
            FeatureField::VegetablePurchase => &["自家种植", "超市", "菜市场", "街头小贩", "都有"],
        }
    }

    /// Whether the field accepts several `+`-joined categories.
    pub fn is_multi_select(self) -> bool {
        matches!(self, FeatureField::ToiletType | FeatureField::VegetablePurchase)
    }

    /// The canonical column labels in slot order.
    pub fn labels() -> [&'static str; 5] {
        Self::ALL.map(FeatureField::label)
    }
}

impl fmt::Display for FeatureField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FeatureField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureField::ALL
            .into_iter()
            .find(|f| f.key() == s || f.label() == s)
            .ok_or_else(|| format!("unknown questionnaire field: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_follow_declaration_order() {
        for (i, field) in FeatureField::ALL.iter().enumerate() {
            assert_eq!(field.slot(), i);
        }
    }

    #[test]
    fn parse_by_key_or_label() {
        assert_eq!("toilet_type".parse::<FeatureField>(), Ok(FeatureField::ToiletType));
        assert_eq!("零食的食用频率".parse::<FeatureField>(), Ok(FeatureField::SnackFrequency));
        assert!("blood_type".parse::<FeatureField>().is_err());
    }

    #[test]
    fn labels_are_in_slot_order() {
        assert_eq!(
            FeatureField::labels(),
            [
                "如果使用马桶，是否习惯盖马桶盖",
                "家庭厕所类型",
                "居住房屋所有权",
                "零食的食用频率",
                "家中蔬菜的购买方式",
            ]
        );
    }
}
