//! Ordinal lookup tables for the questionnaire categories.

/// A fixed category → ordinal table.
///
/// An entry may map to `None`, which is an explicit "not answered" value and
/// is distinct from a category that is simply absent from the table.
#[derive(Debug, Clone, Copy)]
pub struct OrdinalScale {
    name: &'static str,
    entries: &'static [(&'static str, Option<u8>)],
}

impl OrdinalScale {
    const fn new(name: &'static str, entries: &'static [(&'static str, Option<u8>)]) -> Self {
        Self { name, entries }
    }

    /// Scale name, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Looks up a category. The outer `None` means "not in the table".
    pub fn lookup(&self, category: &str) -> Option<Option<u8>> {
        self.entries
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, v)| *v)
    }

    /// Categories known to this scale, in table order.
    pub fn categories(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(c, _)| *c)
    }

    /// Highest ordinal the scale can produce.
    pub fn max_ordinal(&self) -> u8 {
        self.entries
            .iter()
            .filter_map(|(_, v)| *v)
            .max()
            .unwrap_or(0)
    }
}

/// Closes the toilet lid: no / yes.
pub const TOILET_LID: OrdinalScale = OrdinalScale::new("toilet_lid", &[("否", Some(0)), ("是", Some(1))]);

/// Toilet facility: dry pit < pour-flush pit < flush toilet.
pub const TOILET_TYPE: OrdinalScale = OrdinalScale::new(
    "toilet_type",
    &[("传统旱厕", Some(0)), ("冲洗坑厕", Some(1)), ("抽水马桶", Some(2))],
);

/// Dwelling ownership: none < rented < self-built < resale < new purchase.
pub const HOUSE_OWNERSHIP: OrdinalScale = OrdinalScale::new(
    "house_ownership",
    &[
        ("自己购买新房", Some(4)),
        ("自己购买二手房", Some(3)),
        ("自建房", Some(2)),
        ("租房", Some(1)),
        ("否", Some(0)),
    ],
);

/// Snack frequency buckets. `未填` is an explicit missing answer.
pub const SNACK_FREQUENCY: OrdinalScale = OrdinalScale::new(
    "snack_frequency",
    &[
        ("否", Some(0)),
        ("1-2次/年", Some(1)),
        ("1-2次/月", Some(2)),
        ("1-2次/周", Some(3)),
        ("3-5次/周", Some(4)),
        ("＞5次/周", Some(5)),
        ("未填", None),
    ],
);

/// Vegetable source. Street vendors and "all of them" share the top value.
pub const VEGETABLE_PURCHASE: OrdinalScale = OrdinalScale::new(
    "vegetable_purchase",
    &[
        ("自家种植", Some(0)),
        ("超市", Some(1)),
        ("菜市场", Some(2)),
        ("街头小贩", Some(3)),
        ("都有", Some(3)),
    ],
);
