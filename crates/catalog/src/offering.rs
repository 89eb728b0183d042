use serde::{Deserialize, Serialize};

use adsmarket_core::Money;

/// Well-known price rule and characteristic identifiers.
pub mod ids {
    pub const IMG_PER_IMAGE_PRICE: &str = "IMG_PER_IMAGE_PRICE";
    pub const VIDEO_FIXED_PRICE: &str = "VIDEO_FIXED_PRICE";
    pub const MIXED_BASE_PRICE: &str = "MIXED_BASE_PRICE";
    pub const MIXED_IMAGE_PRICE: &str = "MIXED_IMAGE_PRICE";
    pub const MIXED_VIDEO_PRICE: &str = "MIXED_VIDEO_PRICE";
    pub const MODEL_FIXED_PRICE: &str = "3D_MODEL_FIXED_PRICE";

    pub const IMAGE_MAX_COUNT: &str = "IMAGE_MAX_COUNT";
    pub const VIDEO_MAX_COUNT: &str = "VIDEO_MAX_COUNT";
    pub const MIXED_IMG_COUNT: &str = "MIXED_IMG_COUNT";
    pub const MIXED_VIDEO_COUNT: &str = "MIXED_VIDEO_COUNT";
    pub const MODEL_MAX_COUNT: &str = "3D_MODEL_MAX_COUNT";
}

/// Product kind. Validation and pricing dispatch on this, never on raw ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferingKind {
    Image,
    Video,
    Mixed,
    #[serde(rename = "MODEL_3D")]
    Model3d,
    /// Sellable but without media quotas; priced from its one-time rule.
    #[default]
    Other,
}

/// Media an offering can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
    Model,
}

impl MediaKind {
    /// Plural lower-case noun used in messages.
    pub fn plural(self) -> &'static str {
        match self {
            MediaKind::Image => "images",
            MediaKind::Video => "videos",
            MediaKind::Model => "models",
        }
    }
}

/// A pricing rule attached to an offering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRule {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Tax-included unit amount.
    pub price: Money,
    #[serde(default)]
    pub one_time: bool,
}

/// One declared value of a characteristic: either a point value or a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CharacteristicValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_of_measure: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl CharacteristicValue {
    pub fn point(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            is_default: true,
            ..Self::default()
        }
    }

    pub fn range(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            value_from: Some(from.into()),
            value_to: Some(to.into()),
            ..Self::default()
        }
    }
}

/// A named constraint characteristic (format, size, max count...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Characteristic {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value_type: String,
    #[serde(default)]
    pub values: Vec<CharacteristicValue>,
}

impl Characteristic {
    pub fn new(
        id: impl Into<String>,
        value_type: impl Into<String>,
        values: Vec<CharacteristicValue>,
    ) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            value_type: value_type.into(),
            values,
        }
    }

    /// Quota enforced on selections: the first value's range upper bound, or
    /// its point value. `None` when absent or not a number.
    pub fn upper_bound(&self) -> Option<u32> {
        let first = self.values.first()?;
        first
            .value_to
            .as_deref()
            .or(first.value.as_deref())
            .and_then(|raw| raw.trim().parse().ok())
    }

    /// Advertised number: the default value (or the first one), read as
    /// point value, then range end, then range start.
    pub fn default_number(&self) -> Option<u32> {
        let v = self
            .values
            .iter()
            .find(|v| v.is_default)
            .or_else(|| self.values.first())?;
        v.value
            .as_deref()
            .or(v.value_to.as_deref())
            .or(v.value_from.as_deref())
            .and_then(|raw| raw.trim().parse().ok())
    }
}

/// A sellable advertising product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offering {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub kind: OfferingKind,
    /// Partner-facing title for catalog listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Offerings this one is sold as an add-on for. Informational only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add_on_for: Vec<String>,
    #[serde(default)]
    pub prices: Vec<PriceRule>,
    #[serde(default)]
    pub characteristics: Vec<Characteristic>,
}

impl Offering {
    pub fn price_rule(&self, id: &str) -> Option<&PriceRule> {
        self.prices.iter().find(|p| p.id == id)
    }

    /// Named rule, falling back to the first declared rule.
    pub fn price_rule_or_first(&self, id: &str) -> Option<&PriceRule> {
        self.price_rule(id).or_else(|| self.prices.first())
    }

    /// First one-time rule, falling back to the first declared rule.
    pub fn one_time_rule_or_first(&self) -> Option<&PriceRule> {
        self.prices
            .iter()
            .find(|p| p.one_time)
            .or_else(|| self.prices.first())
    }

    pub fn characteristic(&self, id: &str) -> Option<&Characteristic> {
        self.characteristics.iter().find(|c| c.id == id)
    }

    /// Selection quota for a characteristic, if the offering declares one.
    pub fn limit(&self, characteristic_id: &str) -> Option<u32> {
        self.characteristic(characteristic_id)?.upper_bound()
    }

    /// Currency of the offering's prices.
    pub fn currency(&self) -> Option<&str> {
        self.prices.first().map(|p| p.price.currency.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offering_with(characteristics: Vec<Characteristic>, prices: Vec<PriceRule>) -> Offering {
        Offering {
            id: "X".into(),
            name: "X".into(),
            description: String::new(),
            kind: OfferingKind::Other,
            display_name: None,
            subtitle: None,
            add_on_for: vec![],
            prices,
            characteristics,
        }
    }

    fn rule(id: &str, amount: u64, one_time: bool) -> PriceRule {
        PriceRule {
            id: id.into(),
            name: String::new(),
            price: Money::new(amount, "EUR"),
            one_time,
        }
    }

    #[test]
    fn upper_bound_prefers_range_end_over_point_value() {
        let range = Characteristic::new("R", "integer", vec![CharacteristicValue::range("0", "4")]);
        assert_eq!(range.upper_bound(), Some(4));

        let point = Characteristic::new("P", "integer", vec![CharacteristicValue::point("2")]);
        assert_eq!(point.upper_bound(), Some(2));
    }

    #[test]
    fn upper_bound_ignores_non_numeric_values() {
        let fmt = Characteristic::new("F", "string", vec![CharacteristicValue::point("image/png")]);
        assert_eq!(fmt.upper_bound(), None);
        assert_eq!(Characteristic::new("E", "integer", vec![]).upper_bound(), None);
    }

    #[test]
    fn default_number_uses_flagged_default() {
        let mut first = CharacteristicValue::point("9");
        first.is_default = false;
        let c = Characteristic::new("C", "integer", vec![first, CharacteristicValue::point("3")]);
        assert_eq!(c.default_number(), Some(3));
        assert_eq!(c.upper_bound(), Some(9));
    }

    #[test]
    fn price_rule_falls_back_to_first() {
        let o = offering_with(vec![], vec![rule("A", 100, false), rule("B", 200, true)]);
        assert_eq!(o.price_rule_or_first("B").map(|r| r.price.amount), Some(200));
        assert_eq!(o.price_rule_or_first("missing").map(|r| r.price.amount), Some(100));
        assert_eq!(o.one_time_rule_or_first().map(|r| r.id.as_str()), Some("B"));
    }

    #[test]
    fn kind_uses_stable_wire_names() {
        assert_eq!(serde_json::to_string(&OfferingKind::Model3d).unwrap(), "\"MODEL_3D\"");
        assert_eq!(serde_json::to_string(&OfferingKind::Mixed).unwrap(), "\"MIXED\"");
    }
}
