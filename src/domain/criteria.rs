//! Trade-specific criteria posted by the estimate form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single criteria value as it arrives from the form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CriteriaValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl CriteriaValue {
    /// Parses a raw form value: booleans, then numbers, then free text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "true" => return CriteriaValue::Flag(true),
            "false" => return CriteriaValue::Flag(false),
            _ => {}
        }
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(CriteriaValue::Number)
            .unwrap_or_else(|| CriteriaValue::Text(trimmed.to_string()))
    }

    /// Numeric view; numeric strings count since form posts are stringly typed.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CriteriaValue::Number(value) => Some(*value),
            CriteriaValue::Text(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            CriteriaValue::Flag(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CriteriaValue::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            CriteriaValue::Flag(flag) => Some(*flag),
            CriteriaValue::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" => Some(true),
                "false" | "no" | "off" => Some(false),
                _ => None,
            },
            CriteriaValue::Number(_) => None,
        }
    }
}

/// Field key → value for one estimate request. Immutable once built.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeCriteria {
    fields: BTreeMap<String, CriteriaValue>,
}

impl TradeCriteria {
    pub fn new(fields: BTreeMap<String, CriteriaValue>) -> Self {
        Self { fields }
    }

    /// Builds criteria from `key=value` pairs as passed on the command line.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut fields = BTreeMap::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| format!("expected key=value, got `{pair}`"))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(format!("empty field name in `{pair}`"));
            }
            fields.insert(key.to_string(), CriteriaValue::parse(value));
        }
        Ok(Self { fields })
    }

    pub fn get(&self, key: &str) -> Option<&CriteriaValue> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CriteriaValue)> {
        self.fields.iter()
    }

    pub fn number_or(&self, key: &str, default: f64) -> f64 {
        self.get(key)
            .and_then(CriteriaValue::as_number)
            .unwrap_or(default)
    }

    /// Whole, non-negative count (chimneys, outlets, doors...).
    pub fn count_or(&self, key: &str, default: u32) -> u32 {
        self.get(key)
            .and_then(CriteriaValue::as_number)
            .map(|value| value.max(0.0).floor() as u32)
            .unwrap_or(default)
    }

    pub fn text_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key)
            .and_then(CriteriaValue::as_text)
            .unwrap_or(default)
    }

    pub fn flag_or(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .and_then(CriteriaValue::as_flag)
            .unwrap_or(default)
    }
}

impl<K: Into<String>> FromIterator<(K, CriteriaValue)> for TradeCriteria {
    fn from_iter<T: IntoIterator<Item = (K, CriteriaValue)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_form_pairs() {
        let criteria =
            TradeCriteria::from_pairs(["squareFeet=2000", "pitch=medium", "tearOff=false"]).unwrap();
        assert_eq!(criteria.number_or("squareFeet", 0.0), 2000.0);
        assert_eq!(criteria.text_or("pitch", "low"), "medium");
        assert!(!criteria.flag_or("tearOff", true));
    }

    #[test]
    fn rejects_pairs_without_separator() {
        assert!(TradeCriteria::from_pairs(["squareFeet"]).is_err());
        assert!(TradeCriteria::from_pairs(["=12"]).is_err());
    }

    #[test]
    fn defaults_apply_for_missing_fields() {
        let criteria = TradeCriteria::default();
        assert_eq!(criteria.count_or("coats", 2), 2);
        assert_eq!(criteria.text_or("condition", "good"), "good");
        assert!(criteria.flag_or("removeOld", true));
    }

    #[test]
    fn numeric_strings_are_numbers() {
        let criteria: TradeCriteria =
            [("outletCount", CriteriaValue::Text("10".into()))].into_iter().collect();
        assert_eq!(criteria.count_or("outletCount", 0), 10);
    }

    #[test]
    fn counts_floor_and_clamp_negative_values() {
        let criteria: TradeCriteria = [
            ("chimneys", CriteriaValue::Number(2.7)),
            ("valleys", CriteriaValue::Number(-3.0)),
        ]
        .into_iter()
        .collect();
        assert_eq!(criteria.count_or("chimneys", 0), 2);
        assert_eq!(criteria.count_or("valleys", 0), 0);
    }

    #[test]
    fn deserializes_untagged_json() {
        let criteria: TradeCriteria =
            serde_json::from_str(r#"{"squareFeet": 1200, "tearOff": true, "pitch": "steep"}"#)
                .unwrap();
        assert_eq!(criteria.get("squareFeet"), Some(&CriteriaValue::Number(1200.0)));
        assert_eq!(criteria.get("tearOff"), Some(&CriteriaValue::Flag(true)));
        assert_eq!(criteria.text_or("pitch", "low"), "steep");
    }
}
