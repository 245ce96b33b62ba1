//! Field-definition catalog: what each trade's form asks for and how the
//! answers are validated before a calculator sees them.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::{
    criteria::{CriteriaValue, TradeCriteria},
    trade::Trade,
};
use crate::util::assets::{self, AssetError};

const CATALOG_ASSET: &str = "field_definitions.json";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Number,
    Select,
    Boolean,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactType {
    Fixed,
    PerUnit,
    PerSqft,
    Multiplier,
}

/// How a field (or one of its options) moves the price.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingImpact {
    #[serde(rename = "type")]
    pub kind: ImpactType,
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOption {
    pub value: String,
    pub label: String,
    #[serde(default)]
    pub pricing_impact: Option<PricingImpact>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub trade: Trade,
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<CriteriaValue>,
    #[serde(default)]
    pub options: Vec<FieldOption>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub pricing_impact: Option<PricingImpact>,
}

impl FieldDefinition {
    pub fn option_values(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|option| option.value.as_str())
    }

    fn check(&self, value: &CriteriaValue) -> Option<FieldIssue> {
        let field = self.key.clone();
        match self.kind {
            FieldKind::Number => {
                let Some(number) = value.as_number() else {
                    return Some(FieldIssue::NotANumber { field });
                };
                if let Some(min) = self.min.filter(|min| number < *min) {
                    return Some(FieldIssue::BelowMinimum { field, min, value: number });
                }
                if let Some(max) = self.max.filter(|max| number > *max) {
                    return Some(FieldIssue::AboveMaximum { field, max, value: number });
                }
                None
            }
            FieldKind::Select => {
                let selected = match value {
                    CriteriaValue::Text(text) => text.clone(),
                    CriteriaValue::Number(number) => number.to_string(),
                    CriteriaValue::Flag(flag) => flag.to_string(),
                };
                if self.option_values().any(|option| option == selected) {
                    None
                } else {
                    Some(FieldIssue::InvalidOption {
                        field,
                        value: selected,
                        allowed: self.option_values().map(str::to_string).collect(),
                    })
                }
            }
            FieldKind::Boolean => value
                .as_flag()
                .is_none()
                .then_some(FieldIssue::NotABoolean { field }),
        }
    }
}

/// A single problem with one submitted field.
#[derive(Clone, Debug, PartialEq, Error, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum FieldIssue {
    #[error("{field} is required")]
    Missing { field: String },
    #[error("{field} must be a number")]
    NotANumber { field: String },
    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum { field: String, min: f64, value: f64 },
    #[error("{field} must be at most {max}, got {value}")]
    AboveMaximum { field: String, max: f64, value: f64 },
    #[error("{field} must be one of {allowed:?}, got `{value}`")]
    InvalidOption {
        field: String,
        value: String,
        allowed: Vec<String>,
    },
    #[error("{field} must be true or false")]
    NotABoolean { field: String },
}

#[derive(Clone, Debug, PartialEq, Error, Serialize)]
#[error("invalid {trade} criteria: {}", summarize(.issues))]
pub struct ValidationError {
    pub trade: Trade,
    pub issues: Vec<FieldIssue>,
}

fn summarize(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Every trade's field definitions, in display order.
#[derive(Clone, Debug)]
pub struct FieldCatalog {
    fields: Vec<FieldDefinition>,
}

impl FieldCatalog {
    pub fn new(fields: Vec<FieldDefinition>) -> Self {
        Self { fields }
    }

    /// Loads the catalog compiled into the binary.
    pub fn embedded() -> Result<Self, AssetError> {
        assets::load_json::<Vec<FieldDefinition>>(CATALOG_ASSET).map(Self::new)
    }

    pub fn for_trade(&self, trade: Trade) -> Vec<&FieldDefinition> {
        self.fields.iter().filter(|field| field.trade == trade).collect()
    }

    pub fn field(&self, trade: Trade, key: &str) -> Option<&FieldDefinition> {
        self.fields
            .iter()
            .find(|field| field.trade == trade && field.key == key)
    }

    /// Checks submitted criteria, collecting every violation.
    pub fn validate(&self, trade: Trade, criteria: &TradeCriteria) -> Result<(), ValidationError> {
        let definitions = self.for_trade(trade);
        let mut issues = Vec::new();

        for definition in &definitions {
            match criteria.get(&definition.key) {
                Some(value) => issues.extend(definition.check(value)),
                None if definition.required => issues.push(FieldIssue::Missing {
                    field: definition.key.clone(),
                }),
                None => {}
            }
        }

        for (key, _) in criteria.iter() {
            if !definitions.iter().any(|definition| &definition.key == key) {
                debug!(trade = %trade, field = %key, "ignoring unknown criteria field");
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { trade, issues })
        }
    }

    /// Criteria holding every field's catalog default.
    pub fn defaults(&self, trade: Trade) -> TradeCriteria {
        self.for_trade(trade)
            .into_iter()
            .filter_map(|field| field.default.clone().map(|value| (field.key.clone(), value)))
            .collect()
    }
}
