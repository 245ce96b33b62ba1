use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::trade::Trade;

/// One purchasable line on a material list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialLineItem {
    pub item: String,
    pub quantity: f64,
    pub unit: String,
    pub unit_cost: f64,
    pub total_cost: f64,
    pub category: String,
}

/// Raw calculator output before any regional adjustment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorResult {
    pub total_material_cost: f64,
    pub labor_hours: f64,
    pub material_list: Vec<MaterialLineItem>,
    /// Intermediate values (areas, multipliers, hour components).
    pub breakdown: BTreeMap<String, f64>,
}

/// Where a trade's labor rate came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaborSource {
    MetroSurvey,
    NationalAverage,
    FallbackTable,
}

impl LaborSource {
    /// Live survey data, as opposed to the built-in table.
    pub fn is_live(&self) -> bool {
        !matches!(self, LaborSource::FallbackTable)
    }

    pub fn tag(&self) -> &'static str {
        match self {
            LaborSource::MetroSurvey => "bls:metro",
            LaborSource::NationalAverage => "bls:national",
            LaborSource::FallbackTable => "fallback:table",
        }
    }
}

/// Cost-adjustment profile for one ZIP code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionalPricingProfile {
    pub zip_code: String,
    pub county: String,
    pub state: String,
    pub metro: Option<String>,
    pub material_multiplier: f64,
    /// Mean of `trade_labor_rates`.
    pub labor_rate: f64,
    #[serde(default)]
    pub trade_labor_rates: BTreeMap<Trade, f64>,
    pub permit_cost: f64,
    pub weather_factor: f64,
    pub data_sources: Vec<String>,
    pub quality_score: u8,
    /// Anchor ZIP when the profile was resolved by prefix interpolation.
    #[serde(default)]
    pub interpolated_from: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl RegionalPricingProfile {
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }

    /// Labor rate for a trade, falling back to the profile-wide rate.
    pub fn labor_rate_for(&self, trade: Trade) -> f64 {
        self.trade_labor_rates
            .get(&trade)
            .copied()
            .unwrap_or(self.labor_rate)
    }
}

/// Static anchor ZIP (one per county seat).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountySeatRecord {
    pub zip: String,
    pub county: String,
    pub state: String,
    #[serde(default)]
    pub metro: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetroAreaRecord {
    pub name: String,
    pub cost_index: f64,
    /// Seven-digit survey area code for the metropolitan statistical area.
    #[serde(default)]
    pub area_code: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub working_days: u32,
    pub min_days: u32,
    pub max_days: u32,
    pub description: String,
}

/// Itemized estimate returned to the request handler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalEstimate {
    pub line_items: Vec<MaterialLineItem>,
    pub material_cost: f64,
    pub labor_hours: f64,
    pub labor_rate: f64,
    pub labor_cost: f64,
    pub permit_cost: f64,
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
    pub timeline: Timeline,
}
