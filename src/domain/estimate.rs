//! Combines raw calculator output with a regional pricing profile.

use super::{
    calculators::round2,
    entities::{CalculatorResult, FinalEstimate, RegionalPricingProfile, Timeline},
    trade::Trade,
};

/// Sales tax applied to materials when no rate is configured.
pub const DEFAULT_TAX_RATE: f64 = 0.08;

const HOURS_PER_DAY: f64 = 8.0;
const SCHEDULE_SLACK: f64 = 1.25;

pub fn combine(
    trade: Trade,
    result: &CalculatorResult,
    profile: Option<&RegionalPricingProfile>,
    tax_rate: f64,
) -> FinalEstimate {
    let material_multiplier = profile.map_or(1.0, |p| p.material_multiplier);
    let weather_factor = profile.map_or(1.0, |p| p.weather_factor);
    let labor_rate = profile.map_or_else(|| trade.fallback_labor_rate(), |p| p.labor_rate_for(trade));
    let permit_cost = profile.map_or(0.0, |p| p.permit_cost);

    let material_cost = round2(result.total_material_cost * material_multiplier);
    let labor_hours = round2(result.labor_hours * weather_factor);
    let labor_cost = round2(labor_hours * labor_rate);
    let subtotal = round2(material_cost + labor_cost + permit_cost);
    let tax = round2(material_cost * tax_rate);

    FinalEstimate {
        line_items: result.material_list.clone(),
        material_cost,
        labor_hours,
        labor_rate,
        labor_cost,
        permit_cost,
        subtotal,
        tax,
        total: round2(subtotal + tax),
        timeline: timeline(labor_hours),
    }
}

pub fn timeline(labor_hours: f64) -> Timeline {
    let working_days = ((labor_hours / HOURS_PER_DAY).ceil() as u32).max(1);
    let max_days = (working_days as f64 * SCHEDULE_SLACK).ceil() as u32;
    Timeline {
        working_days,
        min_days: working_days,
        max_days,
        description: format!("{working_days}-{max_days} working days"),
    }
}
