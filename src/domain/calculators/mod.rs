//! Per-trade material and labor calculators.
//!
//! Every calculator is a pure function of its criteria. Quantities of
//! discrete goods are rounded up to whole purchasable units; waste factors
//! apply to the continuous requirement before that rounding. Complexity
//! style multipliers only ever scale the aggregate material cost.

mod drywall;
mod electrical;
mod flooring;
mod hvac;
mod painting;
mod plumbing;
mod roofing;
mod siding;

use std::collections::BTreeMap;

use super::{
    criteria::TradeCriteria,
    entities::{CalculatorResult, MaterialLineItem},
    trade::Trade,
};

/// Signature shared by every trade calculator.
pub type CalculatorFn = fn(&TradeCriteria) -> CalculatorResult;

/// Registry lookup. The match is exhaustive, so adding a trade without a
/// calculator does not compile.
pub fn calculator_for(trade: Trade) -> CalculatorFn {
    match trade {
        Trade::Roofing => roofing::calculate,
        Trade::Hvac => hvac::calculate,
        Trade::Electrical => electrical::calculate,
        Trade::Plumbing => plumbing::calculate,
        Trade::Flooring => flooring::calculate,
        Trade::Painting => painting::calculate,
        Trade::Drywall => drywall::calculate,
        Trade::Siding => siding::calculate,
    }
}

pub fn calculate(trade: Trade, criteria: &TradeCriteria) -> CalculatorResult {
    calculator_for(trade)(criteria)
}

/// Units priced by measure rather than by purchasable piece.
pub const CONTINUOUS_UNITS: [&str; 3] = ["ton", "lf", "sqft"];

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Whole units needed to cover `raw` when one unit covers `coverage`.
pub(crate) fn purchasable_units(raw: f64, coverage: f64) -> f64 {
    if raw <= 0.0 || coverage <= 0.0 {
        return 0.0;
    }
    // Trim float noise so 66.0000000001 does not buy an extra unit.
    let ratio = ((raw / coverage) * 1e9).round() / 1e9;
    ratio.ceil()
}

pub(crate) fn line_item(
    item: &str,
    quantity: f64,
    unit: &str,
    unit_cost: f64,
    category: &str,
) -> MaterialLineItem {
    MaterialLineItem {
        item: item.to_string(),
        quantity,
        unit: unit.to_string(),
        unit_cost,
        total_cost: round2(quantity * unit_cost),
        category: category.to_string(),
    }
}

/// Accumulates line items and diagnostics for one calculation.
#[derive(Default)]
pub(crate) struct Takeoff {
    items: Vec<MaterialLineItem>,
    breakdown: BTreeMap<String, f64>,
}

impl Takeoff {
    pub(crate) fn push(&mut self, item: MaterialLineItem) {
        self.items.push(item);
    }

    pub(crate) fn add(&mut self, item: &str, quantity: f64, unit: &str, unit_cost: f64, category: &str) {
        self.push(line_item(item, quantity, unit, unit_cost, category));
    }

    /// Adds the line only when there is something to buy.
    pub(crate) fn add_if_any(
        &mut self,
        item: &str,
        quantity: f64,
        unit: &str,
        unit_cost: f64,
        category: &str,
    ) {
        if quantity > 0.0 {
            self.add(item, quantity, unit, unit_cost, category);
        }
    }

    pub(crate) fn note(&mut self, key: &str, value: f64) {
        self.breakdown.insert(key.to_string(), value);
    }

    pub(crate) fn finish(self, aggregate_multiplier: f64, labor_hours: f64) -> CalculatorResult {
        let raw_total: f64 = self.items.iter().map(|item| item.total_cost).sum();
        let mut breakdown = self.breakdown;
        breakdown.insert("rawMaterialCost".to_string(), round2(raw_total));
        breakdown.insert("aggregateMultiplier".to_string(), aggregate_multiplier);
        CalculatorResult {
            total_material_cost: round2(raw_total * aggregate_multiplier),
            labor_hours: round2(labor_hours),
            material_list: self.items,
            breakdown,
        }
    }
}

/// Looks up an enum option in a static table, falling back to the default option.
pub(crate) fn option_value<T: Copy>(table: &[(&str, T)], selected: &str, default: &str) -> T {
    table
        .iter()
        .find(|(key, _)| *key == selected)
        .or_else(|| table.iter().find(|(key, _)| *key == default))
        .map(|(_, value)| *value)
        .unwrap_or_else(|| table[0].1)
}

/// Story-count multiplier shared by exterior trades.
pub(crate) fn story_multiplier(table: &[f64; 3], stories: u32) -> f64 {
    let index = stories.clamp(1, 3) as usize - 1;
    table[index]
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn purchasable_units_round_up() {
        assert_eq!(purchasable_units(100.0, 33.3), 4.0);
        assert_eq!(purchasable_units(99.9, 33.3), 3.0);
        assert_eq!(purchasable_units(0.0, 33.3), 0.0);
        assert_eq!(purchasable_units(1.0, 1000.0), 1.0);
    }

    #[test]
    fn round2_rounds_to_cents() {
        assert_eq!(round2(10.005_1), 10.01);
        assert_eq!(round2(3.14159), 3.14);
    }

    #[test]
    fn every_trade_has_a_deterministic_calculator() {
        let criteria = criteria(&[("squareFeet", num(1500.0))]);
        for trade in Trade::ALL {
            let first = calculate(trade, &criteria);
            let second = calculate(trade, &criteria);
            assert_eq!(
                serde_json::to_string(&first).unwrap(),
                serde_json::to_string(&second).unwrap(),
                "{trade} is not deterministic"
            );
            assert_totals_consistent(&first);
            for item in first.material_list.iter().filter(|i| !CONTINUOUS_UNITS.contains(&i.unit.as_str())) {
                assert_eq!(item.quantity, item.quantity.ceil(), "{trade}: {}", item.item);
            }
        }
    }

    #[test]
    fn calculators_tolerate_empty_criteria() {
        let criteria = TradeCriteria::default();
        for trade in Trade::ALL {
            let result = calculate(trade, &criteria);
            assert!(result.total_material_cost >= 0.0);
            assert!(result.labor_hours >= 0.0);
        }
    }

    #[test]
    fn calculators_tolerate_out_of_range_counts() {
        let count_keys = [
            "layers", "chimneys", "skylights", "valleys", "stories", "zones", "outletCount",
            "switchCount", "fixtureCount", "gfciCount", "ceilingFanCount", "rooms", "stairCount",
            "coats", "doorCount", "outsideCorners", "windowCount", "cornerCount",
        ];
        for value in [1.0e12, -5.0] {
            let criteria: TradeCriteria = count_keys
                .iter()
                .map(|key| (*key, num(value)))
                .chain([("squareFeet", num(1500.0))])
                .collect();
            for trade in Trade::ALL {
                let result = calculate(trade, &criteria);
                assert!(result.total_material_cost.is_finite(), "{trade} at {value}");
                assert!(result.total_material_cost >= 0.0, "{trade} at {value}");
                assert!(result.labor_hours.is_finite(), "{trade} at {value}");
            }
        }
    }

    #[test]
    fn option_value_falls_back_to_default() {
        let table = [("low", 1.0), ("medium", 1.1)];
        assert_eq!(option_value(&table, "medium", "low"), 1.1);
        assert_eq!(option_value(&table, "bogus", "medium"), 1.1);
    }
}
