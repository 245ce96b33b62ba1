use super::{option_value, purchasable_units, Takeoff};
use crate::domain::{criteria::TradeCriteria, entities::CalculatorResult};

/// (criteria key, item, installed unit cost, hours per unit)
const DEVICES: [(&str, &str, f64, f64); 5] = [
    ("outletCount", "Outlets", 125.0, 0.5),
    ("switchCount", "Switches", 95.0, 0.4),
    ("fixtureCount", "Light Fixtures", 150.0, 1.0),
    ("gfciCount", "GFCI Outlets", 165.0, 0.6),
    ("ceilingFanCount", "Ceiling Fans", 225.0, 1.5),
];

/// (item, cost, hours)
const PANELS: [(&str, Option<(&str, f64, f64)>); 4] = [
    ("none", None),
    ("100A", Some(("Panel Upgrade (100A)", 1200.0, 8.0))),
    ("200A", Some(("Panel Upgrade (200A)", 1800.0, 10.0))),
    ("400A", Some(("Panel Upgrade (400A)", 3500.0, 16.0))),
];

/// Linear feet of cable per square foot of floor area.
const REWIRE_FEET_PER_SQFT: [(&str, f64); 3] = [("none", 0.0), ("partial", 0.5), ("full", 1.0)];

const HOME_AGE: [(&str, f64); 3] = [("new", 1.0), ("moderate", 1.15), ("old", 1.35)];

const CABLE_WASTE: f64 = 1.15;
const EV_CHARGER_COST: f64 = 1200.0;

pub fn calculate(criteria: &TradeCriteria) -> CalculatorResult {
    let mut takeoff = Takeoff::default();
    let mut device_hours = 0.0;

    // Device lines only appear when the count is non-zero.
    for (key, item, unit_cost, hours) in DEVICES {
        let count = criteria.count_or(key, 0) as f64;
        takeoff.add_if_any(item, count, "each", unit_cost, "devices");
        device_hours += count * hours;
    }

    let mut panel_hours = 0.0;
    if let Some((item, cost, hours)) =
        option_value(&PANELS, criteria.text_or("panelUpgrade", "none"), "none")
    {
        takeoff.add(item, 1.0, "each", cost, "service");
        panel_hours = hours;
    }

    let square_feet = criteria.number_or("squareFeet", 0.0).max(0.0);
    let cable_feet = square_feet
        * option_value(&REWIRE_FEET_PER_SQFT, criteria.text_or("rewire", "none"), "none")
        * CABLE_WASTE;
    takeoff.add_if_any(
        "NM-B 14/2 Cable (250 ft)",
        purchasable_units(cable_feet, 250.0),
        "roll",
        95.0,
        "wiring",
    );
    let rewire_hours = cable_feet * 0.02;

    let ev_charger = criteria.flag_or("evCharger", false);
    if ev_charger {
        takeoff.add("Level 2 EV Charger Circuit", 1.0, "job", EV_CHARGER_COST, "add-ons");
    }
    let ev_hours = if ev_charger { 6.0 } else { 0.0 };

    let age = option_value(&HOME_AGE, criteria.text_or("homeAge", "moderate"), "moderate");
    let labor_hours = (device_hours + panel_hours + rewire_hours + ev_hours) * age;

    takeoff.note("deviceHours", device_hours);
    takeoff.note("panelHours", panel_hours);
    takeoff.note("cableFeet", cable_feet);
    takeoff.note("rewireHours", rewire_hours);
    takeoff.note("homeAgeMultiplier", age);

    takeoff.finish(1.0, labor_hours)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn outlets_price_per_device_and_zero_counts_are_omitted() {
        let result = calculate(&criteria(&[("outletCount", num(10.0)), ("switchCount", num(0.0))]));

        let outlets = find(&result, "Outlets").unwrap();
        assert_eq!(outlets.quantity, 10.0);
        assert_eq!(outlets.total_cost, 1250.0);
        assert!(find(&result, "Switches").is_none());
        assert_eq!(result.material_list.len(), 1);
        // 10 × 0.5 h × 1.15 (moderate)
        assert_eq!(result.labor_hours, 5.75);
    }

    #[test]
    fn panel_upgrade_and_ev_charger() {
        let result = calculate(&criteria(&[
            ("panelUpgrade", text("200A")),
            ("evCharger", flag(true)),
            ("homeAge", text("new")),
        ]));
        assert_eq!(find(&result, "Panel Upgrade (200A)").unwrap().total_cost, 1800.0);
        assert_eq!(result.total_material_cost, 3000.0);
        assert_eq!(result.labor_hours, 16.0);
    }

    #[test]
    fn full_rewire_buys_whole_rolls() {
        let result = calculate(&criteria(&[
            ("rewire", text("full")),
            ("squareFeet", num(1500.0)),
            ("homeAge", text("old")),
        ]));
        // 1500 × 1.0 × 1.15 = 1725 lf → 7 rolls
        let cable = find(&result, "NM-B 14/2 Cable (250 ft)").unwrap();
        assert_eq!(cable.quantity, 7.0);
        assert_eq!(cable.total_cost, 665.0);
        assert_totals_consistent(&result);
    }

    #[test]
    fn empty_job_costs_nothing() {
        let result = calculate(&TradeCriteria::default());
        assert!(result.material_list.is_empty());
        assert_eq!(result.total_material_cost, 0.0);
        assert_eq!(result.labor_hours, 0.0);
    }
}
