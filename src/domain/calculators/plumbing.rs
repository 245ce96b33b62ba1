use super::{option_value, purchasable_units, Takeoff};
use crate::domain::{criteria::TradeCriteria, entities::CalculatorResult};

/// (stick name, cost per foot)
const PIPE_MATERIALS: [(&str, (&str, f64)); 3] = [
    ("pex", ("PEX Pipe (10 ft)", 0.85)),
    ("cpvc", ("CPVC Pipe (10 ft)", 1.10)),
    ("copper", ("Copper Pipe Type L (10 ft)", 3.50)),
];

/// (item, cost, install hours, needs expansion tank)
const WATER_HEATERS: [(&str, Option<(&str, f64, f64, bool)>); 4] = [
    ("none", None),
    ("tank_40", Some(("40 Gal Tank Water Heater", 950.0, 4.0, true))),
    ("tank_50", Some(("50 Gal Tank Water Heater", 1150.0, 4.0, true))),
    ("tankless", Some(("Tankless Water Heater", 2400.0, 8.0, false))),
];

const ACCESS: [(&str, f64); 3] = [("easy", 1.0), ("moderate", 1.2), ("difficult", 1.5)];

const STICK_LENGTH_FT: f64 = 10.0;
const PIPE_WASTE: f64 = 1.10;
const GAS_LINE_COST: f64 = 1000.0;
const SEWER_LINE_COST: f64 = 3500.0;

pub fn calculate(criteria: &TradeCriteria) -> CalculatorResult {
    let fixtures = criteria.count_or("fixtureCount", 0) as f64;
    let repipe_feet = criteria.number_or("repipeLinearFeet", 0.0).max(0.0);
    let (pipe_name, cost_per_foot) =
        option_value(&PIPE_MATERIALS, criteria.text_or("pipeMaterial", "pex"), "pex");
    let heater = option_value(&WATER_HEATERS, criteria.text_or("waterHeater", "none"), "none");
    let gas_line = criteria.flag_or("gasLineNeeded", false);
    let sewer_line = criteria.flag_or("sewerLine", false);
    let access = option_value(
        &ACCESS,
        criteria.text_or("accessDifficulty", "moderate"),
        "moderate",
    );

    let mut takeoff = Takeoff::default();
    // Always on the list, even for a diagnostic-only visit.
    takeoff.add("Miscellaneous Plumbing Supplies", 1.0, "kit", 75.0, "supplies");
    takeoff.add_if_any("Fixture Supply & Drain Kit", fixtures, "kit", 85.0, "fixtures");

    let pipe_feet = repipe_feet * PIPE_WASTE;
    takeoff.add_if_any(
        pipe_name,
        purchasable_units(pipe_feet, STICK_LENGTH_FT),
        "stick",
        super::round2(cost_per_foot * STICK_LENGTH_FT),
        "pipe",
    );
    takeoff.add_if_any(
        "Fittings Pack",
        purchasable_units(repipe_feet, 20.0),
        "pack",
        12.0,
        "pipe",
    );

    let mut heater_hours = 0.0;
    if let Some((item, cost, hours, expansion_tank)) = heater {
        takeoff.add(item, 1.0, "each", cost, "water heater");
        if expansion_tank {
            takeoff.add("Thermal Expansion Tank", 1.0, "each", 65.0, "water heater");
        }
        heater_hours = hours;
    }

    if gas_line {
        takeoff.add("Gas Line Installation", 1.0, "job", GAS_LINE_COST, "add-ons");
    }
    if sewer_line {
        takeoff.add("Sewer Line Replacement", 1.0, "job", SEWER_LINE_COST, "add-ons");
    }

    let fixture_hours = fixtures * 2.5;
    let repipe_hours = repipe_feet * 0.08;
    let add_on_hours = if gas_line { 6.0 } else { 0.0 };
    let sewer_hours = if sewer_line { 16.0 } else { 0.0 };
    let labor_hours =
        (1.0 + fixture_hours + repipe_hours + heater_hours + add_on_hours + sewer_hours) * access;

    takeoff.note("pipeFeet", pipe_feet);
    takeoff.note("fixtureHours", fixture_hours);
    takeoff.note("repipeHours", repipe_hours);
    takeoff.note("heaterHours", heater_hours);
    takeoff.note("accessMultiplier", access);

    takeoff.finish(1.0, labor_hours)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn supplies_line_is_always_present() {
        let result = calculate(&TradeCriteria::default());
        assert_eq!(result.material_list.len(), 1);
        assert_eq!(result.total_material_cost, 75.0);
        // diagnostic hour × moderate access
        assert_eq!(result.labor_hours, 1.2);
    }

    #[test]
    fn repipe_buys_sticks_and_fittings() {
        let result = calculate(&criteria(&[
            ("repipeLinearFeet", num(150.0)),
            ("pipeMaterial", text("copper")),
            ("accessDifficulty", text("easy")),
        ]));
        // 150 × 1.10 = 165 ft → 17 sticks at $35
        let pipe = find(&result, "Copper Pipe Type L (10 ft)").unwrap();
        assert_eq!(pipe.quantity, 17.0);
        assert_eq!(pipe.unit_cost, 35.0);
        assert_eq!(find(&result, "Fittings Pack").unwrap().quantity, 8.0);
        // 1 + 150 × 0.08
        assert_eq!(result.labor_hours, 13.0);
        assert_totals_consistent(&result);
    }

    #[test]
    fn tank_heater_brings_expansion_tank() {
        let result = calculate(&criteria(&[("waterHeater", text("tank_50"))]));
        assert!(find(&result, "Thermal Expansion Tank").is_some());

        let tankless = calculate(&criteria(&[("waterHeater", text("tankless"))]));
        assert!(find(&tankless, "Thermal Expansion Tank").is_none());
        assert_eq!(tankless.total_material_cost, 2475.0);
    }

    #[test]
    fn fixed_add_ons() {
        let result = calculate(&criteria(&[
            ("gasLineNeeded", flag(true)),
            ("sewerLine", flag(true)),
            ("fixtureCount", num(2.0)),
        ]));
        assert_eq!(result.total_material_cost, 75.0 + 170.0 + 1000.0 + 3500.0);
    }
}
