use super::{option_value, purchasable_units, Takeoff};
use crate::domain::{criteria::TradeCriteria, entities::CalculatorResult};

#[derive(Clone, Copy, PartialEq)]
enum Layout {
    Split,
    Furnace,
    Ductless,
}

#[derive(Clone, Copy)]
struct System {
    name: &'static str,
    cost_per_ton: f64,
    base_hours: f64,
    layout: Layout,
}

const SYSTEMS: [(&str, System); 5] = [
    (
        "central_ac",
        System {
            name: "Central AC Condenser & Coil",
            cost_per_ton: 1100.0,
            base_hours: 16.0,
            layout: Layout::Split,
        },
    ),
    (
        "heat_pump",
        System {
            name: "Heat Pump System",
            cost_per_ton: 1350.0,
            base_hours: 18.0,
            layout: Layout::Split,
        },
    ),
    (
        "furnace",
        System {
            name: "Gas Furnace",
            cost_per_ton: 900.0,
            base_hours: 12.0,
            layout: Layout::Furnace,
        },
    ),
    (
        "ductless_mini_split",
        System {
            name: "Ductless Outdoor Condenser",
            cost_per_ton: 1250.0,
            base_hours: 8.0,
            layout: Layout::Ductless,
        },
    ),
    (
        "dual_fuel",
        System {
            name: "Dual Fuel Heat Pump & Furnace",
            cost_per_ton: 1800.0,
            base_hours: 24.0,
            layout: Layout::Split,
        },
    ),
];

const EFFICIENCY: [(&str, f64); 3] = [("standard", 1.0), ("high", 1.2), ("premium", 1.45)];

const THERMOSTATS: [(&str, (&str, f64)); 3] = [
    ("basic", ("Basic Thermostat", 45.0)),
    ("programmable", ("Programmable Thermostat", 120.0)),
    ("smart", ("Smart Thermostat", 250.0)),
];

/// Duct run per square foot of conditioned space, by ductwork scope.
const DUCT_FEET_PER_SQFT: [(&str, f64); 4] = [
    ("none", 0.0),
    ("repair", 0.0),
    ("partial", 0.05),
    ("full", 0.10),
];

const DUCT_HOURS_PER_SQFT: [(&str, f64); 4] = [
    ("none", 0.0),
    ("repair", 0.0),
    ("partial", 0.01),
    ("full", 0.02),
];

const GAS_LINE_COST: f64 = 1000.0;
const ELECTRICAL_UPGRADE_COST: f64 = 800.0;
const REMOVAL_COST: f64 = 350.0;

/// Half-ton sizing at 600 sqft per ton, clamped to residential equipment.
fn tonnage(square_feet: f64) -> f64 {
    ((square_feet / 600.0 * 2.0).ceil() / 2.0).clamp(1.5, 5.0)
}

pub fn calculate(criteria: &TradeCriteria) -> CalculatorResult {
    let square_feet = criteria.number_or("squareFeet", 0.0).max(0.0);
    let system = option_value(&SYSTEMS, criteria.text_or("systemType", "central_ac"), "central_ac");
    let efficiency = option_value(&EFFICIENCY, criteria.text_or("efficiency", "standard"), "standard");
    let ductwork = criteria.text_or("ductwork", "none");
    let zones = criteria.count_or("zones", 1).clamp(1, 6);
    let (thermostat_name, thermostat_cost) = option_value(
        &THERMOSTATS,
        criteria.text_or("thermostat", "programmable"),
        "programmable",
    );
    let gas_line = criteria.flag_or("gasLineNeeded", false);
    let electrical_upgrade = criteria.flag_or("electricalUpgrade", false);
    let remove_old = criteria.flag_or("removeOld", true);

    let tons = tonnage(square_feet);
    let equipment_cost = super::round2(system.cost_per_ton * efficiency);

    let mut takeoff = Takeoff::default();
    takeoff.add(system.name, tons, "ton", equipment_cost, "equipment");

    match system.layout {
        Layout::Split => {
            takeoff.add("Refrigerant Line Set", 1.0, "kit", 180.0, "equipment");
            takeoff.add("Condenser Pad", 1.0, "each", 95.0, "equipment");
        }
        Layout::Furnace => {
            takeoff.add("Flue Vent Kit", 1.0, "kit", 140.0, "equipment");
        }
        Layout::Ductless => {
            takeoff.add("Ductless Indoor Head", zones as f64, "each", 650.0, "equipment");
            takeoff.add("Line Set Kit (25 ft)", zones as f64, "kit", 120.0, "equipment");
        }
    }

    let duct_feet = square_feet * option_value(&DUCT_FEET_PER_SQFT, ductwork, "none");
    if ductwork == "repair" {
        takeoff.add("Duct Sealing & Repair Kit", 1.0, "job", 600.0, "ductwork");
    }
    takeoff.add_if_any(
        "Duct Section (25 ft)",
        purchasable_units(duct_feet * 1.10, 25.0),
        "section",
        85.0,
        "ductwork",
    );
    if ductwork == "full" {
        takeoff.add(
            "Supply Register",
            purchasable_units(square_feet, 150.0),
            "each",
            18.0,
            "ductwork",
        );
    }

    takeoff.add(thermostat_name, zones as f64, "each", thermostat_cost, "controls");

    if gas_line {
        takeoff.add("Gas Line Installation", 1.0, "job", GAS_LINE_COST, "add-ons");
    }
    if electrical_upgrade {
        takeoff.add("Electrical Circuit Upgrade", 1.0, "job", ELECTRICAL_UPGRADE_COST, "add-ons");
    }
    if remove_old {
        takeoff.add("Old Equipment Removal & Disposal", 1.0, "job", REMOVAL_COST, "add-ons");
    }

    let system_hours = if system.layout == Layout::Ductless {
        system.base_hours * zones as f64
    } else {
        system.base_hours + (zones - 1) as f64 * 4.0
    };
    let equipment_hours = system_hours + tons * 2.0;
    let duct_hours = if ductwork == "repair" {
        6.0
    } else {
        square_feet * option_value(&DUCT_HOURS_PER_SQFT, ductwork, "none")
    };
    let add_on_hours = [(gas_line, 6.0), (electrical_upgrade, 4.0), (remove_old, 4.0)]
        .iter()
        .filter(|(enabled, _)| *enabled)
        .map(|(_, hours)| hours)
        .sum::<f64>();

    takeoff.note("tonnage", tons);
    takeoff.note("efficiencyMultiplier", efficiency);
    takeoff.note("ductFeet", duct_feet);
    takeoff.note("equipmentHours", equipment_hours);
    takeoff.note("ductHours", duct_hours);
    takeoff.note("addOnHours", add_on_hours);

    takeoff.finish(1.0, equipment_hours + duct_hours + add_on_hours)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn tonnage_rounds_to_half_tons_within_bounds() {
        assert_eq!(tonnage(1500.0), 2.5);
        assert_eq!(tonnage(1800.0), 3.0);
        assert_eq!(tonnage(400.0), 1.5);
        assert_eq!(tonnage(9000.0), 5.0);
    }

    #[test]
    fn central_air_with_defaults() {
        let result = calculate(&criteria(&[("squareFeet", num(1800.0))]));

        let condenser = find(&result, "Central AC Condenser & Coil").unwrap();
        assert_eq!(condenser.quantity, 3.0);
        assert_eq!(condenser.total_cost, 3300.0);
        assert!(find(&result, "Refrigerant Line Set").is_some());
        assert!(find(&result, "Programmable Thermostat").is_some());
        // removeOld defaults to true.
        assert_eq!(find(&result, "Old Equipment Removal & Disposal").unwrap().total_cost, 350.0);
        assert!(find(&result, "Gas Line Installation").is_none());
        // 3300 + 180 + 95 + 120 + 350
        assert_eq!(result.total_material_cost, 4045.0);
        // 16 base + 3 tons × 2 + 4 removal
        assert_eq!(result.labor_hours, 26.0);
        assert_totals_consistent(&result);
    }

    #[test]
    fn gas_line_is_a_fixed_add_on() {
        let without = calculate(&criteria(&[("squareFeet", num(1800.0))]));
        let with = calculate(&criteria(&[
            ("squareFeet", num(1800.0)),
            ("gasLineNeeded", flag(true)),
        ]));
        assert_eq!(with.total_material_cost - without.total_material_cost, 1000.0);
        assert_eq!(with.labor_hours - without.labor_hours, 6.0);
    }

    #[test]
    fn efficiency_scales_equipment_unit_cost() {
        let result = calculate(&criteria(&[
            ("squareFeet", num(1800.0)),
            ("efficiency", text("premium")),
            ("systemType", text("heat_pump")),
        ]));
        let unit = find(&result, "Heat Pump System").unwrap();
        assert_eq!(unit.unit_cost, 1957.5);
        assert_eq!(unit.total_cost, 5872.5);
    }

    #[test]
    fn ductless_prices_heads_per_zone() {
        let result = calculate(&criteria(&[
            ("squareFeet", num(1200.0)),
            ("systemType", text("ductless_mini_split")),
            ("zones", num(3.0)),
            ("removeOld", flag(false)),
        ]));
        assert_eq!(find(&result, "Ductless Indoor Head").unwrap().quantity, 3.0);
        assert_eq!(find(&result, "Line Set Kit (25 ft)").unwrap().total_cost, 360.0);
        assert!(find(&result, "Condenser Pad").is_none());
        // 8 h × 3 zones + 2 tons × 2
        assert_eq!(result.labor_hours, 28.0);
    }

    #[test]
    fn full_ductwork_adds_sections_and_registers() {
        let result = calculate(&criteria(&[
            ("squareFeet", num(2000.0)),
            ("ductwork", text("full")),
        ]));
        // 200 lf × 1.10 = 220 → 9 sections of 25 ft
        assert_eq!(find(&result, "Duct Section (25 ft)").unwrap().quantity, 9.0);
        assert_eq!(find(&result, "Supply Register").unwrap().quantity, 14.0);
        assert_totals_consistent(&result);
    }
}
