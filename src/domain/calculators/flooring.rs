use super::{option_value, purchasable_units, Takeoff};
use crate::domain::{criteria::TradeCriteria, entities::CalculatorResult};

#[derive(Clone, Copy, PartialEq)]
enum Underlay {
    CarpetPad,
    TileSetting,
    Underlayment,
}

#[derive(Clone, Copy)]
struct Flooring {
    name: &'static str,
    unit: &'static str,
    coverage_sqft: f64,
    unit_cost: f64,
    waste: f64,
    hours_per_sqft: f64,
    underlay: Underlay,
}

const FLOORING: [(&str, Flooring); 6] = [
    (
        "carpet",
        Flooring {
            name: "Carpet",
            unit: "sq yd",
            coverage_sqft: 9.0,
            unit_cost: 28.0,
            waste: 1.10,
            hours_per_sqft: 0.02,
            underlay: Underlay::CarpetPad,
        },
    ),
    (
        "vinyl_plank",
        Flooring {
            name: "Luxury Vinyl Plank",
            unit: "box",
            coverage_sqft: 20.0,
            unit_cost: 55.0,
            waste: 1.10,
            hours_per_sqft: 0.03,
            underlay: Underlay::Underlayment,
        },
    ),
    (
        "laminate",
        Flooring {
            name: "Laminate Flooring",
            unit: "box",
            coverage_sqft: 22.0,
            unit_cost: 48.0,
            waste: 1.10,
            hours_per_sqft: 0.035,
            underlay: Underlay::Underlayment,
        },
    ),
    (
        "engineered_hardwood",
        Flooring {
            name: "Engineered Hardwood",
            unit: "box",
            coverage_sqft: 24.0,
            unit_cost: 115.0,
            waste: 1.12,
            hours_per_sqft: 0.05,
            underlay: Underlay::Underlayment,
        },
    ),
    (
        "hardwood",
        Flooring {
            name: "Solid Hardwood",
            unit: "box",
            coverage_sqft: 20.0,
            unit_cost: 140.0,
            waste: 1.12,
            hours_per_sqft: 0.06,
            underlay: Underlay::Underlayment,
        },
    ),
    (
        "tile",
        Flooring {
            name: "Porcelain Tile",
            unit: "box",
            coverage_sqft: 10.0,
            unit_cost: 32.0,
            waste: 1.15,
            hours_per_sqft: 0.09,
            underlay: Underlay::TileSetting,
        },
    ),
];

/// Removal labor per square foot by existing floor.
const REMOVAL_HOURS: [(&str, f64); 4] = [
    ("none", 0.0),
    ("carpet", 0.02),
    ("tile", 0.05),
    ("hardwood", 0.04),
];

const SUBFLOOR: [(&str, f64); 3] = [("good", 1.0), ("fair", 1.1), ("poor", 1.25)];

const DISPOSAL_FEE: f64 = 150.0;

pub fn calculate(criteria: &TradeCriteria) -> CalculatorResult {
    let square_feet = criteria.number_or("squareFeet", 0.0).max(0.0);
    let flooring = option_value(&FLOORING, criteria.text_or("flooringType", "laminate"), "laminate");
    let rooms = criteria.count_or("rooms", 1);
    let stairs = criteria.count_or("stairCount", 0) as f64;
    let baseboard = criteria.flag_or("includeBaseboard", false);
    let removal = criteria.text_or("removeExisting", "none");
    let subfloor_key = criteria.text_or("subfloorCondition", "good");
    let subfloor = option_value(&SUBFLOOR, subfloor_key, "good");

    let covered_area = square_feet * flooring.waste;

    let mut takeoff = Takeoff::default();
    takeoff.add(
        flooring.name,
        purchasable_units(covered_area, flooring.coverage_sqft),
        flooring.unit,
        flooring.unit_cost,
        "flooring",
    );
    match flooring.underlay {
        Underlay::CarpetPad => takeoff.add(
            "Carpet Pad",
            purchasable_units(covered_area, 270.0),
            "roll",
            95.0,
            "underlayment",
        ),
        Underlay::TileSetting => {
            takeoff.add(
                "Thinset Mortar (50 lb)",
                purchasable_units(covered_area, 90.0),
                "bag",
                22.0,
                "setting materials",
            );
            takeoff.add(
                "Grout",
                purchasable_units(covered_area, 100.0),
                "bag",
                18.0,
                "setting materials",
            );
        }
        Underlay::Underlayment => takeoff.add(
            "Foam Underlayment",
            purchasable_units(covered_area, 100.0),
            "roll",
            35.0,
            "underlayment",
        ),
    }

    takeoff.add("Transition Strip", rooms as f64, "each", 28.0, "trim");
    if baseboard {
        takeoff.add(
            "Baseboard (8 ft)",
            purchasable_units(4.0 * square_feet.sqrt() * 1.10, 8.0),
            "piece",
            14.0,
            "trim",
        );
    }
    takeoff.add_if_any("Stair Nosing", stairs, "each", 35.0, "trim");

    if subfloor_key == "poor" {
        takeoff.add(
            "Floor Leveling Compound",
            purchasable_units(square_feet * 0.25, 50.0),
            "bag",
            40.0,
            "prep",
        );
    }

    let removal_rate = option_value(&REMOVAL_HOURS, removal, "none");
    if removal_rate > 0.0 {
        takeoff.add("Old Flooring Disposal", 1.0, "job", DISPOSAL_FEE, "disposal");
    }

    let install_hours = square_feet * flooring.hours_per_sqft;
    let removal_hours = square_feet * removal_rate;
    let stair_hours = stairs * 0.75;
    let labor_hours = (install_hours + removal_hours + stair_hours) * subfloor;

    takeoff.note("coveredArea", covered_area);
    takeoff.note("installHours", install_hours);
    takeoff.note("removalHours", removal_hours);
    takeoff.note("stairHours", stair_hours);
    takeoff.note("subfloorMultiplier", subfloor);

    takeoff.finish(1.0, labor_hours)
}
