use super::{option_value, purchasable_units, story_multiplier, Takeoff};
use crate::domain::{criteria::TradeCriteria, entities::CalculatorResult};

const PAINT_QUALITY: [(&str, f64); 3] = [("standard", 35.0), ("premium", 55.0), ("ultra", 75.0)];
const EXTERIOR_PREMIUM: f64 = 10.0;

/// Prep multiplier on labor by surface condition.
const CONDITION: [(&str, f64); 3] = [("good", 1.0), ("fair", 1.2), ("poor", 1.5)];

const STORY_MULTIPLIERS: [f64; 3] = [1.0, 1.2, 1.4];

const PAINT_WASTE: f64 = 1.10;
const GALLON_COVERAGE_SQFT: f64 = 350.0;
const PRIMER_COVERAGE_SQFT: f64 = 300.0;
const TRIM_GALLON_COVERAGE_LF: f64 = 400.0;

pub fn calculate(criteria: &TradeCriteria) -> CalculatorResult {
    let area = criteria.number_or("squareFeet", 0.0).max(0.0);
    let exterior = criteria.text_or("surface", "interior") == "exterior";
    let coats = criteria.count_or("coats", 2).clamp(1, 4) as f64;
    let mut gallon_cost =
        option_value(&PAINT_QUALITY, criteria.text_or("paintQuality", "premium"), "premium");
    if exterior {
        gallon_cost += EXTERIOR_PREMIUM;
    }
    let condition_key = criteria.text_or("condition", "good");
    let condition = option_value(&CONDITION, condition_key, "good");
    let ceiling_area = criteria.number_or("ceilingSquareFeet", 0.0).max(0.0);
    let trim_feet = criteria.number_or("trimLinearFeet", 0.0).max(0.0);
    let doors = criteria.count_or("doorCount", 0) as f64;
    let stories = if exterior {
        story_multiplier(&STORY_MULTIPLIERS, criteria.count_or("stories", 1))
    } else {
        1.0
    };

    let mut takeoff = Takeoff::default();
    takeoff.add(
        if exterior { "Exterior Paint" } else { "Interior Wall Paint" },
        purchasable_units(area * coats * PAINT_WASTE, GALLON_COVERAGE_SQFT),
        "gallon",
        gallon_cost,
        "paint",
    );
    takeoff.add_if_any(
        "Ceiling Paint",
        purchasable_units(ceiling_area * coats * PAINT_WASTE, GALLON_COVERAGE_SQFT),
        "gallon",
        30.0,
        "paint",
    );
    if condition_key != "good" {
        takeoff.add(
            "Primer",
            purchasable_units(area * PAINT_WASTE, PRIMER_COVERAGE_SQFT),
            "gallon",
            28.0,
            "paint",
        );
    }
    takeoff.add_if_any(
        "Trim Enamel",
        purchasable_units(trim_feet * coats, TRIM_GALLON_COVERAGE_LF),
        "gallon",
        gallon_cost,
        "paint",
    );
    takeoff.add_if_any(
        "Painter's Caulk",
        purchasable_units(trim_feet, 50.0),
        "tube",
        6.0,
        "supplies",
    );
    takeoff.add(
        "Painting Supplies Kit",
        purchasable_units(area, 500.0).max(1.0),
        "kit",
        45.0,
        "supplies",
    );

    let wall_hours = area * 0.006 * coats;
    let prep_hours = area * 0.002;
    let ceiling_hours = ceiling_area * 0.01 * coats;
    let trim_hours = trim_feet * 0.02;
    let door_hours = doors * 1.0;
    let labor_hours =
        (wall_hours + prep_hours + ceiling_hours + trim_hours + door_hours) * condition * stories;

    takeoff.note("coats", coats);
    takeoff.note("wallHours", wall_hours);
    takeoff.note("prepHours", prep_hours);
    takeoff.note("ceilingHours", ceiling_hours);
    takeoff.note("trimHours", trim_hours);
    takeoff.note("conditionMultiplier", condition);
    takeoff.note("storyMultiplier", stories);

    takeoff.finish(1.0, labor_hours)
}
