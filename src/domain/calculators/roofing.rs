use super::{option_value, purchasable_units, story_multiplier, Takeoff};
use crate::domain::{criteria::TradeCriteria, entities::CalculatorResult};

const PITCH_MULTIPLIERS: [(&str, f64); 4] = [
    ("low", 1.0),
    ("medium", 1.1),
    ("steep", 1.25),
    ("very_steep", 1.4),
];

#[derive(Clone, Copy)]
struct Covering {
    name: &'static str,
    unit: &'static str,
    coverage_sqft: f64,
    unit_cost: f64,
    waste: f64,
    install_hours_per_square: f64,
}

const COVERINGS: [(&str, Covering); 4] = [
    (
        "asphalt",
        Covering {
            name: "3-Tab Asphalt Shingles",
            unit: "bundle",
            coverage_sqft: 33.3,
            unit_cost: 32.0,
            waste: 1.10,
            install_hours_per_square: 2.0,
        },
    ),
    (
        "architectural",
        Covering {
            name: "Architectural Shingles",
            unit: "bundle",
            coverage_sqft: 33.3,
            unit_cost: 42.0,
            waste: 1.10,
            install_hours_per_square: 2.2,
        },
    ),
    (
        "metal",
        Covering {
            name: "Standing Seam Metal Panels",
            unit: "panel",
            coverage_sqft: 36.0,
            unit_cost: 145.0,
            waste: 1.05,
            install_hours_per_square: 3.0,
        },
    ),
    (
        "tile",
        Covering {
            name: "Clay Roof Tile",
            unit: "square",
            coverage_sqft: 100.0,
            unit_cost: 475.0,
            waste: 1.15,
            install_hours_per_square: 4.0,
        },
    ),
];

const STORY_MULTIPLIERS: [f64; 3] = [1.0, 1.15, 1.3];
const COMPLEXITY_CAP: f64 = 1.3;
const VALLEY_LENGTH_FT: f64 = 20.0;
const TRIM_WASTE: f64 = 1.10;

/// Aggregate material multiplier for roof penetrations and valleys.
pub fn complexity_factor(chimneys: u32, skylights: u32, valleys: u32) -> f64 {
    let raw = 1.0 + chimneys as f64 * 0.05 + skylights as f64 * 0.03 + valleys as f64 * 0.04;
    raw.min(COMPLEXITY_CAP)
}

pub fn calculate(criteria: &TradeCriteria) -> CalculatorResult {
    let square_feet = criteria.number_or("squareFeet", 0.0).max(0.0);
    let pitch = option_value(&PITCH_MULTIPLIERS, criteria.text_or("pitch", "medium"), "medium");
    let covering = option_value(
        &COVERINGS,
        criteria.text_or("material", "architectural"),
        "architectural",
    );
    let tear_off = criteria.flag_or("tearOff", false);
    let layers = criteria.count_or("layers", 1).max(1);
    let chimneys = criteria.count_or("chimneys", 0);
    let skylights = criteria.count_or("skylights", 0);
    let valleys = criteria.count_or("valleys", 0);
    let stories = criteria.count_or("stories", 1);

    let roof_area = square_feet * pitch;
    let covered_area = roof_area * covering.waste;
    let squares = covered_area / 100.0;
    let perimeter = 4.0 * square_feet.sqrt();
    let ridge = square_feet.sqrt();

    let mut takeoff = Takeoff::default();
    takeoff.add(
        covering.name,
        purchasable_units(covered_area, covering.coverage_sqft),
        covering.unit,
        covering.unit_cost,
        "roofing",
    );
    takeoff.add(
        "Synthetic Underlayment",
        purchasable_units(roof_area * 1.10, 1000.0),
        "roll",
        95.0,
        "underlayment",
    );
    takeoff.add_if_any(
        "Ice & Water Shield",
        purchasable_units(valleys as f64 * VALLEY_LENGTH_FT, 66.7),
        "roll",
        85.0,
        "underlayment",
    );
    takeoff.add(
        "Drip Edge",
        purchasable_units(perimeter * TRIM_WASTE, 10.0),
        "piece",
        9.5,
        "trim",
    );
    takeoff.add(
        "Ridge Cap",
        purchasable_units(ridge * TRIM_WASTE, 33.0),
        "bundle",
        65.0,
        "trim",
    );
    takeoff.add(
        "Coil Roofing Nails",
        purchasable_units(squares, 4.0),
        "box",
        45.0,
        "fasteners",
    );
    takeoff.add_if_any("Chimney Flashing Kit", chimneys as f64, "kit", 125.0, "flashing");
    takeoff.add_if_any("Skylight Flashing Kit", skylights as f64, "kit", 95.0, "flashing");

    let tear_off_squares = if tear_off {
        roof_area / 100.0 * layers as f64
    } else {
        0.0
    };
    takeoff.add_if_any(
        "Dumpster Rental (20 yd)",
        purchasable_units(tear_off_squares, 15.0),
        "rental",
        450.0,
        "disposal",
    );

    let complexity = complexity_factor(chimneys, skylights, valleys);
    let install_hours = roof_area / 100.0 * covering.install_hours_per_square;
    let tear_off_hours = tear_off_squares * 1.0;
    let detail_hours = chimneys as f64 * 3.0 + skylights as f64 * 2.5 + valleys as f64 * 1.5;
    let story_factor = story_multiplier(&STORY_MULTIPLIERS, stories);
    let labor_hours = (install_hours + tear_off_hours + detail_hours) * story_factor;

    takeoff.note("roofArea", roof_area);
    takeoff.note("squares", squares);
    takeoff.note("pitchMultiplier", pitch);
    takeoff.note("complexityFactor", complexity);
    takeoff.note("installHours", install_hours);
    takeoff.note("tearOffHours", tear_off_hours);
    takeoff.note("detailHours", detail_hours);
    takeoff.note("storyMultiplier", story_factor);

    takeoff.finish(complexity, labor_hours)
}
