use super::{option_value, purchasable_units, story_multiplier, Takeoff};
use crate::domain::{criteria::TradeCriteria, entities::CalculatorResult};

#[derive(Clone, Copy)]
struct Siding {
    name: &'static str,
    cost_per_square: f64,
    waste: f64,
    hours_per_square: f64,
}

const SIDING: [(&str, Siding); 5] = [
    (
        "vinyl",
        Siding {
            name: "Vinyl Siding",
            cost_per_square: 180.0,
            waste: 1.10,
            hours_per_square: 3.0,
        },
    ),
    (
        "engineered_wood",
        Siding {
            name: "Engineered Wood Siding",
            cost_per_square: 300.0,
            waste: 1.10,
            hours_per_square: 4.0,
        },
    ),
    (
        "fiber_cement",
        Siding {
            name: "Fiber Cement Siding",
            cost_per_square: 350.0,
            waste: 1.12,
            hours_per_square: 5.0,
        },
    ),
    (
        "metal",
        Siding {
            name: "Metal Siding",
            cost_per_square: 400.0,
            waste: 1.10,
            hours_per_square: 4.5,
        },
    ),
    (
        "wood",
        Siding {
            name: "Cedar Wood Siding",
            cost_per_square: 450.0,
            waste: 1.10,
            hours_per_square: 6.0,
        },
    ),
];

const STORY_MULTIPLIERS: [f64; 3] = [1.0, 1.2, 1.4];
const J_CHANNEL_FEET_PER_OPENING: f64 = 14.0;
const DUMPSTER_COST: f64 = 450.0;

pub fn calculate(criteria: &TradeCriteria) -> CalculatorResult {
    let area = criteria.number_or("squareFeet", 0.0).max(0.0);
    let siding = option_value(&SIDING, criteria.text_or("sidingType", "vinyl"), "vinyl");
    let stories = story_multiplier(&STORY_MULTIPLIERS, criteria.count_or("stories", 1));
    let openings = criteria.count_or("windowCount", 0) as f64 + criteria.count_or("doorCount", 0) as f64;
    let corners = criteria.count_or("cornerCount", 4) as f64;
    let remove_old = criteria.flag_or("removeOld", false);
    let insulated = criteria.flag_or("insulated", false);

    let covered_area = area * siding.waste;
    let squares = covered_area / 100.0;

    // Siding lists its core lines unconditionally, zero quantities included.
    let mut takeoff = Takeoff::default();
    takeoff.add(
        siding.name,
        purchasable_units(covered_area, 100.0),
        "square",
        siding.cost_per_square,
        "siding",
    );
    takeoff.add(
        "House Wrap (9 x 150 ft)",
        purchasable_units(area * 1.10, 1350.0),
        "roll",
        175.0,
        "weather barrier",
    );
    takeoff.add("Outside Corner Post", corners, "piece", 38.0, "trim");
    takeoff.add(
        "Siding Nails",
        purchasable_units(squares, 5.0),
        "box",
        40.0,
        "fasteners",
    );
    takeoff.add_if_any(
        "J-Channel (12.5 ft)",
        purchasable_units(openings * J_CHANNEL_FEET_PER_OPENING * 1.10, 12.5),
        "piece",
        8.0,
        "trim",
    );
    if insulated {
        takeoff.add(
            "Foam Backer Panels",
            purchasable_units(area * 1.10, 200.0),
            "bundle",
            45.0,
            "insulation",
        );
    }
    if remove_old {
        takeoff.add("Dumpster Rental (20 yd)", 1.0, "rental", DUMPSTER_COST, "disposal");
    }

    let install_hours = area / 100.0 * siding.hours_per_square;
    let opening_hours = openings * 0.75;
    let removal_hours = if remove_old { area / 100.0 } else { 0.0 };
    let labor_hours = (install_hours + opening_hours + removal_hours) * stories;

    takeoff.note("coveredArea", covered_area);
    takeoff.note("installHours", install_hours);
    takeoff.note("openingHours", opening_hours);
    takeoff.note("removalHours", removal_hours);
    takeoff.note("storyMultiplier", stories);

    takeoff.finish(1.0, labor_hours)
}
