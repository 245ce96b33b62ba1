use super::{option_value, purchasable_units, Takeoff};
use crate::domain::{criteria::TradeCriteria, entities::CalculatorResult};

const SHEET_AREA: [(&str, f64); 2] = [("4x8", 32.0), ("4x12", 48.0)];

/// Sheet price by thickness and size.
const SHEET_PRICES: [(&str, [f64; 2]); 2] = [
    ("half_inch", [14.0, 19.0]),
    ("five_eighths", [17.0, 23.0]),
];

const MOISTURE_RESISTANT_UPCHARGE: f64 = 6.0;

/// (labor factor on finishing, joint compound factor)
const FINISH_LEVEL: [(&str, (f64, f64)); 3] = [
    ("level_3", (0.85, 0.8)),
    ("level_4", (1.0, 1.0)),
    ("level_5", (1.3, 1.4)),
];

const CEILING_HEIGHT: [(&str, f64); 2] = [("standard", 1.0), ("high", 1.2)];

const SHEET_WASTE: f64 = 1.12;
const TAPE_FEET_PER_SQFT: f64 = 0.37;
const DISPOSAL_FEE: f64 = 250.0;

pub fn calculate(criteria: &TradeCriteria) -> CalculatorResult {
    let area = criteria.number_or("squareFeet", 0.0).max(0.0);
    let size_key = criteria.text_or("sheetSize", "4x8");
    let sheet_area = option_value(&SHEET_AREA, size_key, "4x8");
    let prices = option_value(&SHEET_PRICES, criteria.text_or("thickness", "half_inch"), "half_inch");
    let mut sheet_cost = if sheet_area == 48.0 { prices[1] } else { prices[0] };
    let moisture_resistant = criteria.flag_or("moistureResistant", false);
    if moisture_resistant {
        sheet_cost += MOISTURE_RESISTANT_UPCHARGE;
    }
    let (finish_factor, mud_factor) =
        option_value(&FINISH_LEVEL, criteria.text_or("finishLevel", "level_4"), "level_4");
    let ceiling = option_value(&CEILING_HEIGHT, criteria.text_or("ceilingHeight", "standard"), "standard");
    let corners = criteria.count_or("outsideCorners", 0) as f64;
    let remove_existing = criteria.flag_or("removeExisting", false);

    let sheets = purchasable_units(area * SHEET_WASTE, sheet_area);
    let sheet_name = match (moisture_resistant, sheet_area == 48.0) {
        (false, false) => "Drywall Sheet 4x8",
        (false, true) => "Drywall Sheet 4x12",
        (true, false) => "Moisture Resistant Drywall 4x8",
        (true, true) => "Moisture Resistant Drywall 4x12",
    };

    let mut takeoff = Takeoff::default();
    takeoff.add(sheet_name, sheets, "sheet", sheet_cost, "board");
    // Screws follow the sheet count, which already carries waste.
    takeoff.add(
        "Drywall Screws (5 lb)",
        purchasable_units(sheets, 40.0),
        "box",
        28.0,
        "fasteners",
    );
    takeoff.add(
        "Joint Compound (4.5 gal)",
        purchasable_units(area * mud_factor, 450.0),
        "bucket",
        18.0,
        "finishing",
    );
    takeoff.add(
        "Paper Joint Tape (500 ft)",
        purchasable_units(area * TAPE_FEET_PER_SQFT, 500.0),
        "roll",
        6.0,
        "finishing",
    );
    takeoff.add_if_any("Corner Bead (8 ft)", corners, "piece", 4.5, "finishing");
    if remove_existing {
        takeoff.add("Debris Disposal", 1.0, "job", DISPOSAL_FEE, "disposal");
    }

    let hang_hours = area * 0.015;
    let finish_hours = area * 0.02 * finish_factor;
    let sand_hours = area * 0.005;
    let removal_hours = if remove_existing { area * 0.01 } else { 0.0 };
    let corner_hours = corners * 0.25;
    let labor_hours = (hang_hours + finish_hours + sand_hours + removal_hours + corner_hours) * ceiling;

    takeoff.note("sheetArea", sheet_area);
    takeoff.note("hangHours", hang_hours);
    takeoff.note("finishHours", finish_hours);
    takeoff.note("sandHours", sand_hours);
    takeoff.note("removalHours", removal_hours);
    takeoff.note("ceilingMultiplier", ceiling);

    takeoff.finish(1.0, labor_hours)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn standard_board_takeoff() {
        let result = calculate(&criteria(&[("squareFeet", num(1000.0))]));
        // 1000 × 1.12 = 1120 sqft → 35 sheets of 32 sqft
        let sheets = find(&result, "Drywall Sheet 4x8").unwrap();
        assert_eq!(sheets.quantity, 35.0);
        assert_eq!(sheets.total_cost, 490.0);
        assert_eq!(find(&result, "Drywall Screws (5 lb)").unwrap().quantity, 1.0);
        assert_eq!(find(&result, "Joint Compound (4.5 gal)").unwrap().quantity, 3.0);
        assert_eq!(find(&result, "Paper Joint Tape (500 ft)").unwrap().quantity, 1.0);
        assert!(find(&result, "Corner Bead (8 ft)").is_none());
        assert_eq!(result.total_material_cost, 578.0);
        assert_eq!(result.labor_hours, 40.0);
    }

    #[test]
    fn large_moisture_resistant_sheets() {
        let result = calculate(&criteria(&[
            ("squareFeet", num(1000.0)),
            ("sheetSize", text("4x12")),
            ("thickness", text("five_eighths")),
            ("moistureResistant", flag(true)),
        ]));
        let sheets = find(&result, "Moisture Resistant Drywall 4x12").unwrap();
        // 1120 / 48 = 23.3 → 24 sheets at 23 + 6
        assert_eq!(sheets.quantity, 24.0);
        assert_eq!(sheets.unit_cost, 29.0);
    }

    #[test]
    fn level_five_finish_and_high_ceilings() {
        let result = calculate(&criteria(&[
            ("squareFeet", num(1000.0)),
            ("finishLevel", text("level_5")),
            ("ceilingHeight", text("high")),
            ("outsideCorners", num(4.0)),
        ]));
        assert_eq!(find(&result, "Joint Compound (4.5 gal)").unwrap().quantity, 4.0);
        assert_eq!(find(&result, "Corner Bead (8 ft)").unwrap().total_cost, 18.0);
        // (15 + 26 + 5 + 1) × 1.2
        assert_eq!(result.labor_hours, 56.4);
        assert_totals_consistent(&result);
    }
}
