//! Static reference data: county-seat anchor ZIPs, metro cost indices and
//! the climate table.
//!
//! The data is immutable once loaded. To pick up new files, build a new
//! [`ReferenceData`] and hand it to whoever needs it.

use std::path::Path;

use tracing::debug;

use super::entities::{CountySeatRecord, MetroAreaRecord};
use crate::util::assets::{self, AssetError};

const COUNTY_SEATS_FILE: &str = "county_seats.json";
const METRO_AREAS_FILE: &str = "metro_areas.json";

/// Freeze-thaw and snow-load states: shorter seasons, slower crews.
const COLD_CLIMATE_STATES: [&str; 22] = [
    "AK", "CO", "CT", "IA", "ID", "IL", "IN", "MA", "ME", "MI", "MN", "MT", "ND", "NE", "NH", "NY",
    "OH", "PA", "SD", "VT", "WI", "WY",
];
/// Heat and hurricane exposure.
const HOT_CLIMATE_STATES: [&str; 10] = ["AL", "AZ", "FL", "GA", "HI", "LA", "MS", "NV", "SC", "TX"];

const COLD_FACTOR: f64 = 1.15;
const HOT_FACTOR: f64 = 1.05;

/// Five ASCII digits.
pub fn is_valid_zip(zip: &str) -> bool {
    zip.len() == 5 && zip.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Clone, Debug)]
pub struct ReferenceData {
    county_seats: Vec<CountySeatRecord>,
    metros: Vec<MetroAreaRecord>,
}

impl ReferenceData {
    pub fn new(county_seats: Vec<CountySeatRecord>, metros: Vec<MetroAreaRecord>) -> Self {
        Self { county_seats, metros }
    }

    /// Reference data compiled into the binary.
    pub fn embedded() -> Result<Self, AssetError> {
        Ok(Self::new(
            assets::load_json(COUNTY_SEATS_FILE)?,
            assets::load_json(METRO_AREAS_FILE)?,
        ))
    }

    /// Loads `county_seats.json` and `metro_areas.json` from a directory.
    pub fn from_dir(dir: &Path) -> Result<Self, AssetError> {
        let data = Self::new(
            assets::load_json_file(&dir.join(COUNTY_SEATS_FILE))?,
            assets::load_json_file(&dir.join(METRO_AREAS_FILE))?,
        );
        debug!(
            dir = %dir.display(),
            county_seats = data.county_seats.len(),
            metros = data.metros.len(),
            "loaded reference data"
        );
        Ok(data)
    }

    pub fn county_seats(&self) -> &[CountySeatRecord] {
        &self.county_seats
    }

    pub fn metros(&self) -> &[MetroAreaRecord] {
        &self.metros
    }

    pub fn find_zip(&self, zip: &str) -> Option<&CountySeatRecord> {
        self.county_seats.iter().find(|record| record.zip == zip)
    }

    pub fn metro(&self, name: &str) -> Option<&MetroAreaRecord> {
        self.metros.iter().find(|metro| metro.name == name)
    }

    /// Nearest anchor for a ZIP that is not itself a county seat.
    ///
    /// The first record sharing the 3-digit prefix wins; failing that the
    /// first sharing the 2-digit prefix. Records are scanned in file order.
    pub fn interpolate_zip(&self, zip: &str) -> Option<&CountySeatRecord> {
        [3, 2].into_iter().find_map(|len| {
            let prefix = zip.get(..len)?;
            self.county_seats
                .iter()
                .find(|record| record.zip.starts_with(prefix))
        })
    }

    pub fn weather_factor(&self, state: &str) -> f64 {
        let state = state.trim().to_ascii_uppercase();
        if COLD_CLIMATE_STATES.contains(&state.as_str()) {
            COLD_FACTOR
        } else if HOT_CLIMATE_STATES.contains(&state.as_str()) {
            HOT_FACTOR
        } else {
            1.0
        }
    }

    /// Every county-seat ZIP once, in file order.
    pub fn worklist(&self) -> Vec<String> {
        let mut zips: Vec<String> = Vec::with_capacity(self.county_seats.len());
        for record in &self.county_seats {
            if !zips.contains(&record.zip) {
                zips.push(record.zip.clone());
            }
        }
        zips
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn seat(zip: &str, county: &str, state: &str) -> CountySeatRecord {
        CountySeatRecord {
            zip: zip.into(),
            county: county.into(),
            state: state.into(),
            metro: None,
        }
    }

    #[test]
    fn embedded_data_is_consistent() {
        let data = ReferenceData::embedded().unwrap();
        assert!(data.county_seats().len() >= 50);
        for record in data.county_seats() {
            assert!(is_valid_zip(&record.zip), "bad zip {}", record.zip);
            if let Some(metro) = &record.metro {
                let area = data.metro(metro).unwrap_or_else(|| panic!("unknown metro {metro}"));
                assert!(area.cost_index > 0.5 && area.cost_index < 2.0);
            }
        }
        assert!(data.county_seats().iter().any(|record| record.metro.is_none()));
    }

    #[test]
    fn three_digit_prefix_beats_earlier_two_digit_match() {
        let data = ReferenceData::new(
            vec![seat("10601", "Westchester", "NY"), seat("10007", "New York", "NY")],
            Vec::new(),
        );
        assert_eq!(data.interpolate_zip("10025").unwrap().zip, "10007");
        assert_eq!(data.interpolate_zip("10301").unwrap().zip, "10601");
        assert!(data.interpolate_zip("99999").is_none());
        assert!(data.interpolate_zip("9").is_none());
    }

    #[test]
    fn first_match_in_file_order_wins() {
        let data = ReferenceData::new(
            vec![seat("77002", "Harris", "TX"), seat("77550", "Galveston", "TX")],
            Vec::new(),
        );
        assert_eq!(data.interpolate_zip("77001").unwrap().county, "Harris");
    }

    #[test]
    fn weather_by_state() {
        let data = ReferenceData::new(Vec::new(), Vec::new());
        assert_eq!(data.weather_factor("MN"), 1.15);
        assert_eq!(data.weather_factor("fl"), 1.05);
        assert_eq!(data.weather_factor("CA"), 1.0);
    }

    #[test]
    fn worklist_is_deduplicated() {
        let data = ReferenceData::new(
            vec![
                seat("60602", "Cook", "IL"),
                seat("10007", "New York", "NY"),
                seat("60602", "Cook", "IL"),
            ],
            Vec::new(),
        );
        assert_eq!(data.worklist(), vec!["60602".to_string(), "10007".to_string()]);
    }

    #[test]
    fn loads_override_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(COUNTY_SEATS_FILE),
            r#"[{"zip":"12345","county":"Test","state":"NY","metro":"Testville"}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join(METRO_AREAS_FILE),
            r#"[{"name":"Testville","costIndex":1.2}]"#,
        )
        .unwrap();

        let data = ReferenceData::from_dir(dir.path()).unwrap();
        assert_eq!(data.find_zip("12345").unwrap().county, "Test");
        assert_eq!(data.metro("Testville").unwrap().area_code, None);
    }

    #[test]
    fn zip_validation() {
        assert!(is_valid_zip("02108"));
        assert!(!is_valid_zip("2108"));
        assert!(!is_valid_zip("0210a"));
    }
}
