//! Construction trades the engine knows how to price.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trade {
    Roofing,
    Hvac,
    Electrical,
    Plumbing,
    Flooring,
    Painting,
    Drywall,
    Siding,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown trade: {0}")]
pub struct UnknownTrade(pub String);

impl Trade {
    pub const ALL: [Trade; 8] = [
        Trade::Roofing,
        Trade::Hvac,
        Trade::Electrical,
        Trade::Plumbing,
        Trade::Flooring,
        Trade::Painting,
        Trade::Drywall,
        Trade::Siding,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Trade::Roofing => "roofing",
            Trade::Hvac => "hvac",
            Trade::Electrical => "electrical",
            Trade::Plumbing => "plumbing",
            Trade::Flooring => "flooring",
            Trade::Painting => "painting",
            Trade::Drywall => "drywall",
            Trade::Siding => "siding",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Trade::Roofing => "Roofing",
            Trade::Hvac => "HVAC",
            Trade::Electrical => "Electrical",
            Trade::Plumbing => "Plumbing",
            Trade::Flooring => "Flooring",
            Trade::Painting => "Painting",
            Trade::Drywall => "Drywall",
            Trade::Siding => "Siding",
        }
    }

    /// Standard Occupational Classification code used by the labor survey.
    pub fn occupation_code(&self) -> &'static str {
        match self {
            Trade::Roofing => "47-2181",
            Trade::Hvac => "49-9021",
            Trade::Electrical => "47-2111",
            Trade::Plumbing => "47-2152",
            Trade::Flooring => "47-2042",
            Trade::Painting => "47-2141",
            Trade::Drywall => "47-2081",
            Trade::Siding => "47-2031",
        }
    }

    /// Hourly rate used when neither the metro nor the national survey answers.
    pub fn fallback_labor_rate(&self) -> f64 {
        match self {
            Trade::Roofing => 45.0,
            Trade::Hvac => 55.0,
            Trade::Electrical => 60.0,
            Trade::Plumbing => 58.0,
            Trade::Flooring => 40.0,
            Trade::Painting => 38.0,
            Trade::Drywall => 42.0,
            Trade::Siding => 44.0,
        }
    }

    /// Retail search term and the catalog price it is benchmarked against.
    pub fn benchmark_material(&self) -> (&'static str, f64) {
        match self {
            Trade::Roofing => ("architectural shingles bundle", 42.0),
            Trade::Hvac => ("smart thermostat", 250.0),
            Trade::Electrical => ("14/2 nm-b wire 250 ft", 95.0),
            Trade::Plumbing => ("pex pipe 100 ft", 85.0),
            Trade::Flooring => ("laminate flooring box", 48.0),
            Trade::Painting => ("interior paint gallon", 55.0),
            Trade::Drywall => ("drywall sheet 4x8 1/2 in", 14.0),
            Trade::Siding => ("vinyl siding square", 180.0),
        }
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Trade {
    type Err = UnknownTrade;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        Trade::ALL
            .iter()
            .copied()
            .find(|trade| trade.as_str() == normalized)
            .ok_or_else(|| UnknownTrade(raw.to_string()))
    }
}
