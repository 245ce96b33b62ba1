//! Pricing domain: trades, criteria, calculators and the data they share.

pub mod calculators;
pub mod criteria;
pub mod entities;
pub mod estimate;
pub mod fields;
pub mod reference;
pub mod trade;

pub use criteria::{CriteriaValue, TradeCriteria};
pub use entities::{
    CalculatorResult, CountySeatRecord, FinalEstimate, LaborSource, MaterialLineItem,
    MetroAreaRecord, RegionalPricingProfile, Timeline,
};
pub use fields::{FieldCatalog, FieldDefinition, FieldIssue, FieldKind, ValidationError};
pub use reference::{is_valid_zip, ReferenceData};
pub use trade::{Trade, UnknownTrade};
