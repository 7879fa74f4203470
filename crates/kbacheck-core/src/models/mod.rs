//! Data models and configuration.

pub mod config;
pub mod validation;
pub mod vehicle;

pub use validation::{filter_results, ApprovalStatus, ValidationResult};
pub use vehicle::{
    CodeCategory, RegulatoryCode, TireCodes, TireCombination, TireEntry, VehicleAttribute,
    VehicleRecord,
};
