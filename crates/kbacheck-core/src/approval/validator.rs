//! Vehicle/tire combination validation.

use tracing::debug;

use super::rules::TireSize;
use crate::glossary::CodeGlossary;
use crate::models::config::ValidationConfig;
use crate::models::{ApprovalStatus, TireEntry, ValidationResult, VehicleRecord};

pub const INVALID_TIRE_FORMAT: &str = "invalid tire format";
pub const UNUSUAL_WIDTH: &str = "unusual tire width";
pub const UNUSUAL_ASPECT_RATIO: &str = "unusual aspect ratio";
pub const UNUSUAL_RIM_DIAMETER: &str = "unusual rim diameter";

/// Checks tire dimensions and annotates codes from the glossary.
#[derive(Debug, Clone, Default)]
pub struct CombinationValidator {
    config: ValidationConfig,
}

impl CombinationValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate one tire entry of a vehicle.
    pub fn validate(
        &self,
        vehicle_name: &str,
        tire: &TireEntry,
        glossary: &CodeGlossary,
    ) -> ValidationResult {
        let size = match TireSize::parse(&tire.size) {
            Ok(size) => size,
            Err(e) => {
                debug!("{}: {}", vehicle_name, e);
                return ValidationResult {
                    vehicle_name: vehicle_name.to_string(),
                    tire_size: tire.size.clone(),
                    status: ApprovalStatus::NotApproved,
                    dimensional_warnings: vec![INVALID_TIRE_FORMAT.to_string()],
                    restrictions: Vec::new(),
                    notes: Vec::new(),
                    tire_combinations: tire.codes.tire_combinations.clone(),
                    raw_codes: tire.codes.clone(),
                };
            }
        };

        let dimensional_warnings = self.dimensional_warnings(&size);

        let status = if !dimensional_warnings.is_empty() {
            ApprovalStatus::ReviewRequired
        } else if !tire.codes.restrictions.is_empty() {
            ApprovalStatus::ApprovedWithRestrictions
        } else {
            ApprovalStatus::Approved
        };

        ValidationResult {
            vehicle_name: vehicle_name.to_string(),
            tire_size: tire.size.clone(),
            status,
            dimensional_warnings,
            restrictions: annotate(&tire.codes.restrictions, glossary),
            notes: annotate(&tire.codes.notes, glossary),
            tire_combinations: tire.codes.tire_combinations.clone(),
            raw_codes: tire.codes.clone(),
        }
    }

    /// Validate every tire entry of every vehicle, in order.
    pub fn validate_all(
        &self,
        vehicles: &[VehicleRecord],
        glossary: &CodeGlossary,
    ) -> Vec<ValidationResult> {
        vehicles
            .iter()
            .flat_map(|vehicle| {
                vehicle
                    .tires
                    .iter()
                    .map(move |tire| self.validate(&vehicle.name, tire, glossary))
            })
            .collect()
    }

    fn dimensional_warnings(&self, size: &TireSize) -> Vec<String> {
        let c = &self.config;
        let mut warnings = Vec::new();

        if !(c.min_width..=c.max_width).contains(&size.width) {
            warnings.push(UNUSUAL_WIDTH.to_string());
        }
        if !(c.min_aspect_ratio..=c.max_aspect_ratio).contains(&size.aspect_ratio) {
            warnings.push(UNUSUAL_ASPECT_RATIO.to_string());
        }
        if !(c.min_rim_diameter..=c.max_rim_diameter).contains(&size.rim_diameter) {
            warnings.push(UNUSUAL_RIM_DIAMETER.to_string());
        }

        warnings
    }
}

/// `"<code>: <description>"` when the glossary knows the code, else the code.
fn annotate(codes: &[String], glossary: &CodeGlossary) -> Vec<String> {
    codes
        .iter()
        .map(|code| match glossary.resolve(code) {
            Some(description) => format!("{}: {}", code, description),
            None => code.clone(),
        })
        .collect()
}
