//! Plain tire-size scan used when the main parser finds nothing.

use regex::Regex;
use tracing::debug;

use super::rules::{
    FieldExtractor, TireSizeExtractor, DEFAULT_VEHICLE_MENTION, VEHICLE_TYPE_SUFFIX,
};
use super::VehicleDataExtractor;
use crate::error::Result;
use crate::models::config::ExtractionConfig;
use crate::models::{TireEntry, VehicleRecord};

/// Collects tire sizes per vehicle mention, ignoring codes and attributes.
///
/// Vehicles may be mentioned anywhere in a line (`Fahrzeug: Audi A4`).
/// Sizes are de-duplicated per vehicle, keeping first-seen order.
#[derive(Debug, Clone)]
pub struct SimpleTireScanner {
    vehicle_mention: Regex,
}

impl SimpleTireScanner {
    pub fn new() -> Self {
        Self {
            vehicle_mention: DEFAULT_VEHICLE_MENTION.clone(),
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        Ok(Self {
            vehicle_mention: super::rules::vehicle_mention_pattern(
                config.manufacturers.as_slice(),
            )?,
        })
    }

    pub fn scan(&self, text: &str) -> Vec<VehicleRecord> {
        let sizes = TireSizeExtractor::new();
        let mut vehicles = Vec::new();
        let mut current: Option<VehicleRecord> = None;

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Some(caps) = self.vehicle_mention.captures(line) {
                vehicles.extend(current.take().filter(VehicleRecord::has_tire_data));
                current = Some(VehicleRecord::new(format!("{} {}", &caps[1], caps[2].trim())));
                continue;
            }

            let Some(vehicle) = current.as_mut() else {
                continue;
            };

            let found = sizes.extract_all(line);
            if found.is_empty() {
                if let Some(suffix) = VEHICLE_TYPE_SUFFIX.find(line) {
                    if !vehicle.name.contains(suffix.as_str()) {
                        vehicle.name = format!("{} {}", vehicle.name, suffix.as_str());
                    }
                }
            }

            for size in found {
                if !vehicle.tires.iter().any(|t| t.size == size.value) {
                    vehicle.tires.push(TireEntry::bare(size.value));
                }
            }
        }

        vehicles.extend(current.filter(VehicleRecord::has_tire_data));
        debug!("Simple scan found {} vehicles", vehicles.len());
        vehicles
    }
}

impl Default for SimpleTireScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl VehicleDataExtractor for SimpleTireScanner {
    fn name(&self) -> &str {
        "simple-scan"
    }

    fn extract_vehicles(&self, text: &str) -> Result<Vec<VehicleRecord>> {
        Ok(self.scan(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::DocumentParser;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scan_deduplicates_sizes() {
        let text = "Audi A4\nB8\n235/45R18 A12\n225/50R17\n235-45ZR18 B05\nAudi Q7\n";
        let vehicles = SimpleTireScanner::new().scan(text);

        assert_eq!(vehicles.len(), 1);
        assert_eq!(vehicles[0].name, "Audi A4 B8");
        let sizes: Vec<&str> = vehicles[0].tires.iter().map(|t| t.size.as_str()).collect();
        assert_eq!(sizes, vec!["235/45R18", "225/50R17"]);
        assert!(vehicles[0].tires[0].codes.is_empty());
    }

    #[test]
    fn test_scan_finds_vehicles_mid_line() {
        let text = "Fahrzeug: Audi Q5\n255/45R20 A01\n";
        assert!(DocumentParser::new().parse(text).vehicles.is_empty());

        let vehicles = SimpleTireScanner::new().scan(text);
        assert_eq!(vehicles.len(), 1);
        assert_eq!(vehicles[0].name, "Audi Q5");
    }

    #[test]
    fn test_scan_without_header_is_empty() {
        assert!(SimpleTireScanner::new().scan("235/45R18\n225/50R17").is_empty());
    }
}
