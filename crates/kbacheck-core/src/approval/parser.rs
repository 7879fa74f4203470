//! Line-by-line parser turning approval document text into vehicle records.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::rules::{
    classify_line, extract_attributes, CODE_HEADER, DEFAULT_VEHICLE_HEADER,
    TIRE_COMBINATION_SENTENCE, VEHICLE_TYPE_SUFFIX,
};
use super::VehicleDataExtractor;
use crate::error::Result;
use crate::glossary::CodeDefinition;
use crate::models::config::ExtractionConfig;
use crate::models::{TireCombination, TireEntry, VehicleRecord};

/// Everything found in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDocument {
    /// Vehicles with tire data, in document order.
    pub vehicles: Vec<VehicleRecord>,
    /// Code definitions (`A12a Verbreiterte Kotflügel ...`) in document order.
    pub definitions: Vec<CodeDefinition>,
}

/// Rule-based document parser.
///
/// Each trimmed line goes through an ordered list of checks:
///
/// 1. A blank line closes the pending code definition.
/// 2. A code definition line (`A12a Text`) opens a new definition. Any other
///    line is appended to an open definition. Both fall through.
/// 3. A tire-combination sentence (`T3 Reifen (...) zulässig für ...`) is
///    attached to the open vehicle.
/// 4. A vehicle header (`Audi A4`) closes the open vehicle and opens a new one.
/// 5. Any other line of an open vehicle is scanned for a type suffix, tire
///    sizes with their codes, and labeled attributes.
///
/// Vehicles without tires or tire-combination codes are dropped.
#[derive(Debug, Clone)]
pub struct DocumentParser {
    vehicle_header: Regex,
}

impl DocumentParser {
    /// Create a parser recognizing `Audi` vehicle headers.
    pub fn new() -> Self {
        Self {
            vehicle_header: DEFAULT_VEHICLE_HEADER.clone(),
        }
    }

    /// Create a parser for a custom list of manufacturers.
    pub fn with_manufacturers<S: AsRef<str>>(manufacturers: &[S]) -> Result<Self> {
        Ok(Self {
            vehicle_header: super::rules::vehicle_header_pattern(manufacturers)?,
        })
    }

    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        Self::with_manufacturers(config.manufacturers.as_slice())
    }

    /// Parse a whole document.
    pub fn parse(&self, text: &str) -> ParsedDocument {
        let mut scan = Scan::default();

        for line in text.lines() {
            let line = line.trim();

            if line.is_empty() {
                scan.flush_code_block();
                continue;
            }

            let is_definition = match CODE_HEADER.captures(line) {
                Some(caps) => {
                    scan.flush_code_block();
                    scan.code_block = Some(caps[1].to_string());
                    scan.code_lines = vec![caps[2].trim().to_string()];
                    true
                }
                None => {
                    if scan.code_block.is_some() {
                        scan.code_lines.push(line.to_string());
                    }
                    false
                }
            };

            if let Some(caps) = TIRE_COMBINATION_SENTENCE.captures(line) {
                if let Some(vehicle) = scan.vehicle.as_mut() {
                    vehicle
                        .tire_combinations
                        .push(TireCombination::new(&caps[1], caps[2].trim()));
                }
                continue;
            }

            if let Some(caps) = self.vehicle_header.captures(line) {
                scan.finalize_vehicle();
                let name = format!("{} {}", &caps[1], caps[2].trim());
                debug!("Vehicle header: {}", name);
                scan.vehicle = Some(VehicleRecord::new(name));
                continue;
            }

            let Some(vehicle) = scan.vehicle.as_mut() else {
                continue;
            };

            let line_codes = classify_line(line);

            // Tire lines carry B-note codes that look like type suffixes
            if line_codes.tire_sizes.is_empty() && !is_definition {
                if let Some(suffix) = VEHICLE_TYPE_SUFFIX.find(line) {
                    if !vehicle.name.contains(suffix.as_str()) {
                        vehicle.name = format!("{} {}", vehicle.name, suffix.as_str());
                    }
                }
            }

            for size in line_codes.tire_sizes {
                vehicle
                    .tires
                    .push(TireEntry::new(size, line_codes.codes.clone(), line));
            }

            for (attribute, value) in extract_attributes(line) {
                vehicle.attributes.entry(attribute).or_insert(value);
            }
        }

        scan.flush_code_block();
        scan.finalize_vehicle();

        info!(
            "Parsed {} vehicles, {} code definitions",
            scan.vehicles.len(),
            scan.definitions.len()
        );

        ParsedDocument {
            vehicles: scan.vehicles,
            definitions: scan.definitions,
        }
    }
}

impl Default for DocumentParser {
    fn default() -> Self {
        Self::new()
    }
}

impl VehicleDataExtractor for DocumentParser {
    fn name(&self) -> &str {
        "rules"
    }

    fn extract_vehicles(&self, text: &str) -> Result<Vec<VehicleRecord>> {
        Ok(self.parse(text).vehicles)
    }
}

#[derive(Default)]
struct Scan {
    vehicles: Vec<VehicleRecord>,
    definitions: Vec<CodeDefinition>,
    vehicle: Option<VehicleRecord>,
    code_block: Option<String>,
    code_lines: Vec<String>,
}

impl Scan {
    fn flush_code_block(&mut self) {
        if let Some(code) = self.code_block.take() {
            if !self.code_lines.is_empty() {
                let description = self.code_lines.join(" ");
                self.definitions
                    .push(CodeDefinition::new(code, description.trim()));
            }
        }
        self.code_lines.clear();
    }

    fn finalize_vehicle(&mut self) {
        let Some(vehicle) = self.vehicle.take() else {
            return;
        };

        if vehicle.has_tire_data() {
            debug!(
                "Vehicle {}: {} tires, {} tire combinations",
                vehicle.name,
                vehicle.tires.len(),
                vehicle.tire_combinations.len()
            );
            self.vehicles.push(vehicle);
        } else {
            debug!("Dropping vehicle {} without tire data", vehicle.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TireCodes, VehicleAttribute};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_definition_closed_by_blank_line() {
        let parsed = DocumentParser::new().parse("A12a Verbreiterte Kotflügel erforderlich  \n\n");

        assert_eq!(
            parsed.definitions,
            vec![CodeDefinition::new("A12a", "Verbreiterte Kotflügel erforderlich")]
        );
        assert!(parsed.vehicles.is_empty());
    }

    #[test]
    fn test_multi_line_definition() {
        let text = "A05 Radabdeckung durch\nKotflügelbördelung herstellen.\nA06 Zweiter Text";
        let parsed = DocumentParser::new().parse(text);

        assert_eq!(
            parsed.definitions,
            vec![
                CodeDefinition::new("A05", "Radabdeckung durch Kotflügelbördelung herstellen."),
                CodeDefinition::new("A06", "Zweiter Text"),
            ]
        );
    }

    #[test]
    fn test_vehicle_with_tire_line() {
        let parsed = DocumentParser::new().parse("Audi A4\n235/45R18 A12");

        assert_eq!(parsed.vehicles.len(), 1);
        let vehicle = &parsed.vehicles[0];
        assert_eq!(vehicle.name, "Audi A4");
        assert_eq!(vehicle.tires.len(), 1);
        assert_eq!(vehicle.tires[0].size, "235/45R18");
        assert_eq!(vehicle.tires[0].codes.restrictions, vec!["A12"]);
        assert_eq!(vehicle.tires[0].source_line, "235/45R18 A12");
    }

    #[test]
    fn test_header_only_vehicle_is_dropped() {
        let parsed = DocumentParser::new().parse("Audi A4\nHersteller: AEZ\n\nAudi Q5\n");
        assert!(parsed.vehicles.is_empty());
    }

    #[test]
    fn test_vehicle_with_tire_combinations_only_is_kept() {
        let text = "Audi RS6\nT3 Reifen (vorn) zulässig für 9Jx20 ET 35\n";
        let parsed = DocumentParser::new().parse(text);

        assert_eq!(parsed.vehicles.len(), 1);
        assert_eq!(
            parsed.vehicles[0].tire_combinations,
            vec![TireCombination::new("T3", "9Jx20 ET 35")]
        );
        assert!(parsed.vehicles[0].tires.is_empty());
    }

    #[test]
    fn test_type_suffix_and_attributes() {
        let text = "\
Audi A4
B8, B81
Hersteller: AEZ
Hersteller: Other
Einpresstiefe: 39
225/50R17 94W B05
";
        let parsed = DocumentParser::new().parse(text);
        let vehicle = &parsed.vehicles[0];

        assert_eq!(vehicle.name, "Audi A4 B8, B81");
        assert_eq!(vehicle.attribute(VehicleAttribute::Manufacturer), Some("AEZ"));
        assert_eq!(vehicle.attribute(VehicleAttribute::Inset), Some("39"));
        assert_eq!(vehicle.tires[0].codes.notes, vec!["B05"]);
    }

    #[test]
    fn test_several_sizes_share_line_codes() {
        let parsed = DocumentParser::new().parse("Audi A6\n225/50R17, 245/40ZR18 A01 Car");
        let tires = &parsed.vehicles[0].tires;

        let expected = TireCodes {
            restrictions: vec!["A01".to_string()],
            notes: vec!["Car".to_string()],
            tire_combinations: Vec::new(),
        };
        assert_eq!(tires.len(), 2);
        assert_eq!(tires[0].size, "225/50R17");
        assert_eq!(tires[1].size, "245/40R18");
        assert_eq!(tires[0].codes, expected);
        assert_eq!(tires[1].codes, expected);
    }

    #[test]
    fn test_definition_line_also_carries_tire_data() {
        let parsed = DocumentParser::new().parse("Audi A3\nB05 235/40R18 A01\n");

        assert_eq!(
            parsed.definitions,
            vec![CodeDefinition::new("B05", "235/40R18 A01")]
        );
        let vehicle = &parsed.vehicles[0];
        assert_eq!(vehicle.name, "Audi A3");
        assert_eq!(vehicle.tires[0].codes.restrictions, vec!["A01"]);
        assert_eq!(vehicle.tires[0].codes.notes, vec!["B05"]);
    }

    #[test]
    fn test_new_header_finalizes_previous_vehicle() {
        let text = "Audi A4\n225/50R17\nAudi A5\n245/40R18\n";
        let parsed = DocumentParser::new().parse(text);

        let names: Vec<&str> = parsed.vehicles.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Audi A4", "Audi A5"]);
    }

    #[test]
    fn test_attribute_line_does_not_open_vehicle() {
        let parsed = DocumentParser::new().parse("Hersteller: Audi AG\n225/50R17\n");
        assert!(parsed.vehicles.is_empty());
    }

    #[test]
    fn test_labeled_trade_name_opens_vehicle() {
        let text = "Handelsbezeichnung: Audi A4\n235/45R18 A12\nHersteller: Audi AG\n";
        let parsed = DocumentParser::new().parse(text);

        assert_eq!(parsed.vehicles.len(), 1);
        let vehicle = &parsed.vehicles[0];
        assert_eq!(vehicle.name, "Audi A4");
        assert_eq!(vehicle.tires.len(), 1);
        assert_eq!(vehicle.attribute(VehicleAttribute::Manufacturer), Some("Audi AG"));
    }

    #[test]
    fn test_custom_manufacturers() {
        let parser = DocumentParser::with_manufacturers(&["VW", "Seat"]).unwrap();
        let parsed = parser.parse("VW GOLF\n205/55R16\nSeat LEON\n225/40R18\nAudi A4\n235/45R18\n");

        let names: Vec<&str> = parsed.vehicles.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["VW GOLF", "Seat LEON"]);
        assert_eq!(parsed.vehicles[1].tires.len(), 2);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let text = "A01 Text\n\nAudi A4\n235/45R18 A01 B05 T2\n\
                    T2 Reifen (hinten) zulässig für 8Jx18\n";
        let parser = DocumentParser::new();
        assert_eq!(parser.parse(text), parser.parse(text));
    }
}
