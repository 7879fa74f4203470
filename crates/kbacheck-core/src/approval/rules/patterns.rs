//! Common regex patterns for KBA/ABE approval documents.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{KbaError, Result};

lazy_static! {
    // Codes on a tire line. The trailing group only checks the boundary;
    // callers resume searching at the end of capture group 1.
    pub static ref RESTRICTION_CODE: Regex = Regex::new(
        r"(?:^|\s)(A(?:[0-9]+[a-z]?(?:\.[0-9]+)?|-[0-9]+))(?:[\s.,]|$)"
    ).unwrap();

    pub static ref TIRE_COMBINATION_CODE: Regex = Regex::new(
        r"(?:^|\s)(T\d+)(?:[\s.,]|$)"
    ).unwrap();

    pub static ref NOTE_CODE: Regex = Regex::new(
        r"(?:^|\s)([BCDEFGHIJKLMNOPQRSUVWXYZ]\d+[a-z]?|Car|Cou|NoE|BnK)(?:[\s.,]|$)"
    ).unwrap();

    // Tire sizes: 235/45R18, 235-45ZR18
    pub static ref TIRE_SIZE: Regex = Regex::new(
        r"\b(\d{2,3})[/-](\d{2,3})(?:ZR|R)(\d{2})"
    ).unwrap();

    pub static ref CANONICAL_TIRE_SIZE: Regex = Regex::new(
        r"^(\d+)/(\d+)R(\d+)"
    ).unwrap();

    // Document structure
    pub static ref CODE_HEADER: Regex = Regex::new(
        r"^([A-Z]\d+[a-z]?(?:\.\d+)?)\s+(.+)$"
    ).unwrap();

    pub static ref TIRE_COMBINATION_SENTENCE: Regex = Regex::new(
        r"(T\d+)\s+Reifen\s+\([^)]+\)\s+zulässig\s+für\s+(.+)"
    ).unwrap();

    pub static ref VEHICLE_TYPE_SUFFIX: Regex = Regex::new(
        r"\bB\d+(?:,\s*B\d+)*\b"
    ).unwrap();

    // Reference templates: leading token of three or more characters
    pub static ref TEMPLATE_CODE_LINE: Regex = Regex::new(
        r"^([A-Z][A-Za-z0-9]{2,})\s+(\S.*)$"
    ).unwrap();

    pub static ref TEMPLATE_CODE_START: Regex = Regex::new(
        r"^[A-Z][A-Za-z0-9]{2,}\s"
    ).unwrap();

    // Glossary classification
    pub static ref RESTRICTION_SHAPE: Regex = Regex::new(
        r"^(?:A\d{2}|A[A-Z][a-z])$"
    ).unwrap();

    pub static ref NOTE_SHAPE: Regex = Regex::new(
        r"^(?:S\d{2}|B\d{2}|F\d{2}|Car|Cou|NoE|BnK)$"
    ).unwrap();

    // Labeled vehicle attributes
    pub static ref MANUFACTURER: Regex = Regex::new(
        r"Hersteller(?:zeichen)?:\s*(.+)"
    ).unwrap();

    pub static ref WHEEL_SIZE: Regex = Regex::new(
        r"Felgengröße:\s*(.+)"
    ).unwrap();

    pub static ref TYPE_VERSION: Regex = Regex::new(
        r"Typ und (?:die )?Ausführung:\s*(.+)"
    ).unwrap();

    pub static ref MANUFACTURE_DATE: Regex = Regex::new(
        r"Herstelldatum \((?:Monat und Jahr|month and year)\):\s*(.+)"
    ).unwrap();

    pub static ref APPROVAL_ID: Regex = Regex::new(
        r"Genehmigungszeichen:\s*(.+)"
    ).unwrap();

    pub static ref INSET: Regex = Regex::new(
        r"Einpresstiefe:\s*(.+)"
    ).unwrap();

    pub static ref DEFAULT_VEHICLE_HEADER: Regex = vehicle_header_pattern(&["Audi"]).unwrap();

    pub static ref DEFAULT_VEHICLE_MENTION: Regex = vehicle_mention_pattern(&["Audi"]).unwrap();
}

/// Model names: uppercase tokens such as `A4`, `Q5 SPORTBACK`, `RS6`.
const MODEL_NAME: &str = r"([A-Z][A-Z0-9]*(?:\s+[A-Z0-9]+)*)\b";

/// Labels that may precede the trade name on a header line. Other labels
/// (`Hersteller: Audi AG`) never open a vehicle.
const HEADER_LABEL: &str = r"(?:(?:Handelsbezeichnung|Fahrzeug):\s*)?";

/// Build the `<Manufacturer> <MODEL>` header pattern, anchored at line start.
///
/// An optional `Handelsbezeichnung:` or `Fahrzeug:` label is accepted.
pub fn vehicle_header_pattern<S: AsRef<str>>(manufacturers: &[S]) -> Result<Regex> {
    manufacturer_pattern(manufacturers, &format!("^{}", HEADER_LABEL))
}

/// Like [`vehicle_header_pattern`] but matching anywhere in the line.
pub fn vehicle_mention_pattern<S: AsRef<str>>(manufacturers: &[S]) -> Result<Regex> {
    manufacturer_pattern(manufacturers, r"\b")
}

fn manufacturer_pattern<S: AsRef<str>>(manufacturers: &[S], anchor: &str) -> Result<Regex> {
    let alternatives: Vec<String> = manufacturers
        .iter()
        .map(|m| regex::escape(m.as_ref().trim()))
        .filter(|m| !m.is_empty())
        .collect();

    if alternatives.is_empty() {
        return Err(KbaError::Config(
            "at least one manufacturer is required".to_string(),
        ));
    }

    Regex::new(&format!(r"{}({})\s+{}", anchor, alternatives.join("|"), MODEL_NAME))
        .map_err(|e| KbaError::Config(format!("invalid manufacturer pattern: {}", e)))
}
