//! Vehicle, tire and regulatory code records extracted from approval documents.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a regulatory code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeCategory {
    /// Condition that must be met or registered (Auflage, A-code).
    Restriction,
    /// Informational technical annotation (Hinweis).
    Note,
    /// Reference to an approved alternate tire fitment (T-code).
    TireCombination,
    /// Anything else.
    Unclassified,
}

impl CodeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Restriction => "restriction",
            Self::Note => "note",
            Self::TireCombination => "tire_combination",
            Self::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for CodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A short regulatory code such as `A12`, `B01` or `Car`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegulatoryCode {
    pub code: String,
    pub category: CodeCategory,
}

impl RegulatoryCode {
    /// Build a code, deriving its category from its shape.
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        let category = crate::glossary::classify_code(&code);
        Self { code, category }
    }
}

/// A T-code together with the text that describes the alternate fitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TireCombination {
    pub code: String,
    pub description: String,
}

impl TireCombination {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
        }
    }
}

/// Codes found on the same line as a tire size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TireCodes {
    /// Restriction codes (A-codes), hyphens removed.
    pub restrictions: Vec<String>,
    /// Note codes.
    pub notes: Vec<String>,
    /// Tire combination codes with the full line as description.
    pub tire_combinations: Vec<TireCombination>,
}

impl TireCodes {
    pub fn is_empty(&self) -> bool {
        self.restrictions.is_empty() && self.notes.is_empty() && self.tire_combinations.is_empty()
    }
}

/// One approved tire size for a vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TireEntry {
    /// Canonical size, e.g. `235/45R18`.
    pub size: String,

    /// Codes attached on the source line.
    pub codes: TireCodes,

    /// Trimmed line the size was found on.
    pub source_line: String,
}

impl TireEntry {
    pub fn new(size: impl Into<String>, codes: TireCodes, source_line: impl Into<String>) -> Self {
        Self {
            size: size.into(),
            codes,
            source_line: source_line.into(),
        }
    }

    /// Entry without codes or source line (AI and simple-scan paths).
    pub fn bare(size: impl Into<String>) -> Self {
        Self::new(size, TireCodes::default(), String::new())
    }
}

/// Labeled attributes that may appear in a vehicle block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleAttribute {
    /// Hersteller / Herstellerzeichen.
    Manufacturer,
    /// Felgengröße.
    WheelSize,
    /// Typ und Ausführung.
    TypeVersion,
    /// Herstelldatum.
    ManufactureDate,
    /// Genehmigungszeichen.
    ApprovalId,
    /// Einpresstiefe.
    Inset,
}

impl VehicleAttribute {
    pub const ALL: [VehicleAttribute; 6] = [
        Self::Manufacturer,
        Self::WheelSize,
        Self::TypeVersion,
        Self::ManufactureDate,
        Self::ApprovalId,
        Self::Inset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manufacturer => "manufacturer",
            Self::WheelSize => "wheel_size",
            Self::TypeVersion => "type_version",
            Self::ManufactureDate => "manufacture_date",
            Self::ApprovalId => "approval_id",
            Self::Inset => "inset",
        }
    }

    /// German label as printed in approval documents.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Manufacturer => "Hersteller",
            Self::WheelSize => "Felgengröße",
            Self::TypeVersion => "Typ/Ausführung",
            Self::ManufactureDate => "Herstelldatum",
            Self::ApprovalId => "Genehmigungszeichen",
            Self::Inset => "Einpresstiefe",
        }
    }
}

/// A vehicle block with its approved tire sizes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleRecord {
    /// Trade name, e.g. `Audi A4 B8`.
    pub name: String,

    /// Approved tire sizes in document order.
    pub tires: Vec<TireEntry>,

    /// Labeled attributes; first occurrence wins.
    pub attributes: BTreeMap<VehicleAttribute, String>,

    /// T-code sentences found in the vehicle block.
    pub tire_combinations: Vec<TireCombination>,
}

impl VehicleRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// A vehicle is only kept if it carries tire data.
    pub fn has_tire_data(&self) -> bool {
        !self.tires.is_empty() || !self.tire_combinations.is_empty()
    }

    pub fn attribute(&self, attribute: VehicleAttribute) -> Option<&str> {
        self.attributes.get(&attribute).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regulatory_code_category() {
        assert_eq!(RegulatoryCode::new("A12").category, CodeCategory::Restriction);
        assert_eq!(RegulatoryCode::new("Car").category, CodeCategory::Note);
        assert_eq!(RegulatoryCode::new("X1").category, CodeCategory::Unclassified);
    }

    #[test]
    fn test_has_tire_data() {
        let mut vehicle = VehicleRecord::new("Audi A4");
        assert!(!vehicle.has_tire_data());

        vehicle.tire_combinations.push(TireCombination::new("T1", "Audi A4 Avant"));
        assert!(vehicle.has_tire_data());
    }

    #[test]
    fn test_attributes_serialize_with_snake_case_keys() {
        let mut vehicle = VehicleRecord::new("Audi A4");
        vehicle
            .attributes
            .insert(VehicleAttribute::WheelSize, "8Jx18".to_string());

        let json = serde_json::to_string(&vehicle).unwrap();
        assert!(json.contains(r#""wheel_size":"8Jx18""#));
    }
}
