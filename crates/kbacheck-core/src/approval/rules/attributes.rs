//! Labeled vehicle attributes (`Hersteller: ...`, `Einpresstiefe: ...`).

use regex::Regex;

use super::patterns::{
    APPROVAL_ID, INSET, MANUFACTURE_DATE, MANUFACTURER, TYPE_VERSION, WHEEL_SIZE,
};
use super::{ExtractionMatch, FieldExtractor};
use crate::models::VehicleAttribute;

/// Extractor for one labeled attribute.
pub struct AttributeExtractor {
    attribute: VehicleAttribute,
}

impl AttributeExtractor {
    pub fn new(attribute: VehicleAttribute) -> Self {
        Self { attribute }
    }

    fn pattern(&self) -> &'static Regex {
        match self.attribute {
            VehicleAttribute::Manufacturer => &*MANUFACTURER,
            VehicleAttribute::WheelSize => &*WHEEL_SIZE,
            VehicleAttribute::TypeVersion => &*TYPE_VERSION,
            VehicleAttribute::ManufactureDate => &*MANUFACTURE_DATE,
            VehicleAttribute::ApprovalId => &*APPROVAL_ID,
            VehicleAttribute::Inset => &*INSET,
        }
    }
}

impl FieldExtractor for AttributeExtractor {
    type Output = ExtractionMatch<String>;

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.pattern()
            .captures_iter(text)
            .filter_map(|caps| {
                let found = caps.get(0)?;
                let value = caps[1].trim();
                (!value.is_empty()).then(|| ExtractionMatch::new(value.to_string(), found))
            })
            .collect()
    }
}

/// Extract every labeled attribute present on a line.
pub fn extract_attributes(line: &str) -> Vec<(VehicleAttribute, String)> {
    VehicleAttribute::ALL
        .iter()
        .filter_map(|&attribute| {
            AttributeExtractor::new(attribute)
                .extract(line)
                .map(|m| (attribute, m.value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_attributes() {
        assert_eq!(
            extract_attributes("Herstellerzeichen: AEZ"),
            vec![(VehicleAttribute::Manufacturer, "AEZ".to_string())]
        );
        assert_eq!(
            extract_attributes("Typ und die Ausführung: AR 8018 "),
            vec![(VehicleAttribute::TypeVersion, "AR 8018".to_string())]
        );
        assert_eq!(
            extract_attributes("Herstelldatum (Monat und Jahr): 03/2019"),
            vec![(VehicleAttribute::ManufactureDate, "03/2019".to_string())]
        );
        assert_eq!(
            extract_attributes("Felgengröße: 8Jx18H2"),
            vec![(VehicleAttribute::WheelSize, "8Jx18H2".to_string())]
        );
    }

    #[test]
    fn test_line_without_attributes() {
        assert!(extract_attributes("235/45R18 A12").is_empty());
        assert!(extract_attributes("Einpresstiefe:").is_empty());
    }
}
