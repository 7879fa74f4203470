//! Tire size extraction and parsing.

use std::fmt;
use std::str::FromStr;

use super::patterns::{CANONICAL_TIRE_SIZE, TIRE_SIZE};
use super::{ExtractionMatch, FieldExtractor};
use crate::error::FormatError;

/// Parsed tire dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TireSize {
    /// Section width in mm.
    pub width: u32,
    /// Aspect ratio in percent.
    pub aspect_ratio: u32,
    /// Rim diameter in inches.
    pub rim_diameter: u32,
}

impl TireSize {
    /// Parse a canonical `WWW/AARDD` size.
    pub fn parse(size: &str) -> Result<Self, FormatError> {
        let invalid = || FormatError::TireSize(size.to_string());

        let caps = CANONICAL_TIRE_SIZE.captures(size.trim()).ok_or_else(invalid)?;
        let number = |i: usize| caps[i].parse::<u32>().map_err(|_| invalid());

        Ok(Self {
            width: number(1)?,
            aspect_ratio: number(2)?,
            rim_diameter: number(3)?,
        })
    }
}

impl FromStr for TireSize {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TireSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}R{}", self.width, self.aspect_ratio, self.rim_diameter)
    }
}

/// Tire size extractor producing canonical size strings.
pub struct TireSizeExtractor;

impl TireSizeExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TireSizeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for TireSizeExtractor {
    type Output = ExtractionMatch<String>;

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        TIRE_SIZE
            .captures_iter(text)
            .filter_map(|caps| {
                let found = caps.get(0)?;
                let size = format!("{}/{}R{}", &caps[1], &caps[2], &caps[3]);
                Some(ExtractionMatch::new(size, found))
            })
            .collect()
    }
}

/// Canonicalize a size such as `235-45ZR18` to `235/45R18`.
///
/// Returns `None` if no tire size is found.
pub fn canonicalize_tire_size(raw: &str) -> Option<String> {
    TireSizeExtractor::new().extract(raw).map(|m| m.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_all_sizes_on_line() {
        let sizes: Vec<String> = TireSizeExtractor::new()
            .extract_all("225/50R17 94W, 245-40ZR18 97Y A01")
            .into_iter()
            .map(|m| m.value)
            .collect();

        assert_eq!(sizes, vec!["225/50R17", "245/40R18"]);
    }

    #[test]
    fn test_canonicalize() {
        assert_eq!(canonicalize_tire_size("255/35ZR19"), Some("255/35R19".to_string()));
        assert_eq!(canonicalize_tire_size(" 205-55R16 "), Some("205/55R16".to_string()));
        assert_eq!(canonicalize_tire_size("8Jx18 ET39"), None);
    }

    #[test]
    fn test_parse_tire_size() {
        let size = TireSize::parse("235/45R18").unwrap();
        assert_eq!(size.width, 235);
        assert_eq!(size.aspect_ratio, 45);
        assert_eq!(size.rim_diameter, 18);
        assert_eq!(size.to_string(), "235/45R18");
    }

    #[test]
    fn test_parse_invalid_tire_size() {
        assert_eq!(
            TireSize::parse("abcR17"),
            Err(FormatError::TireSize("abcR17".to_string()))
        );
        assert!("99999999999/45R18".parse::<TireSize>().is_err());
    }
}
