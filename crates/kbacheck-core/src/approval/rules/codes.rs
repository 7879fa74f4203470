//! Regulatory code extraction from a single line.
//!
//! A line may carry tire sizes together with restriction (A), note and
//! tire-combination (T) codes. Classification is pure and holds no state.

use regex::Regex;
use serde::Serialize;
use tracing::trace;

use super::patterns::{NOTE_CODE, RESTRICTION_CODE, TIRE_COMBINATION_CODE};
use super::tire::TireSizeExtractor;
use super::{bounded_tokens, ExtractionMatch, FieldExtractor};
use crate::models::{CodeCategory, TireCodes, TireCombination};

/// Extractor for one category of line codes.
pub struct CodeExtractor {
    category: CodeCategory,
}

impl CodeExtractor {
    /// Create an extractor for `Restriction`, `Note` or `TireCombination` codes.
    ///
    /// `Unclassified` has no line pattern and never matches.
    pub fn new(category: CodeCategory) -> Self {
        Self { category }
    }

    pub fn restrictions() -> Self {
        Self::new(CodeCategory::Restriction)
    }

    pub fn notes() -> Self {
        Self::new(CodeCategory::Note)
    }

    pub fn tire_combinations() -> Self {
        Self::new(CodeCategory::TireCombination)
    }

    fn pattern(&self) -> Option<&'static Regex> {
        match self.category {
            CodeCategory::Restriction => Some(&*RESTRICTION_CODE),
            CodeCategory::Note => Some(&*NOTE_CODE),
            CodeCategory::TireCombination => Some(&*TIRE_COMBINATION_CODE),
            CodeCategory::Unclassified => None,
        }
    }
}

impl FieldExtractor for CodeExtractor {
    type Output = ExtractionMatch<String>;

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let Some(pattern) = self.pattern() else {
            return Vec::new();
        };

        bounded_tokens(pattern, text)
            .into_iter()
            .map(|token| {
                let code = match self.category {
                    // A-12 is written A12 everywhere else
                    CodeCategory::Restriction => token.as_str().replace('-', ""),
                    _ => token.as_str().to_string(),
                };
                ExtractionMatch::new(code, token)
            })
            .collect()
    }
}

/// Everything the classifier found on one line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LineCodes {
    /// Canonical tire sizes in line order.
    pub tire_sizes: Vec<String>,
    /// Codes by category.
    pub codes: TireCodes,
}

/// Extract and categorize all codes on a line.
pub fn extract_codes(line: &str) -> TireCodes {
    let description = line.trim();

    let codes = TireCodes {
        restrictions: values(CodeExtractor::restrictions().extract_all(line)),
        notes: values(CodeExtractor::notes().extract_all(line)),
        tire_combinations: CodeExtractor::tire_combinations()
            .extract_all(line)
            .into_iter()
            .map(|m| TireCombination::new(m.value, description))
            .collect(),
    };

    trace!(?codes, "extracted codes from line: {}", description);
    codes
}

/// Classify a line: tire sizes plus all codes.
pub fn classify_line(line: &str) -> LineCodes {
    LineCodes {
        tire_sizes: values(TireSizeExtractor::new().extract_all(line)),
        codes: extract_codes(line),
    }
}

fn values(matches: Vec<ExtractionMatch<String>>) -> Vec<String> {
    matches.into_iter().map(|m| m.value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_restriction_variants() {
        let codes = extract_codes("A12 A12a A12.1 A-13 A5b.2");
        assert_eq!(codes.restrictions, vec!["A12", "A12a", "A12.1", "A13", "A5b.2"]);
        assert!(codes.notes.is_empty());
    }

    #[test]
    fn test_codes_need_boundaries() {
        let codes = extract_codes("XA12 A12X (A13) A14.");
        assert_eq!(codes.restrictions, vec!["A14"]);
    }

    #[test]
    fn test_note_codes() {
        let codes = extract_codes("B01 Car NoE S12a, Z9 Cars Bnk");
        assert_eq!(codes.notes, vec!["B01", "Car", "NoE", "S12a", "Z9"]);
    }

    #[test]
    fn test_tire_line_with_mixed_codes() {
        let line = "  235/45R18 94W A01 A12 B05 T2  ";
        let result = classify_line(line);

        assert_eq!(result.tire_sizes, vec!["235/45R18"]);
        assert_eq!(result.codes.restrictions, vec!["A01", "A12"]);
        assert_eq!(result.codes.notes, vec!["B05"]);
        assert_eq!(
            result.codes.tire_combinations,
            vec![TireCombination::new("T2", "235/45R18 94W A01 A12 B05 T2")]
        );
    }

    #[test]
    fn test_rim_diameter_is_not_a_note() {
        let result = classify_line("255/35ZR19");
        assert!(result.codes.is_empty());
    }

    #[test]
    fn test_unclassified_extractor_is_empty() {
        assert!(CodeExtractor::new(CodeCategory::Unclassified)
            .extract_all("A12 B01 T1")
            .is_empty());
    }
}
