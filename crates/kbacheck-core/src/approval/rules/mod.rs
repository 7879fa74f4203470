//! Rule-based extractors for KBA/ABE approval documents.

pub mod attributes;
pub mod codes;
pub mod patterns;
pub mod tire;

pub use attributes::{extract_attributes, AttributeExtractor};
pub use codes::{classify_line, extract_codes, CodeExtractor, LineCodes};
pub use patterns::*;
pub use tire::{canonicalize_tire_size, TireSize, TireSizeExtractor};

use regex::{Match, Regex};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the first occurrence from text.
    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    /// Extract all occurrences in order.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A matched value with its location in the source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionMatch<T> {
    /// Extracted (normalized) value.
    pub value: T,
    /// Byte range in source text.
    pub position: (usize, usize),
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, found: Match<'_>) -> Self {
        Self {
            value,
            position: (found.start(), found.end()),
            source: found.as_str().to_string(),
        }
    }
}

/// Find every capture-group-1 token of a boundary-delimited pattern.
///
/// The pattern consumes its leading and trailing delimiters, so the search
/// resumes at the end of the token itself. Adjacent tokens separated by a
/// single space are all found.
pub(crate) fn bounded_tokens<'h>(pattern: &Regex, haystack: &'h str) -> Vec<Match<'h>> {
    let mut tokens = Vec::new();
    let mut at = 0;

    while at < haystack.len() {
        let Some(token) = pattern.captures_at(haystack, at).and_then(|caps| caps.get(1)) else {
            break;
        };
        at = token.end();
        tokens.push(token);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_tokens_adjacent() {
        let tokens: Vec<&str> = bounded_tokens(&RESTRICTION_CODE, "A12 A13,A14")
            .iter()
            .map(|m| m.as_str())
            .collect();
        assert_eq!(tokens, vec!["A12", "A13"]);
    }

    #[test]
    fn test_bounded_tokens_backtracks_to_shorter_token() {
        let tokens: Vec<&str> = bounded_tokens(&RESTRICTION_CODE, "siehe A12.1x und A12.")
            .iter()
            .map(|m| m.as_str())
            .collect();
        assert_eq!(tokens, vec!["A12", "A12"]);
    }
}
