//! Validation verdicts for vehicle/tire combinations.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::vehicle::{TireCodes, TireCombination};

/// Approval status of a vehicle/tire combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Approved without registration.
    Approved,
    /// Approved, subject to restriction codes.
    ApprovedWithRestrictions,
    /// Dimensions look unusual, manual review needed.
    ReviewRequired,
    /// The tire size could not be understood.
    NotApproved,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::ApprovedWithRestrictions => "approved_with_restrictions",
            Self::ReviewRequired => "review_required",
            Self::NotApproved => "not_approved",
        }
    }

    /// Wording used in KBA practice.
    pub fn german_label(&self) -> &'static str {
        match self {
            Self::Approved => "Zulässig ohne Eintragung",
            Self::ApprovedWithRestrictions => "Zulässig mit Auflagen",
            Self::ReviewRequired => "Prüfung erforderlich",
            Self::NotApproved => "Nicht zulässig",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict for one vehicle/tire combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Vehicle trade name.
    pub vehicle_name: String,

    /// Tire size as extracted.
    pub tire_size: String,

    /// Overall status.
    pub status: ApprovalStatus,

    /// Dimensional sanity warnings.
    pub dimensional_warnings: Vec<String>,

    /// Restriction codes, annotated with descriptions where known.
    pub restrictions: Vec<String>,

    /// Note codes, annotated with descriptions where known.
    pub notes: Vec<String>,

    /// T-codes from the tire line.
    pub tire_combinations: Vec<TireCombination>,

    /// Unresolved codes as extracted.
    pub raw_codes: TireCodes,
}

/// Filter results by case-insensitive substrings of vehicle name and tire size.
///
/// Empty search strings match everything.
pub fn filter_results<'a>(
    results: &'a [ValidationResult],
    vehicle_search: &str,
    tire_search: &str,
) -> Vec<&'a ValidationResult> {
    let vehicle_search = vehicle_search.to_lowercase();
    let tire_search = tire_search.to_lowercase();

    results
        .iter()
        .filter(|r| {
            vehicle_search.is_empty() || r.vehicle_name.to_lowercase().contains(&vehicle_search)
        })
        .filter(|r| tire_search.is_empty() || r.tire_size.to_lowercase().contains(&tire_search))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(vehicle: &str, tire: &str) -> ValidationResult {
        ValidationResult {
            vehicle_name: vehicle.to_string(),
            tire_size: tire.to_string(),
            status: ApprovalStatus::Approved,
            dimensional_warnings: Vec::new(),
            restrictions: Vec::new(),
            notes: Vec::new(),
            tire_combinations: Vec::new(),
            raw_codes: TireCodes::default(),
        }
    }

    #[test]
    fn test_filter_results() {
        let results = vec![
            result("Audi A4 B8", "235/45R18"),
            result("Audi A5", "255/35R19"),
            result("Audi A4 B8", "245/40R18"),
        ];

        assert_eq!(filter_results(&results, "", "").len(), 3);
        assert_eq!(filter_results(&results, "a4", "").len(), 2);
        assert_eq!(filter_results(&results, "A4", "R18").len(), 2);
        assert_eq!(filter_results(&results, "", "255/").len(), 1);
        assert!(filter_results(&results, "Q7", "").is_empty());
    }

    #[test]
    fn test_german_label() {
        assert_eq!(
            ApprovalStatus::ApprovedWithRestrictions.german_label(),
            "Zulässig mit Auflagen"
        );
    }
}
