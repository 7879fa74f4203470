//! Vehicle and tire approval extraction from KBA/ABE document text.

mod analyzer;
mod parser;
pub mod rules;
mod scanner;
mod validator;

pub use analyzer::{AnalysisReport, DocumentAnalyzer, ExtractionSource};
pub use parser::{DocumentParser, ParsedDocument};
pub use scanner::SimpleTireScanner;
pub use validator::{
    CombinationValidator, INVALID_TIRE_FORMAT, UNUSUAL_ASPECT_RATIO, UNUSUAL_RIM_DIAMETER,
    UNUSUAL_WIDTH,
};

use crate::error::Result;
use crate::models::VehicleRecord;

/// Something that turns document text into vehicle records.
pub trait VehicleDataExtractor {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Extract vehicles with their tire sizes.
    fn extract_vehicles(&self, text: &str) -> Result<Vec<VehicleRecord>>;
}
