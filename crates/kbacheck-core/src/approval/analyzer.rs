//! End-to-end document analysis with extractor fallback.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{
    CombinationValidator, DocumentParser, SimpleTireScanner, VehicleDataExtractor,
};
use crate::error::{PdfError, Result};
use crate::glossary::{CodeDefinition, CodeGlossary};
use crate::models::config::{ClassifierConfig, KbaConfig, PdfConfig};
use crate::models::{ValidationResult, VehicleRecord};

/// Which extractor produced the vehicles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    /// The AI classifier.
    Ai,
    /// The rule-based document parser.
    Rules,
    /// The plain tire-size scan.
    SimpleScan,
}

impl ExtractionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Rules => "rules",
            Self::SimpleScan => "simple_scan",
        }
    }
}

/// Result of analysing one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Extractor that produced `vehicles`.
    pub source: ExtractionSource,
    /// Extracted vehicles.
    pub vehicles: Vec<VehicleRecord>,
    /// One result per vehicle tire entry.
    pub results: Vec<ValidationResult>,
    /// Code definitions found in the document.
    pub definitions: Vec<CodeDefinition>,
    /// Non-fatal problems, such as a failed AI request.
    pub warnings: Vec<String>,
}

type BoxedExtractor = Box<dyn VehicleDataExtractor + Send + Sync>;

/// Runs extraction and validation for whole documents.
///
/// An optional primary extractor (the AI classifier) is tried first. When
/// it fails or finds nothing, the rule-based parser is used, then the plain
/// tire-size scan.
pub struct DocumentAnalyzer {
    parser: DocumentParser,
    scanner: SimpleTireScanner,
    validator: CombinationValidator,
    primary: Option<BoxedExtractor>,
    simple_scan_fallback: bool,
    pdf: PdfConfig,
}

impl DocumentAnalyzer {
    /// Analyzer with default rules and no primary extractor.
    pub fn new() -> Self {
        Self {
            parser: DocumentParser::new(),
            scanner: SimpleTireScanner::new(),
            validator: CombinationValidator::default(),
            primary: None,
            simple_scan_fallback: true,
            pdf: PdfConfig::default(),
        }
    }

    /// Build from configuration.
    ///
    /// With the `ai` feature and `classifier.enabled`, the AI classifier
    /// becomes the primary extractor. If it cannot be created the analyzer
    /// runs on rules only.
    pub fn from_config(config: &KbaConfig) -> Result<Self> {
        let analyzer = Self {
            parser: DocumentParser::from_config(&config.extraction)?,
            scanner: SimpleTireScanner::from_config(&config.extraction)?,
            validator: CombinationValidator::new(config.validation.clone()),
            primary: None,
            simple_scan_fallback: config.extraction.simple_scan_fallback,
            pdf: config.pdf.clone(),
        };

        if config.classifier.enabled {
            Ok(analyzer.with_classifier(&config.classifier))
        } else {
            Ok(analyzer)
        }
    }

    #[cfg(feature = "ai")]
    fn with_classifier(self, config: &ClassifierConfig) -> Self {
        match crate::ai::AiClassifier::from_config(config) {
            Ok(classifier) => self.with_primary(classifier),
            Err(e) => {
                warn!("AI classifier unavailable, using rules only: {}", e);
                self
            }
        }
    }

    #[cfg(not(feature = "ai"))]
    fn with_classifier(self, _config: &ClassifierConfig) -> Self {
        warn!("AI classifier enabled but not compiled in, using rules only");
        self
    }

    /// Set the primary extractor.
    pub fn with_primary(
        mut self,
        extractor: impl VehicleDataExtractor + Send + Sync + 'static,
    ) -> Self {
        self.primary = Some(Box::new(extractor));
        self
    }

    /// Enable or disable the plain tire-size scan.
    pub fn with_simple_scan_fallback(mut self, enabled: bool) -> Self {
        self.simple_scan_fallback = enabled;
        self
    }

    /// Analyse document text.
    ///
    /// Code definitions found in the document are merged into `glossary`
    /// in memory before validation.
    pub fn analyze_text(&self, text: &str, glossary: &mut CodeGlossary) -> AnalysisReport {
        let parsed = self.parser.parse(text);
        let recorded = glossary.record_definitions(&parsed.definitions);
        debug!("Recorded {} document code definitions", recorded);

        let mut warnings = Vec::new();
        let (source, vehicles) = self.extract(text, parsed.vehicles, &mut warnings);

        if vehicles.is_empty() {
            warnings.push("no vehicle/tire combinations found".to_string());
        }

        let results = self.validator.validate_all(&vehicles, glossary);
        info!(
            "Analysis via {}: {} vehicles, {} combinations",
            source.as_str(),
            vehicles.len(),
            results.len()
        );

        AnalysisReport {
            source,
            vehicles,
            results,
            definitions: parsed.definitions,
            warnings,
        }
    }

    /// Extract text from a PDF and analyse it.
    pub fn analyze_pdf(&self, data: &[u8], glossary: &mut CodeGlossary) -> Result<AnalysisReport> {
        if self.pdf.require_approval_markers && !crate::pdf::is_approval_document(data) {
            return Err(PdfError::NotApprovalDocument.into());
        }

        let text = crate::pdf::extract_pdf_text(data)?;
        let length = text.trim().chars().count();
        if length < self.pdf.min_text_length {
            return Err(PdfError::TextExtraction(format!(
                "only {} characters of text found",
                length
            ))
            .into());
        }

        Ok(self.analyze_text(&text, glossary))
    }

    fn extract(
        &self,
        text: &str,
        parsed: Vec<VehicleRecord>,
        warnings: &mut Vec<String>,
    ) -> (ExtractionSource, Vec<VehicleRecord>) {
        if let Some(primary) = &self.primary {
            match primary.extract_vehicles(text) {
                Ok(vehicles) if !vehicles.is_empty() => return (ExtractionSource::Ai, vehicles),
                Ok(_) => {
                    warn!("{} found no vehicles, falling back to rules", primary.name());
                }
                Err(e) => {
                    warn!("{} failed, falling back to rules: {}", primary.name(), e);
                    warnings.push(format!("{} failed: {}", primary.name(), e));
                }
            }
        }

        if !parsed.is_empty() || !self.simple_scan_fallback {
            return (ExtractionSource::Rules, parsed);
        }

        let scanned = self.scanner.scan(text);
        if scanned.is_empty() {
            (ExtractionSource::Rules, parsed)
        } else {
            debug!("Parser found no vehicles, using simple scan");
            (ExtractionSource::SimpleScan, scanned)
        }
    }
}

impl Default for DocumentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
