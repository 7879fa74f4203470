//! Core library for KBA/ABE vehicle tire approval documents.
//!
//! This crate provides:
//! - PDF text extraction and approval document detection
//! - Rule-based parsing of vehicle/tire/code records from document text
//! - Vehicle/tire combination validation
//! - A persisted glossary of regulatory code descriptions, learned from
//!   reference documents
//! - An optional AI classifier (feature `ai`) with rule-based fallback

pub mod error;
pub mod models;
pub mod pdf;
pub mod approval;
pub mod glossary;
#[cfg(feature = "ai")]
pub mod ai;

pub use error::{KbaError, Result};
pub use models::config::KbaConfig;
pub use models::{
    ApprovalStatus, CodeCategory, RegulatoryCode, TireCodes, TireCombination, TireEntry,
    ValidationResult, VehicleAttribute, VehicleRecord,
};
pub use pdf::{PdfExtractor, PdfProcessor};
pub use approval::{
    AnalysisReport, CombinationValidator, DocumentAnalyzer, DocumentParser, ExtractionSource,
    ParsedDocument, SimpleTireScanner, VehicleDataExtractor,
};
pub use glossary::{
    classify_code, CodeDefinition, CodeEntry, CodeGlossary, GlossaryDatabase, GlossaryStore,
    LearnStats, MemoryStore, ReloadReport, TemplateLearner, UpsertOutcome,
};
#[cfg(feature = "native")]
pub use glossary::JsonFileStore;
#[cfg(feature = "ai")]
pub use ai::AiClassifier;
