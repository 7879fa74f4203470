//! Code glossary: regulatory code descriptions learned from reference documents.
//!
//! The glossary classifies short codes into restrictions (Auflagen) and notes
//! (Hinweise) and keeps one description per code. It is an explicit object
//! with an injected [`GlossaryStore`]; callers pass it by reference to the
//! parser pipeline, the validator and the [`TemplateLearner`].
//!
//! A single writer is assumed. Learning takes `&mut CodeGlossary`, readers
//! take `&CodeGlossary`.

mod learner;
mod store;

pub use learner::{
    extract_template_codes, template_id, LearnStats, ReloadReport, TemplateCodes, TemplateLearner,
};
#[cfg(feature = "native")]
pub use store::JsonFileStore;
pub use store::{GlossaryStore, MemoryStore};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::approval::rules::patterns::{NOTE_SHAPE, RESTRICTION_SHAPE};
use crate::error::GlossaryError;
use crate::models::{CodeCategory, RegulatoryCode};

/// Classify a bare code string.
///
/// Only restriction and note shapes are recognized; everything else is
/// `Unclassified` and never stored by [`CodeGlossary::upsert`].
pub fn classify_code(code: &str) -> CodeCategory {
    let code = code.trim();

    if RESTRICTION_SHAPE.is_match(code) {
        CodeCategory::Restriction
    } else if NOTE_SHAPE.is_match(code) {
        CodeCategory::Note
    } else {
        CodeCategory::Unclassified
    }
}

/// Persisted glossary document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GlossaryDatabase {
    /// Restriction code descriptions.
    #[serde(alias = "auflagen")]
    pub restrictions: BTreeMap<String, String>,

    /// Note code descriptions.
    #[serde(alias = "hinweise")]
    pub notes: BTreeMap<String, String>,

    /// Identifiers of learned templates, in learning order.
    #[serde(alias = "templates")]
    pub learned_templates: Vec<String>,
}

impl GlossaryDatabase {
    fn category(&self, category: CodeCategory) -> Option<&BTreeMap<String, String>> {
        match category {
            CodeCategory::Restriction => Some(&self.restrictions),
            CodeCategory::Note => Some(&self.notes),
            _ => None,
        }
    }

    fn category_mut(&mut self, category: CodeCategory) -> Option<&mut BTreeMap<String, String>> {
        match category {
            CodeCategory::Restriction => Some(&mut self.restrictions),
            CodeCategory::Note => Some(&mut self.notes),
            _ => None,
        }
    }
}

/// A code with its description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeEntry {
    pub code: RegulatoryCode,
    pub description: String,
}

/// A code definition found inside an analysed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeDefinition {
    pub code: String,
    pub description: String,
}

impl CodeDefinition {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
        }
    }
}

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Code was not known before.
    New,
    /// Description changed.
    Updated,
    /// Same description already stored.
    Unchanged,
    /// Category cannot be stored.
    Skipped,
}

/// Code glossary backed by a [`GlossaryStore`].
pub struct CodeGlossary {
    db: GlossaryDatabase,
    store: Box<dyn GlossaryStore>,
}

impl CodeGlossary {
    /// Open a glossary, loading the store.
    ///
    /// A missing or unreadable store yields an empty glossary.
    pub fn open(store: impl GlossaryStore + 'static) -> Self {
        let db = load_or_empty(&store);
        Self {
            db,
            store: Box::new(store),
        }
    }

    /// Open the JSON glossary at `path`.
    #[cfg(feature = "native")]
    pub fn open_file(path: impl Into<std::path::PathBuf>) -> Self {
        Self::open(JsonFileStore::new(path))
    }

    /// Empty glossary kept in memory only.
    pub fn in_memory() -> Self {
        Self::open(MemoryStore::new())
    }

    /// Classify a code by shape.
    pub fn classify(code: &str) -> CodeCategory {
        classify_code(code)
    }

    /// Description of a code, looked up in the category its shape implies.
    pub fn describe(&self, code: &str) -> Option<&str> {
        let code = code.trim();
        self.describe_in(classify_code(code), code)
    }

    /// Description of a code within an explicit category.
    pub fn describe_in(&self, category: CodeCategory, code: &str) -> Option<&str> {
        self.db
            .category(category)?
            .get(code.trim())
            .map(String::as_str)
    }

    /// Description for display: [`describe`](Self::describe), then definitions
    /// recorded from analysed documents under codes of any shape.
    pub fn resolve(&self, code: &str) -> Option<&str> {
        self.describe(code)
            .or_else(|| self.describe_in(CodeCategory::Restriction, code))
    }

    /// Insert or overwrite a description.
    pub fn upsert(
        &mut self,
        category: CodeCategory,
        code: &str,
        description: &str,
    ) -> UpsertOutcome {
        let code = code.trim();
        let description = description.trim();

        let Some(entries) = self.db.category_mut(category) else {
            debug!("Skipping {} code {}", category, code);
            return UpsertOutcome::Skipped;
        };

        match entries.get(code) {
            Some(existing) if existing == description => UpsertOutcome::Unchanged,
            Some(_) => {
                info!("Updating description for {}", code);
                entries.insert(code.to_string(), description.to_string());
                UpsertOutcome::Updated
            }
            None => {
                info!("New {} code found: {}", category, code);
                entries.insert(code.to_string(), description.to_string());
                UpsertOutcome::New
            }
        }
    }

    /// Record definitions found while parsing a document.
    ///
    /// Codes of restriction or note shape go to their category; any other
    /// code is kept with the restrictions. Returns the number of entries
    /// that changed.
    pub fn record_definitions(&mut self, definitions: &[CodeDefinition]) -> usize {
        let mut changed = 0;
        for definition in definitions {
            let category = match classify_code(&definition.code) {
                CodeCategory::Note => CodeCategory::Note,
                _ => CodeCategory::Restriction,
            };
            if matches!(
                self.upsert(category, &definition.code, &definition.description),
                UpsertOutcome::New | UpsertOutcome::Updated
            ) {
                changed += 1;
            }
        }
        changed
    }

    /// All entries of a category, ordered by code.
    pub fn entries(&self, category: CodeCategory) -> Vec<CodeEntry> {
        self.db
            .category(category)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(code, description)| CodeEntry {
                        code: RegulatoryCode {
                            code: code.clone(),
                            category,
                        },
                        description: description.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Identifiers of learned templates.
    pub fn learned_templates(&self) -> &[String] {
        &self.db.learned_templates
    }

    /// Track a learned template. Returns `false` if it was already known.
    pub fn add_template(&mut self, name: &str) -> bool {
        if self.db.learned_templates.iter().any(|t| t == name) {
            return false;
        }
        self.db.learned_templates.push(name.to_string());
        true
    }

    /// Remove all codes and templates (in memory).
    pub fn clear(&mut self) {
        self.db = GlossaryDatabase::default();
    }

    /// Write the current state to the store.
    pub fn flush(&self) -> Result<(), GlossaryError> {
        self.store.save(&self.db)?;
        debug!(
            "Glossary saved: {} restrictions, {} notes",
            self.db.restrictions.len(),
            self.db.notes.len()
        );
        Ok(())
    }

    /// Re-read the store, discarding in-memory changes.
    pub fn reload(&mut self) {
        self.db = load_or_empty(self.store.as_ref());
    }

    /// Current database snapshot.
    pub fn database(&self) -> &GlossaryDatabase {
        &self.db
    }

    /// Number of stored codes.
    pub fn len(&self) -> usize {
        self.db.restrictions.len() + self.db.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CodeGlossary {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for CodeGlossary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeGlossary").field("db", &self.db).finish_non_exhaustive()
    }
}

fn load_or_empty(store: &dyn GlossaryStore) -> GlossaryDatabase {
    match store.load() {
        Ok(db) => db,
        Err(e) => {
            warn!("Failed to load code glossary, starting empty: {}", e);
            GlossaryDatabase::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_code() {
        assert_eq!(classify_code("A12"), CodeCategory::Restriction);
        assert_eq!(classify_code("ABc"), CodeCategory::Restriction);
        assert_eq!(classify_code("S01"), CodeCategory::Note);
        assert_eq!(classify_code("B12"), CodeCategory::Note);
        assert_eq!(classify_code("F99"), CodeCategory::Note);
        assert_eq!(classify_code("BnK"), CodeCategory::Note);
        assert_eq!(classify_code("A123"), CodeCategory::Unclassified);
        assert_eq!(classify_code("A12a"), CodeCategory::Unclassified);
        assert_eq!(classify_code("C12"), CodeCategory::Unclassified);
        assert_eq!(classify_code("T1"), CodeCategory::Unclassified);
    }

    #[test]
    fn test_classify_upsert_describe_round_trip() {
        let mut glossary = CodeGlossary::in_memory();

        let entries = [
            ("A05", "Kotflügel bördeln"),
            ("Car", "Nur Cabriolet"),
            ("B07", "Schneeketten"),
        ];
        for (code, description) in entries {
            let category = classify_code(code);
            assert_eq!(glossary.upsert(category, code, description), UpsertOutcome::New);
            assert_eq!(glossary.describe(code), Some(description));
        }
    }

    #[test]
    fn test_upsert_outcomes() {
        let mut glossary = CodeGlossary::in_memory();

        let restriction = CodeCategory::Restriction;
        assert_eq!(glossary.upsert(restriction, "A01", "alt"), UpsertOutcome::New);
        assert_eq!(glossary.upsert(restriction, "A01", "neu"), UpsertOutcome::Updated);
        assert_eq!(glossary.upsert(restriction, "A01", "neu"), UpsertOutcome::Unchanged);
        assert_eq!(
            glossary.upsert(CodeCategory::Unclassified, "X1", "egal"),
            UpsertOutcome::Skipped
        );
        assert_eq!(glossary.describe("A01"), Some("neu"));
        assert_eq!(glossary.len(), 1);
    }

    #[test]
    fn test_idempotent_upsert_is_byte_identical() {
        let store = MemoryStore::new();
        let mut glossary = CodeGlossary::open(store.clone());

        glossary.upsert(CodeCategory::Note, "S12", "Hinweis");
        glossary.flush().unwrap();
        let first = store.snapshot().unwrap();

        assert_eq!(glossary.upsert(CodeCategory::Note, "S12", "Hinweis"), UpsertOutcome::Unchanged);
        glossary.flush().unwrap();
        assert_eq!(store.snapshot().unwrap(), first);
    }

    #[test]
    fn test_unclassified_lookup_is_absent() {
        let mut glossary = CodeGlossary::in_memory();
        glossary.upsert(CodeCategory::Restriction, "A12", "Text");

        assert_eq!(glossary.describe("X12"), None);
        assert_eq!(glossary.describe_in(CodeCategory::Note, "A12"), None);
    }

    #[test]
    fn test_record_definitions_and_resolve() {
        let mut glossary = CodeGlossary::in_memory();
        let changed = glossary.record_definitions(&[
            CodeDefinition::new("A12a", "Verbreiterte Kotflügel erforderlich"),
            CodeDefinition::new("B03", "Nur mit Radabdeckung"),
        ]);

        assert_eq!(changed, 2);
        assert_eq!(
            glossary.describe_in(CodeCategory::Restriction, "A12a"),
            Some("Verbreiterte Kotflügel erforderlich")
        );
        assert_eq!(glossary.describe("A12a"), None);
        assert_eq!(glossary.resolve("A12a"), Some("Verbreiterte Kotflügel erforderlich"));
        assert_eq!(glossary.describe("B03"), Some("Nur mit Radabdeckung"));
    }

    #[test]
    fn test_add_template_is_idempotent() {
        let mut glossary = CodeGlossary::in_memory();
        assert!(glossary.add_template("KBA-2024-001"));
        assert!(!glossary.add_template("KBA-2024-001"));
        assert_eq!(glossary.learned_templates(), ["KBA-2024-001".to_string()]);
    }

    #[test]
    fn test_corrupt_store_starts_empty() {
        let glossary = CodeGlossary::open(MemoryStore::with_contents("{not json"));
        assert!(glossary.is_empty());
        assert!(glossary.learned_templates().is_empty());
    }

    #[test]
    fn test_legacy_keys_are_accepted() {
        let store = MemoryStore::with_contents(
            r#"{"auflagen": {"A01": "Alt"}, "hinweise": {"Car": "Cabrio"}, "templates": ["t1"]}"#,
        );
        let glossary = CodeGlossary::open(store);

        assert_eq!(glossary.describe("A01"), Some("Alt"));
        assert_eq!(glossary.describe("Car"), Some("Cabrio"));
        assert_eq!(glossary.learned_templates(), ["t1".to_string()]);
    }

    #[test]
    fn test_clear_and_reload() {
        let store = MemoryStore::new();
        let mut glossary = CodeGlossary::open(store.clone());
        glossary.upsert(CodeCategory::Restriction, "A01", "Text");
        glossary.flush().unwrap();

        glossary.clear();
        assert!(glossary.is_empty());

        glossary.reload();
        assert_eq!(glossary.describe("A01"), Some("Text"));
    }
}
