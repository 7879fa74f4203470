//! Persistence backends for the code glossary.

use std::sync::{Arc, Mutex};

use super::GlossaryDatabase;
use crate::error::GlossaryError;

/// Storage for the glossary database. Every save is a full rewrite.
pub trait GlossaryStore: Send + Sync {
    /// Load the database. A store that does not exist yet loads as empty.
    fn load(&self) -> Result<GlossaryDatabase, GlossaryError>;

    /// Replace the stored database.
    fn save(&self, db: &GlossaryDatabase) -> Result<(), GlossaryError>;
}

/// JSON file store with atomic replace.
#[cfg(feature = "native")]
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: std::path::PathBuf,
}

#[cfg(feature = "native")]
impl JsonFileStore {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[cfg(feature = "native")]
impl GlossaryStore for JsonFileStore {
    fn load(&self) -> Result<GlossaryDatabase, GlossaryError> {
        if !self.path.exists() {
            return Ok(GlossaryDatabase::default());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|source| GlossaryError::Read {
            path: self.path.clone(),
            source,
        })?;

        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, db: &GlossaryDatabase) -> Result<(), GlossaryError> {
        use std::io::Write;

        let write_error = |source: std::io::Error| GlossaryError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => std::path::Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(write_error)?;

        let content = serde_json::to_string_pretty(db)?;

        let mut file = tempfile::NamedTempFile::new_in(dir).map_err(write_error)?;
        file.write_all(content.as_bytes()).map_err(write_error)?;
        file.persist(&self.path).map_err(|e| write_error(e.error))?;

        Ok(())
    }
}

/// In-memory store holding the serialized JSON.
///
/// Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    contents: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with raw JSON.
    pub fn with_contents(json: impl Into<String>) -> Self {
        Self {
            contents: Arc::new(Mutex::new(Some(json.into()))),
        }
    }

    /// The last saved JSON, if any.
    pub fn snapshot(&self) -> Option<String> {
        self.contents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl GlossaryStore for MemoryStore {
    fn load(&self) -> Result<GlossaryDatabase, GlossaryError> {
        match self.snapshot() {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(GlossaryDatabase::default()),
        }
    }

    fn save(&self, db: &GlossaryDatabase) -> Result<(), GlossaryError> {
        let json = serde_json::to_string_pretty(db)?;
        *self
            .contents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(json);
        Ok(())
    }
}

#[cfg(all(test, feature = "native"))]
mod tests {
    use super::*;
    use crate::glossary::{CodeGlossary, UpsertOutcome};
    use crate::models::CodeCategory;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("codes_database.json"));
        assert_eq!(store.load().unwrap(), GlossaryDatabase::default());
    }

    #[test]
    fn test_file_round_trip_uses_camel_case_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("codes_database.json");
        let store = JsonFileStore::new(&path);

        let mut db = GlossaryDatabase::default();
        db.restrictions.insert("A01".to_string(), "Kotflügel".to_string());
        db.learned_templates.push("abe-1".to_string());
        store.save(&db).unwrap();

        let json = std::fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"learnedTemplates\""));
        assert!(json.contains("\"restrictions\""));
        assert_eq!(store.load().unwrap(), db);
    }

    #[test]
    fn test_corrupt_file_is_reported_and_glossary_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("codes_database.json");
        std::fs::write(&path, "[1, 2").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(GlossaryError::Corrupt(_))));

        let glossary = CodeGlossary::open_file(&path);
        assert!(glossary.is_empty());
    }

    #[test]
    fn test_identical_upsert_keeps_file_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("codes_database.json");

        let mut glossary = CodeGlossary::open_file(&path);
        glossary.upsert(CodeCategory::Restriction, "A05", "Radlauf nacharbeiten");
        glossary.flush().unwrap();
        let before = std::fs::read(&path).unwrap();

        let mut reopened = CodeGlossary::open_file(&path);
        assert_eq!(
            reopened.upsert(CodeCategory::Restriction, "A05", "Radlauf nacharbeiten"),
            UpsertOutcome::Unchanged
        );
        reopened.flush().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }
}
