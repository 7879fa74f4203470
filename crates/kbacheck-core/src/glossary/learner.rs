//! Learning code descriptions from reference documents.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::{classify_code, CodeGlossary, UpsertOutcome};
use crate::approval::rules::patterns::{TEMPLATE_CODE_LINE, TEMPLATE_CODE_START};
use crate::error::{GlossaryError, PdfError, Result};
use crate::models::CodeCategory;

/// Code descriptions found in one reference document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateCodes {
    pub restrictions: BTreeMap<String, String>,
    pub notes: BTreeMap<String, String>,
}

impl TemplateCodes {
    fn insert(&mut self, code: String, lines: &[String]) {
        if lines.is_empty() {
            return;
        }
        let description = lines.join(" ");
        match classify_code(&code) {
            CodeCategory::Restriction => {
                self.restrictions.insert(code, description);
            }
            CodeCategory::Note => {
                self.notes.insert(code, description);
            }
            _ => debug!("Ignoring unclassified template code {}", code),
        }
    }

    pub fn len(&self) -> usize {
        self.restrictions.len() + self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Counts from one learning operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnStats {
    pub new: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl LearnStats {
    fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::New => self.new += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
            UpsertOutcome::Skipped => {}
        }
    }

    fn merge(&mut self, other: LearnStats) {
        self.new += other.new;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
    }
}

/// Outcome of re-learning all stored templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReloadReport {
    /// Templates learned successfully, in processing order.
    pub processed: Vec<String>,
    /// Templates that failed, with the error message.
    pub failed: Vec<(String, String)>,
    /// Combined statistics.
    pub stats: LearnStats,
}

/// Extract code descriptions from reference document text.
///
/// A code line is a leading token of three or more characters followed by a
/// description that does not start with `A`. Following lines are appended
/// until a blank line or the next code-like line.
pub fn extract_template_codes(text: &str) -> TemplateCodes {
    let mut codes = TemplateCodes::default();
    let mut current: Option<String> = None;
    let mut lines: Vec<String> = Vec::new();

    for line in text.lines() {
        let line = line.trim();

        if line.is_empty() {
            if let Some(code) = current.take() {
                codes.insert(code, &lines);
            }
            lines.clear();
            continue;
        }

        if let Some((code, description)) = template_code_line(line) {
            if let Some(previous) = current.take() {
                codes.insert(previous, &lines);
            }
            current = Some(code.to_string());
            lines = vec![description.to_string()];
        } else if current.is_some() && !TEMPLATE_CODE_START.is_match(line) {
            lines.push(line.to_string());
        }
    }

    if let Some(code) = current {
        codes.insert(code, &lines);
    }

    codes
}

fn template_code_line(line: &str) -> Option<(&str, &str)> {
    let caps = TEMPLATE_CODE_LINE.captures(line)?;
    let code = caps.get(1)?.as_str();
    let description = caps.get(2)?.as_str().trim();

    if description.starts_with('A') || description.chars().count() < 2 {
        return None;
    }
    Some((code, description))
}

/// File extensions of stored templates.
const TEMPLATE_EXTENSIONS: [&str; 2] = ["pdf", "txt"];

/// Template id for a user supplied name: the name without a `.pdf`/`.txt`
/// extension, with characters that are unsafe in file names replaced.
///
/// The id doubles as the stored file stem, so names that sanitize to the
/// same id refer to the same template.
pub fn template_id(name: &str) -> String {
    let name = name.trim();
    let stem = TEMPLATE_EXTENSIONS
        .iter()
        .find_map(|extension| {
            let cut = name.len().checked_sub(extension.len() + 1)?;
            let suffix = name.get(cut..)?;
            (suffix.starts_with('.') && suffix[1..].eq_ignore_ascii_case(extension))
                .then(|| &name[..cut])
        })
        .unwrap_or(name);

    let sanitized: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches('.').is_empty() {
        "template".to_string()
    } else {
        sanitized
    }
}

/// Teaches a [`CodeGlossary`] from reference documents.
pub struct TemplateLearner<'g> {
    glossary: &'g mut CodeGlossary,
    template_dir: Option<PathBuf>,
}

impl<'g> TemplateLearner<'g> {
    pub fn new(glossary: &'g mut CodeGlossary) -> Self {
        Self {
            glossary,
            template_dir: None,
        }
    }

    /// Keep copies of learned documents in `dir` for [`reload_all`](Self::reload_all).
    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = Some(dir.into());
        self
    }

    pub fn glossary(&self) -> &CodeGlossary {
        self.glossary
    }

    /// Learn from already extracted text and flush the glossary.
    ///
    /// The text is stored as `<id>.txt` in the template directory, if one is
    /// set. The template is recorded under [`template_id`] of the name.
    pub fn learn_from_text(&mut self, text: &str, template_name: &str) -> Result<LearnStats> {
        let id = template_id(template_name);
        self.store(&id, "txt", text.as_bytes())?;
        Ok(self.learn(text, &id))
    }

    /// Learn from PDF bytes.
    ///
    /// The PDF is stored as `<id>.pdf` in the template directory, if one is set.
    pub fn learn_from_pdf(&mut self, data: &[u8], template_name: &str) -> Result<LearnStats> {
        let text = crate::pdf::extract_pdf_text(data)?;
        if text.trim().is_empty() {
            return Err(PdfError::TextExtraction("no text extracted".to_string()).into());
        }

        let id = template_id(template_name);
        self.store(&id, "pdf", data)?;
        Ok(self.learn(&text, &id))
    }

    /// Stored templates (PDF and text), sorted by file name.
    pub fn stored_templates(&self) -> Result<Vec<PathBuf>> {
        let Some(dir) = &self.template_dir else {
            return Ok(Vec::new());
        };
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| {
                GlossaryError::Template(format!("failed to list {}: {}", dir.display(), e))
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && stored_extension(path).is_some())
            .collect();
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Clear the glossary and re-learn every stored template.
    pub fn reload_all(&mut self) -> Result<ReloadReport> {
        self.reload_all_with(crate::pdf::extract_pdf_text)
    }

    /// Like [`reload_all`](Self::reload_all) with a custom PDF text extractor.
    ///
    /// Stored text templates are read directly.
    pub fn reload_all_with<F, E>(&mut self, extract: F) -> Result<ReloadReport>
    where
        F: Fn(&[u8]) -> std::result::Result<String, E>,
        E: std::fmt::Display,
    {
        let templates = self.stored_templates()?;
        info!("Reloading {} templates", templates.len());

        self.glossary.clear();
        let mut report = ReloadReport::default();

        for path in templates {
            let name = stored_template_id(&path);
            info!("Re-learning template {}", name);

            let text = match stored_extension(&path) {
                Some("txt") => std::fs::read_to_string(&path).map_err(|e| e.to_string()),
                _ => match std::fs::read(&path) {
                    Ok(data) => extract(&data).map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                },
            };

            match text {
                Ok(text) if !text.trim().is_empty() => {
                    report.stats.merge(self.merge_text(&text, &name));
                    report.processed.push(name);
                }
                Ok(_) => {
                    warn!("No text in template {}", name);
                    report.failed.push((name, "no text extracted".to_string()));
                }
                Err(e) => {
                    error!("Failed to re-learn template {}: {}", name, e);
                    report.failed.push((name, e));
                }
            }
        }

        self.flush();
        info!(
            "Reload finished: {} processed, {} failed",
            report.processed.len(),
            report.failed.len()
        );
        Ok(report)
    }

    fn learn(&mut self, text: &str, id: &str) -> LearnStats {
        let stats = self.merge_text(text, id);
        self.flush();
        stats
    }

    /// Write `<id>.<extension>` and drop a copy of the same template stored
    /// in the other format, so one id maps to one file.
    fn store(&self, id: &str, extension: &str, data: &[u8]) -> Result<()> {
        let Some(dir) = &self.template_dir else {
            return Ok(());
        };
        std::fs::create_dir_all(dir)?;

        for other in TEMPLATE_EXTENSIONS.iter().filter(|e| **e != extension) {
            let replaced = dir.join(format!("{}.{}", id, other));
            if replaced.is_file() {
                warn!("Replacing stored template {}", replaced.display());
                std::fs::remove_file(&replaced).map_err(|e| {
                    GlossaryError::Template(format!(
                        "failed to remove {}: {}",
                        replaced.display(),
                        e
                    ))
                })?;
            }
        }

        let path = dir.join(format!("{}.{}", id, extension));
        std::fs::write(&path, data).map_err(|e| {
            GlossaryError::Template(format!("failed to store {}: {}", path.display(), e))
        })?;
        debug!("Stored template at {}", path.display());
        Ok(())
    }

    fn merge_text(&mut self, text: &str, template_name: &str) -> LearnStats {
        info!("Processing template: {}", template_name);
        let codes = extract_template_codes(text);
        let mut stats = LearnStats::default();

        for (category, entries) in [
            (CodeCategory::Restriction, &codes.restrictions),
            (CodeCategory::Note, &codes.notes),
        ] {
            for (code, description) in entries {
                stats.record(self.glossary.upsert(category, code, description));
            }
        }

        self.glossary.add_template(template_name);
        info!(
            "Template processed: {} new codes, {} updated codes",
            stats.new, stats.updated
        );
        stats
    }

    fn flush(&self) {
        if let Err(e) = self.glossary.flush() {
            error!("Failed to save code glossary: {}", e);
        }
    }
}

fn stored_extension(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?;
    TEMPLATE_EXTENSIONS
        .into_iter()
        .find(|candidate| extension.eq_ignore_ascii_case(candidate))
}

/// Id of a stored template file, computed the same way as for learning.
fn stored_template_id(path: &Path) -> String {
    path.file_name()
        .map(|name| template_id(&name.to_string_lossy()))
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glossary::MemoryStore;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const TEMPLATE: &str = "\
Auflagen und Hinweise

A01 Die Rad-Reifenkombination ist nur an Fahrzeugen
mit Serienfahrwerk zulässig.

A05 Radabdeckung durch Kotflügelbördelung herstellen.
S12 Schneeketten nur an der Hinterachse.
Car Nur für Cabriolet-Ausführung.

Audi A4 Avant
XYZ99 wird nicht klassifiziert
";

    #[test]
    fn test_extract_template_codes() {
        let codes = extract_template_codes(TEMPLATE);

        assert_eq!(
            codes.restrictions.get("A01").map(String::as_str),
            Some("Die Rad-Reifenkombination ist nur an Fahrzeugen mit Serienfahrwerk zulässig.")
        );
        assert_eq!(
            codes.restrictions.get("A05").map(String::as_str),
            Some("Radabdeckung durch Kotflügelbördelung herstellen.")
        );
        assert_eq!(
            codes.notes.get("S12").map(String::as_str),
            Some("Schneeketten nur an der Hinterachse.")
        );
        assert_eq!(
            codes.notes.get("Car").map(String::as_str),
            Some("Nur für Cabriolet-Ausführung.")
        );
        assert_eq!(codes.len(), 4);
    }

    #[test]
    fn test_description_starting_with_a_is_rejected() {
        let codes = extract_template_codes("A10 Achslast beachten\nS01 Hinweis");
        assert!(codes.restrictions.is_empty());
        assert_eq!(codes.notes.get("S01").map(String::as_str), Some("Hinweis"));
    }

    #[test]
    fn test_learn_from_text_counts_and_tracks_template() {
        let store = MemoryStore::new();
        let mut glossary = CodeGlossary::open(store.clone());

        let stats = TemplateLearner::new(&mut glossary)
            .learn_from_text(TEMPLATE, "abe-45123")
            .unwrap();
        assert_eq!(stats, LearnStats { new: 4, updated: 0, unchanged: 0 });

        let update = "A01 Neue Beschreibung\n\nS12 Schneeketten nur an der Hinterachse.";
        let stats = TemplateLearner::new(&mut glossary)
            .learn_from_text(update, "abe-45123")
            .unwrap();
        assert_eq!(stats, LearnStats { new: 0, updated: 1, unchanged: 1 });

        assert_eq!(glossary.describe("A01"), Some("Neue Beschreibung"));
        assert_eq!(glossary.learned_templates(), ["abe-45123".to_string()]);
        assert!(store.snapshot().unwrap().contains("Neue Beschreibung"));
    }

    #[test]
    fn test_template_id() {
        assert_eq!(template_id("ABE 45123/2019.pdf"), "ABE_45123_2019");
        assert_eq!(template_id("reference.TXT"), "reference");
        assert_eq!(template_id("notes.txt.pdf"), "notes.txt");
        assert_eq!(template_id(" .. "), "template");
    }

    #[test]
    fn test_text_template_survives_reload() {
        let dir = TempDir::new().unwrap();
        let mut glossary = CodeGlossary::in_memory();

        let mut learner = TemplateLearner::new(&mut glossary).with_template_dir(dir.path());
        learner
            .learn_from_text("A01 Serienfahrwerk erforderlich", "ref.txt")
            .unwrap();
        assert!(dir.path().join("ref.txt").is_file());

        let report = learner
            .reload_all_with(|_| Err::<String, _>("PDF extractor must not run for text"))
            .unwrap();

        assert_eq!(report.processed, vec!["ref"]);
        assert!(report.failed.is_empty());
        assert_eq!(glossary.describe("A01"), Some("Serienfahrwerk erforderlich"));
        assert_eq!(glossary.learned_templates(), ["ref".to_string()]);
    }

    #[test]
    fn test_template_ids_are_stable_across_reload() {
        let dir = TempDir::new().unwrap();
        let mut glossary = CodeGlossary::in_memory();

        let mut learner = TemplateLearner::new(&mut glossary).with_template_dir(dir.path());
        learner
            .learn_from_text("S12 Schneeketten zulässig", "KBA 2024/001.pdf")
            .unwrap();
        learner
            .learn_from_text("F01 Nur mit Spurverbreiterung", "Gutachten (neu)")
            .unwrap();
        let before = learner.glossary().learned_templates().to_vec();
        assert_eq!(before, ["KBA_2024_001".to_string(), "Gutachten__neu_".to_string()]);

        learner.reload_all().unwrap();

        let mut after = learner.glossary().learned_templates().to_vec();
        after.sort();
        let mut expected = before.clone();
        expected.sort();
        assert_eq!(after, expected);
    }

    #[test]
    fn test_names_with_same_id_share_one_stored_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("KBA_1.pdf"), "S01 alt").unwrap();
        let mut glossary = CodeGlossary::in_memory();

        let mut learner = TemplateLearner::new(&mut glossary).with_template_dir(dir.path());
        learner.learn_from_text("S01 Erste Fassung", "KBA 1").unwrap();
        learner.learn_from_text("S01 Zweite Fassung", "KBA_1").unwrap();

        assert_eq!(learner.stored_templates().unwrap(), vec![dir.path().join("KBA_1.txt")]);
        assert_eq!(learner.glossary().learned_templates(), ["KBA_1".to_string()]);

        let report = learner.reload_all().unwrap();
        assert_eq!(report.processed, vec!["KBA_1"]);
        assert_eq!(glossary.describe("S01"), Some("Zweite Fassung"));
    }

    #[test]
    fn test_reload_skips_failing_documents() {
        let dir = TempDir::new().unwrap();
        let write = |name: &str, content: &str| {
            std::fs::write(dir.path().join(name), content).unwrap();
        };
        write("b-second.pdf", "S12 Schneeketten zulässig");
        write("a-first.pdf", "A01 Serienfahrwerk erforderlich");
        write("c-broken.pdf", "BROKEN");
        write("d-notes.txt", "F01 Nur mit Spurverbreiterung");
        write("readme.md", "F02 ignored");

        let mut glossary = CodeGlossary::in_memory();
        glossary.upsert(CodeCategory::Restriction, "A99", "stale");
        glossary.add_template("old");

        let report = TemplateLearner::new(&mut glossary)
            .with_template_dir(dir.path())
            .reload_all_with(|data| {
                let text = String::from_utf8_lossy(data).into_owned();
                if text == "BROKEN" {
                    Err("not a PDF".to_string())
                } else {
                    Ok(text)
                }
            })
            .unwrap();

        assert_eq!(report.processed, vec!["a-first", "b-second", "d-notes"]);
        assert_eq!(
            report.failed,
            vec![("c-broken".to_string(), "not a PDF".to_string())]
        );
        assert_eq!(report.stats.new, 3);

        assert_eq!(glossary.describe("A99"), None);
        assert_eq!(glossary.describe("A01"), Some("Serienfahrwerk erforderlich"));
        assert_eq!(glossary.describe("S12"), Some("Schneeketten zulässig"));
        assert_eq!(glossary.describe("F01"), Some("Nur mit Spurverbreiterung"));
        assert_eq!(glossary.describe("F02"), None);
        assert_eq!(
            glossary.learned_templates(),
            ["a-first".to_string(), "b-second".to_string(), "d-notes".to_string()]
        );
    }

    #[test]
    fn test_reload_without_template_dir_clears() {
        let mut glossary = CodeGlossary::in_memory();
        glossary.upsert(CodeCategory::Note, "S01", "x");

        let report = TemplateLearner::new(&mut glossary).reload_all().unwrap();
        assert!(report.processed.is_empty());
        assert!(glossary.is_empty());
    }

    #[test]
    fn test_learn_from_invalid_pdf_fails_without_storing() {
        let dir = TempDir::new().unwrap();
        let mut glossary = CodeGlossary::in_memory();

        let result = TemplateLearner::new(&mut glossary)
            .with_template_dir(dir.path())
            .learn_from_pdf(b"garbage", "broken");

        assert!(result.is_err());
        assert!(!dir.path().join("broken.pdf").exists());
        assert!(glossary.learned_templates().is_empty());
    }
}
