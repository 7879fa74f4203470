//! Configuration structures for the analysis pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for kbacheck.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KbaConfig {
    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Code glossary storage.
    pub glossary: GlossaryConfig,

    /// Document parsing configuration.
    pub extraction: ExtractionConfig,

    /// Dimensional validation thresholds.
    pub validation: ValidationConfig,

    /// Optional AI classifier.
    pub classifier: ClassifierConfig,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Reject documents without KBA/ABE markers on the first page.
    pub require_approval_markers: bool,

    /// Minimum text length to consider a PDF readable.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            require_approval_markers: true,
            min_text_length: 20,
        }
    }
}

/// Code glossary storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlossaryConfig {
    /// Directory holding template PDFs and the code database.
    pub template_dir: PathBuf,

    /// Code database file name inside `template_dir`.
    pub database_file: String,
}

impl Default for GlossaryConfig {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from("templates"),
            database_file: "codes_database.json".to_string(),
        }
    }
}

impl GlossaryConfig {
    /// Full path to the code database.
    pub fn database_path(&self) -> PathBuf {
        self.template_dir.join(&self.database_file)
    }
}

/// Document parsing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Manufacturer names that open a vehicle block (`<Manufacturer> <MODEL>`).
    pub manufacturers: Vec<String>,

    /// Fall back to a plain tire-size scan when no vehicle is found.
    pub simple_scan_fallback: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            manufacturers: vec!["Audi".to_string()],
            simple_scan_fallback: true,
        }
    }
}

/// Plausible tire dimensions. Values outside trigger a review.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Tire width in mm.
    pub min_width: u32,
    pub max_width: u32,

    /// Aspect ratio in percent.
    pub min_aspect_ratio: u32,
    pub max_aspect_ratio: u32,

    /// Rim diameter in inches.
    pub min_rim_diameter: u32,
    pub max_rim_diameter: u32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_width: 155,
            max_width: 335,
            min_aspect_ratio: 25,
            max_aspect_ratio: 80,
            min_rim_diameter: 16,
            max_rim_diameter: 22,
        }
    }
}

/// OpenAI-compatible classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Try the AI classifier before the rule-based parser.
    pub enabled: bool,

    /// Chat completions endpoint.
    pub endpoint: String,

    /// Model name.
    pub model: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 30,
            temperature: 0.3,
        }
    }
}

impl KbaConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: KbaConfig =
            serde_json::from_str(r#"{"validation": {"max_width": 355}}"#).unwrap();

        assert_eq!(config.validation.max_width, 355);
        assert_eq!(config.validation.min_width, 155);
        assert_eq!(config.extraction.manufacturers, vec!["Audi".to_string()]);
        assert!(!config.classifier.enabled);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = KbaConfig::default();
        config.glossary.template_dir = PathBuf::from("/srv/templates");
        config.save(&path).unwrap();

        let loaded = KbaConfig::from_file(&path).unwrap();
        assert_eq!(
            loaded.glossary.database_path(),
            PathBuf::from("/srv/templates/codes_database.json")
        );
    }
}
