//! WASM bindings for KBA/ABE tire approval checks.
//!
//! The browser build runs the text pipeline with an in-memory glossary. The
//! glossary can be seeded from and exported to the JSON format used by the
//! native store.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use kbacheck_core::approval::rules::{canonicalize_tire_size, classify_line, TireSize};
use kbacheck_core::{CodeGlossary, DocumentAnalyzer, DocumentParser, MemoryStore, TemplateLearner};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Parse document text into vehicles and code definitions.
#[wasm_bindgen]
pub fn parse_document(text: &str) -> Result<JsValue, JsValue> {
    to_js(&DocumentParser::new().parse(text))
}

/// Tire sizes and codes found on a single line.
#[wasm_bindgen]
pub fn classify_document_line(line: &str) -> Result<JsValue, JsValue> {
    to_js(&classify_line(line))
}

/// Analyze document text, optionally with a glossary in JSON form.
#[wasm_bindgen]
pub fn analyze_text(text: &str, glossary_json: Option<String>) -> Result<JsValue, JsValue> {
    let mut analyzer = WasmAnalyzer::new(glossary_json);
    analyzer.analyze(text)
}

/// Check if a tire size has the `WWW/AARDD` shape.
#[wasm_bindgen]
pub fn validate_tire_size(size: &str) -> bool {
    TireSize::parse(size).is_ok()
}

/// Canonical `WWW/AARDD` form of a tire size, if it parses.
#[wasm_bindgen]
pub fn canonical_tire_size(raw: &str) -> Option<String> {
    canonicalize_tire_size(raw)
}

/// Category of a code: restriction, note or unclassified.
#[wasm_bindgen]
pub fn classify_code(code: &str) -> String {
    kbacheck_core::classify_code(code).as_str().to_string()
}

/// Check PDF bytes for KBA/ABE markers on the first page.
#[wasm_bindgen]
pub fn is_approval_document(data: &[u8]) -> bool {
    kbacheck_core::pdf::is_approval_document(data)
}

/// Analyzer with a glossary that lives as long as the object.
#[wasm_bindgen]
pub struct WasmAnalyzer {
    analyzer: DocumentAnalyzer,
    glossary: CodeGlossary,
    store: MemoryStore,
}

#[wasm_bindgen]
impl WasmAnalyzer {
    /// Create an analyzer, seeding the glossary from JSON if given.
    #[wasm_bindgen(constructor)]
    pub fn new(glossary_json: Option<String>) -> Self {
        let store = match glossary_json {
            Some(json) => MemoryStore::with_contents(json),
            None => MemoryStore::new(),
        };

        Self {
            analyzer: DocumentAnalyzer::new(),
            glossary: CodeGlossary::open(store.clone()),
            store,
        }
    }

    /// Analyze document text.
    #[wasm_bindgen]
    pub fn analyze(&mut self, text: &str) -> Result<JsValue, JsValue> {
        let report = self.analyzer.analyze_text(text, &mut self.glossary);
        to_js(&report)
    }

    /// Analyze PDF bytes.
    #[wasm_bindgen]
    pub fn analyze_pdf(&mut self, data: &[u8]) -> Result<JsValue, JsValue> {
        let report = self
            .analyzer
            .analyze_pdf(data, &mut self.glossary)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        to_js(&report)
    }

    /// Learn code descriptions from reference document text.
    #[wasm_bindgen]
    pub fn learn_template(&mut self, text: &str, name: &str) -> Result<JsValue, JsValue> {
        let stats = TemplateLearner::new(&mut self.glossary)
            .learn_from_text(text, name)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        to_js(&stats)
    }

    /// Description of a code, if known.
    #[wasm_bindgen]
    pub fn describe(&self, code: &str) -> Option<String> {
        self.glossary.resolve(code).map(str::to_string)
    }

    /// Number of stored codes.
    #[wasm_bindgen]
    pub fn code_count(&self) -> usize {
        self.glossary.len()
    }

    /// Export the glossary as JSON.
    #[wasm_bindgen]
    pub fn glossary_json(&self) -> Result<String, JsValue> {
        self.glossary
            .flush()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(self.store.snapshot().unwrap_or_default())
    }
}

impl Default for WasmAnalyzer {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_validate_tire_size() {
        assert!(validate_tire_size("235/45R18"));
        assert!(!validate_tire_size("abcR17"));
    }

    #[wasm_bindgen_test]
    fn test_classify_code() {
        assert_eq!(classify_code("A12"), "restriction");
        assert_eq!(classify_code("Car"), "note");
        assert_eq!(classify_code("T2"), "unclassified");
    }

    #[wasm_bindgen_test]
    fn test_learned_codes_survive_export() {
        let mut analyzer = WasmAnalyzer::new(None);
        analyzer
            .learn_template("A12 Kotflügel bördeln\n\nB05 Nur Sommerreifen\n", "ref")
            .unwrap();
        assert_eq!(analyzer.code_count(), 2);

        let json = analyzer.glossary_json().unwrap();
        let restored = WasmAnalyzer::new(Some(json));
        assert_eq!(restored.describe("A12").as_deref(), Some("Kotflügel bördeln"));
    }
}
