//! Optional AI vehicle/tire classifier (OpenAI-compatible chat completions).
//!
//! The classifier is an alternative [`VehicleDataExtractor`]. Its output is
//! normalized to plain [`VehicleRecord`]s with bare tire entries; callers fall
//! back to the rule-based parser on any error.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::approval::rules::canonicalize_tire_size;
use crate::approval::VehicleDataExtractor;
use crate::error::{ExternalServiceError, Result};
use crate::models::config::ClassifierConfig;
use crate::models::{TireEntry, VehicleRecord};

const SYSTEM_PROMPT: &str = r#"Du bist ein Experte für KBA (Kraftfahrt-Bundesamt) Dokumente. Analysiere den Text und extrahiere alle Fahrzeug-Reifen-Kombinationen.
Achte besonders auf:
- Handelsbezeichnung (z.B. "Audi A4")
- Fahrzeug-Typ (z.B. "B8, B81")
- Reifengrößen (z.B. "255/40R19", "215/55R17")

Gib die Daten in folgendem JSON-Format zurück:
{
    "fahrzeuge": [
        {
            "handelsbezeichnung": string,
            "typ": string,
            "reifen": [string]
        }
    ]
}"#;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Vehicle list as requested in the system prompt.
#[derive(Debug, Deserialize)]
struct ClassifiedDocument {
    fahrzeuge: Vec<ClassifiedVehicle>,
}

#[derive(Debug, Deserialize)]
struct ClassifiedVehicle {
    handelsbezeichnung: String,
    #[serde(default)]
    typ: Option<String>,
    #[serde(default)]
    reifen: Vec<String>,
}

/// Chat-completions client extracting vehicles and tire sizes.
#[derive(Debug, Clone)]
pub struct AiClassifier {
    client: Client,
    config: ClassifierConfig,
    api_key: String,
}

impl AiClassifier {
    /// Create a classifier reading the API key from `config.api_key_env`.
    pub fn from_config(
        config: &ClassifierConfig,
    ) -> std::result::Result<Self, ExternalServiceError> {
        if !config.enabled {
            return Err(ExternalServiceError::Disabled);
        }

        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ExternalServiceError::MissingApiKey(config.api_key_env.clone()))?;

        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(
        config: &ClassifierConfig,
        api_key: impl Into<String>,
    ) -> std::result::Result<Self, ExternalServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExternalServiceError::Request(e.to_string()))?;

        Ok(Self {
            client,
            config: config.clone(),
            api_key: api_key.into(),
        })
    }

    /// Ask the model for the vehicles in `text`.
    pub fn classify(
        &self,
        text: &str,
    ) -> std::result::Result<Vec<VehicleRecord>, ExternalServiceError> {
        info!("Starting AI analysis with {}", self.config.model);

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ExternalServiceError::Request(format!(
                        "timed out after {}s",
                        self.config.timeout_secs
                    ))
                } else {
                    ExternalServiceError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExternalServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let chat: ChatResponse = response
            .json()
            .map_err(|e| ExternalServiceError::Response(e.to_string()))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ExternalServiceError::Response("empty completion".to_string()))?;

        let vehicles = normalize_response(&content)?;
        info!("AI analysis found {} vehicles", vehicles.len());
        Ok(vehicles)
    }
}

impl VehicleDataExtractor for AiClassifier {
    fn name(&self) -> &str {
        "ai"
    }

    fn extract_vehicles(&self, text: &str) -> Result<Vec<VehicleRecord>> {
        Ok(self.classify(text)?)
    }
}

/// Turn the model's JSON answer into vehicle records.
///
/// Names are `"<handelsbezeichnung> <typ>"`. Tire sizes are canonicalized
/// when they parse and kept as given otherwise. Vehicles without a name or
/// tires are dropped.
pub fn normalize_response(
    content: &str,
) -> std::result::Result<Vec<VehicleRecord>, ExternalServiceError> {
    let document: ClassifiedDocument =
        serde_json::from_str(content).map_err(|e| ExternalServiceError::Response(e.to_string()))?;

    let vehicles = document
        .fahrzeuge
        .into_iter()
        .filter_map(|classified| {
            let name = format!(
                "{} {}",
                classified.handelsbezeichnung.trim(),
                classified.typ.as_deref().unwrap_or("").trim()
            )
            .trim()
            .to_string();

            if name.is_empty() {
                return None;
            }

            let mut vehicle = VehicleRecord::new(name);
            for raw in &classified.reifen {
                let raw = raw.trim();
                if raw.is_empty() {
                    continue;
                }
                let size = canonicalize_tire_size(raw).unwrap_or_else(|| raw.to_string());
                vehicle.tires.push(TireEntry::bare(size));
            }

            if vehicle.tires.is_empty() {
                debug!("Dropping AI vehicle {} without tires", vehicle.name);
                return None;
            }
            Some(vehicle)
        })
        .collect();

    Ok(vehicles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_response() {
        let content = r#"{
            "fahrzeuge": [
                {
                    "handelsbezeichnung": "Audi A4",
                    "typ": "B8, B81",
                    "reifen": ["255/40R19", "235-45ZR18", " P225/50 R17 "]
                },
                {"handelsbezeichnung": "Audi Q5", "typ": null, "reifen": ["255/45R20"]},
                {"handelsbezeichnung": "Audi A6", "typ": "4G", "reifen": []}
            ]
        }"#;

        let vehicles = normalize_response(content).unwrap();
        assert_eq!(vehicles.len(), 2);

        assert_eq!(vehicles[0].name, "Audi A4 B8, B81");
        let sizes: Vec<&str> = vehicles[0].tires.iter().map(|t| t.size.as_str()).collect();
        assert_eq!(sizes, vec!["255/40R19", "235/45R18", "P225/50 R17"]);
        assert!(vehicles[0].tires[0].codes.is_empty());

        assert_eq!(vehicles[1].name, "Audi Q5");
    }

    #[test]
    fn test_malformed_response_is_an_error() {
        assert!(matches!(
            normalize_response("not json"),
            Err(ExternalServiceError::Response(_))
        ));
        assert!(matches!(
            normalize_response(r#"{"vehicles": []}"#),
            Err(ExternalServiceError::Response(_))
        ));
    }

    #[test]
    fn test_disabled_classifier_is_rejected() {
        let config = ClassifierConfig::default();
        assert!(matches!(
            AiClassifier::from_config(&config),
            Err(ExternalServiceError::Disabled)
        ));
    }

    #[test]
    fn test_missing_api_key() {
        let config = ClassifierConfig {
            enabled: true,
            api_key_env: "KBACHECK_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            ..ClassifierConfig::default()
        };
        assert!(matches!(
            AiClassifier::from_config(&config),
            Err(ExternalServiceError::MissingApiKey(_))
        ));
    }
}
