//! # HTTP Oracle
//!
//! The production [`Oracle`] implementation: an OpenAI-style chat-completions
//! client. One request per turn, no retries - a failed or malformed reply is
//! a final answer for that turn.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{OracleError, OracleResult};
use crate::prompt::build_system_prompt;
use crate::Oracle;
use voz_core::extraction::RawExtraction;
use voz_core::types::CatalogSnapshot;

// =============================================================================
// Configuration
// =============================================================================

/// Oracle endpoint configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Chat-completions endpoint URL.
    pub api_url: String,

    /// Bearer token for the endpoint.
    pub api_key: String,

    /// Model identifier sent with each request.
    pub model: String,

    /// Total request timeout. An oracle timeout is an extraction failure,
    /// never a partial sale.
    pub timeout: Duration,
}

impl OracleConfig {
    /// Loads configuration from environment variables.
    ///
    /// ## Variables
    /// - `ORACLE_API_URL` (default: OpenAI chat completions)
    /// - `ORACLE_API_KEY` (required)
    /// - `ORACLE_MODEL` (default: `gpt-4o-mini`)
    /// - `ORACLE_TIMEOUT_SECS` (default: 30)
    pub fn load() -> OracleResult<Self> {
        let api_key = env::var("ORACLE_API_KEY")
            .map_err(|_| OracleError::Config("ORACLE_API_KEY is not set".to_string()))?;

        let timeout_secs: u64 = env::var("ORACLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| OracleError::Config("Invalid ORACLE_TIMEOUT_SECS".to_string()))?;

        Ok(OracleConfig {
            api_url: env::var("ORACLE_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string()),
            api_key,
            model: env::var("ORACLE_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
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
    content: Option<String>,
}

// =============================================================================
// HTTP Oracle
// =============================================================================

/// Chat-completions client implementing [`Oracle`].
pub struct HttpOracle {
    http_client: reqwest::Client,
    api_url: String,
    model: String,
}

impl std::fmt::Debug for HttpOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpOracle")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl HttpOracle {
    /// Builds the client from configuration.
    pub fn new(config: OracleConfig) -> OracleResult<Self> {
        let auth_value = format!("Bearer {}", config.api_key);

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|e| OracleError::Config(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            .timeout(config.timeout)
            .build()?;

        Ok(HttpOracle {
            http_client,
            api_url: config.api_url,
            model: config.model,
        })
    }
}

#[async_trait]
impl Oracle for HttpOracle {
    async fn extract(
        &self,
        utterance: &str,
        catalog: &CatalogSnapshot,
    ) -> OracleResult<RawExtraction> {
        let system_prompt = build_system_prompt(catalog);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: &system_prompt },
                ChatMessage { role: "user", content: utterance },
            ],
            temperature: 0.0,
            response_format: ResponseFormat { format_type: "json_object" },
        };

        debug!(model = %self.model, "Requesting extraction from oracle");

        let response = self
            .http_client
            .post(&self.api_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Api { status: status.as_u16(), body });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Parse(e.to_string()))?;

        let content = chat
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .ok_or_else(|| OracleError::Parse("reply has no content".to_string()))?;

        parse_extraction(content)
    }
}

// =============================================================================
// Reply Parsing
// =============================================================================

/// Parses reply content as the strict extraction shape.
///
/// Code fences are tolerated (models add them despite instructions), but
/// anything that does not deserialize into [`RawExtraction`] is a parse
/// failure - the reply is never partially trusted.
pub fn parse_extraction(content: &str) -> OracleResult<RawExtraction> {
    let stripped = strip_code_fences(content);
    serde_json::from_str(stripped).map_err(|e| OracleError::Parse(e.to_string()))
}

/// Removes a surrounding ``` or ```json fence, if present.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    inner.trim()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let content = r#"{"found_sale": true, "items": [{"product": "Empanada", "quantity": 3, "unit_price": 300}], "total": 900, "payments": [], "customer": null, "note": null, "reply": "Listo"}"#;
        let extraction = parse_extraction(content).unwrap();
        assert!(extraction.found_sale);
        assert_eq!(extraction.items.len(), 1);
        assert_eq!(extraction.total, Some(900.0));
        assert_eq!(extraction.reply.as_deref(), Some("Listo"));
    }

    #[test]
    fn test_parse_fenced_json() {
        let content = "```json\n{\"found_sale\": false}\n```";
        let extraction = parse_extraction(content).unwrap();
        assert!(!extraction.found_sale);
        assert!(extraction.items.is_empty());
    }

    #[test]
    fn test_parse_failure_is_an_error() {
        assert!(parse_extraction("sorry, I can't help with that").is_err());
        assert!(parse_extraction("{\"found_sale\": \"yes\"}").is_err());
        assert!(parse_extraction("").is_err());
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        // Only found_sale is required by the wire shape; the validator
        // rejects missing business data later.
        let extraction = parse_extraction("{\"found_sale\": true}").unwrap();
        assert!(extraction.items.is_empty());
        assert_eq!(extraction.total, None);
    }

    #[test]
    fn test_strip_code_fences_variants() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    }
}
