use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::extraction::config::ExtractionConfig;
use crate::types::ItemKind;

const SYSTEM_EXTRACTION: &str = include_str!("../../prompts/system_extraction.txt");

/// User agent string identifying this client.
const USER_AGENT: &str = concat!("citycode-ingest/", env!("CARGO_PKG_VERSION"));

/// One identifier reported by a structured extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedItem {
    pub id: String,
    pub kind: ItemKind,
    pub text: String,
    pub page: u32,
    pub span: (usize, usize),
}

/// Narrow interface to a structured-extraction service.
///
/// Implementations submit document text and return the identifiers found,
/// or fail. They must not retry; callers fall back on failure.
pub trait StructuredExtractor {
    fn extract(&self, text: &str) -> Result<Vec<ExtractedItem>>;
}

/// Anthropic Messages API extractor.
///
/// NOTE: Do NOT derive `Debug` on this struct; `api_key` would be exposed.
pub struct AnthropicExtractor {
    http: Client,
    api_key: String,
    api_base_url: String,
    model: String,
    max_tokens: u32,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicErrorResponse {
    error: Option<AnthropicErrorDetail>,
}

#[derive(Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

impl AnthropicExtractor {
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }
}

impl StructuredExtractor for AnthropicExtractor {
    fn extract(&self, text: &str) -> Result<Vec<ExtractedItem>> {
        let url = format!("{}/v1/messages", self.api_base_url);

        let body = AnthropicRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: 0.0,
            system: SYSTEM_EXTRACTION,
            messages: [Message {
                role: "user",
                content: text,
            }],
        };

        let resp = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().unwrap_or_default();
            let message = serde_json::from_str::<AnthropicErrorResponse>(&body_text)
                .ok()
                .and_then(|r| r.error)
                .map(|e| e.message)
                .unwrap_or(body_text);
            return Err(IngestError::ExtractionApi { status, message });
        }

        let api_response: AnthropicResponse = resp
            .json()
            .map_err(|e| IngestError::ExtractionParse(e.to_string()))?;

        let content = api_response
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        let preview: String = content.chars().take(200).collect();
        debug!(response_preview = preview.as_str(), "extraction response");

        parse_extraction_response(&content)
    }
}

/// Item as the model reports it; every field is optional.
#[derive(Deserialize)]
struct RawExtractedItem {
    #[serde(default)]
    id: String,
    #[serde(default)]
    text: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    span_start: Option<usize>,
    #[serde(default)]
    span_end: Option<usize>,
}

/// Parse the JSON array in a model response into extracted items.
///
/// Tolerates markdown fences and surrounding prose. Entries with an empty id
/// or an unknown type are dropped; a missing type counts as RAD.
pub fn parse_extraction_response(response: &str) -> Result<Vec<ExtractedItem>> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(IngestError::ExtractionParse("empty response".into()));
    }

    let json = extract_json_array(trimmed)
        .ok_or_else(|| IngestError::ExtractionParse("no JSON array in response".into()))?;

    let raw: Vec<RawExtractedItem> =
        serde_json::from_str(json).map_err(|e| IngestError::ExtractionParse(e.to_string()))?;

    let items = raw
        .into_iter()
        .filter_map(|entry| {
            let id: String = entry
                .id
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_uppercase();
            if id.is_empty() {
                return None;
            }

            let kind = match entry.kind.as_deref().map(str::to_uppercase).as_deref() {
                None | Some("RAD") => ItemKind::Requirement,
                Some("PO") => ItemKind::Outcome,
                Some("EAD") => ItemKind::Evidence,
                Some(_) => return None,
            };

            Some(ExtractedItem {
                id,
                kind,
                text: entry.text,
                page: entry.page.unwrap_or(1),
                span: (entry.span_start.unwrap_or(0), entry.span_end.unwrap_or(0)),
            })
        })
        .collect();

    Ok(items)
}

/// Locate the JSON array in a response: a fenced block if present, else the
/// outermost brackets.
fn extract_json_array(text: &str) -> Option<&str> {
    let mut remaining = text;
    while let Some(start) = remaining.find("```") {
        let after_fence = &remaining[start + 3..];
        let content_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let content = &after_fence[content_start..];
        let Some(end) = content.find("```") else {
            break;
        };
        let block = content[..end].trim();
        if block.starts_with('[') {
            return Some(block);
        }
        remaining = &content[end + 3..];
    }

    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}
