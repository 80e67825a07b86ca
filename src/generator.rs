use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;

use crate::config::GeneratorConfig;
use crate::error::ServiceError;

/// What a stage asks the model for: a persona and a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
}

/// Raw output of a generative stage, before any parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    Text(String),
    /// The model answered, but with something other than text (e.g. a function call part).
    Structured(Value),
    /// No candidates or no parts at all.
    Empty,
}

impl StageOutput {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StageOutput::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Best-effort text for display when parsing failed.
    pub fn display_text(&self) -> String {
        match self {
            StageOutput::Text(text) => text.clone(),
            StageOutput::Structured(value) => value.to_string(),
            StageOutput::Empty => String::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StageOutput::Text(_) => "text",
            StageOutput::Structured(_) => "structured",
            StageOutput::Empty => "empty",
        }
    }
}

pub trait TextGenerator: Send + Sync {
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<StageOutput, ServiceError>> + Send;
}

/// Gemini `generateContent` over REST.
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeneratorConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<Value>,
}

impl GeminiClient {
    pub fn new(config: GeneratorConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

/// Joins the text parts of the first candidate.
pub fn output_from_response(response: GenerateContentResponse) -> StageOutput {
    let Some(parts) = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .filter(|p| !p.is_empty())
    else {
        return StageOutput::Empty;
    };

    let texts: Vec<&str> = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();

    if texts.is_empty() {
        let first = parts.into_iter().next().unwrap_or(Value::Null);
        return StageOutput::Structured(first);
    }
    StageOutput::Text(texts.concat())
}

impl TextGenerator for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<StageOutput, ServiceError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ServiceError::MissingCredentials("GOOGLE_API_KEY"))?;

        let body = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![TextPart {
                    text: &request.system,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![TextPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
            },
        };

        let res = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let response: GenerateContentResponse = res.json().await?;
        Ok(output_from_response(response))
    }
}

#[test]
fn test_output_from_response_joins_text_parts() {
    let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": "Here: " }, { "text": "{\"a\": 1}" }] },
            "finishReason": "STOP"
        }]
    }))
    .unwrap();
    assert_eq!(
        output_from_response(response),
        StageOutput::Text("Here: {\"a\": 1}".to_string())
    );
}

#[test]
fn test_output_from_response_without_text() {
    let empty: GenerateContentResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
    assert_eq!(output_from_response(empty), StageOutput::Empty);

    let blocked: GenerateContentResponse =
        serde_json::from_str(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).unwrap();
    assert_eq!(output_from_response(blocked), StageOutput::Empty);

    let call: GenerateContentResponse = serde_json::from_value(serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "functionCall": { "name": "search" } }] } }]
    }))
    .unwrap();
    assert_eq!(output_from_response(call).kind(), "structured");
}
