use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::GeminiConfig;
use crate::error::PlanError;

/// A generative model that turns a prompt into raw text.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Returns the concatenated text of the reply; an empty string means the model said nothing.
    async fn generate_text(&self, prompt: &str) -> Result<String, PlanError>;

    fn model_name(&self) -> &str;
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

fn map_http_error(error: reqwest::Error) -> PlanError {
    if error.is_timeout() {
        PlanError::UpstreamError(format!("request timeout: {}", error))
    } else if error.is_connect() {
        PlanError::UpstreamError(format!("connection error: {}", error))
    } else {
        PlanError::UpstreamError(format!("http error: {}", error))
    }
}

/// Google Gemini `generateContent` REST client.
pub struct GeminiClient {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self, PlanError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PlanError::UpstreamError(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    async fn generate_text(&self, prompt: &str) -> Result<String, PlanError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PlanError::UpstreamError(format!(
                "model request failed with status {}: {}",
                status, error_text
            )));
        }

        let reply: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| PlanError::UpstreamError(format!("failed to parse model reply: {}", e)))?;

        Ok(first_candidate_text(reply))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn first_candidate_text(reply: GenerateContentResponse) -> String {
    reply
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default()
}
