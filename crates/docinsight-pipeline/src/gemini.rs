use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use docinsight_core::config::InsightConfig;
use docinsight_core::error::Error;

use crate::insight::InsightGenerator;

/// Google Gemini `generateContent` over blocking HTTP.
pub struct GeminiGenerator {
    api_key: String,
    model: String,
    endpoint: String,
    client: Client,
}

impl GeminiGenerator {
    pub fn new(api_key: String, config: &InsightConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build Gemini HTTP client")?;
        Ok(Self {
            api_key,
            model: config.model.trim_start_matches("models/").to_string(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Reads the key from the variable named by `config.api_key_env`.
    pub fn from_env(config: &InsightConfig) -> docinsight_core::Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::InvalidConfig(format!("{} is not set", config.api_key_env)))?;
        Self::new(api_key, config).map_err(|e| Error::InvalidConfig(format!("{e:#}")))
    }

    pub fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

impl InsightGenerator for GeminiGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(self.api_key.trim()).context("invalid Gemini API key")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let body = GenerateRequest {
            contents: vec![Content { parts: vec![Part { text: prompt }] }],
        };
        tracing::debug!(model = %self.model, "calling Gemini API");
        let resp = self
            .client
            .post(self.url())
            .headers(headers)
            .json(&body)
            .send()
            .context("failed to call Gemini generateContent API")?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            bail!("Gemini returned {}: {}", status, text);
        }
        let parsed: GenerateResponse = resp.json().context("failed to parse Gemini response")?;
        Ok(parsed.text())
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Text parts of the first candidate, joined. Empty when there is none.
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}
