//! Narrative generation via the Gemini `generateContent` REST API.
//!
//! The advisory pipeline never depends on this service being up: `summarize`
//! always returns a string, falling back to a marker plus the truncated
//! prompt when the key is missing or the call fails.

use advisor_core::{MetricSet, Narrator, Verdict};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const FALLBACK_PREFIX: &str = "[narrative unavailable]";
const MAX_FALLBACK_CHARS: usize = 1000;

#[derive(Error, Debug)]
pub enum NarrativeError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Empty response")]
    EmptyResponse,

    #[error("API key not configured")]
    NotConfigured,
}

/// Configuration for the Gemini service.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("GOOGLE_API_KEY"))
                .ok(),
            model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client, config }
    }

    pub fn with_defaults() -> Self {
        Self::new(GeminiConfig::default())
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// One generation call; fails on transport, status, or an empty candidate
    /// list. Callers wanting the never-fail behavior use `summarize`.
    pub async fn generate(&self, prompt: &str) -> Result<String, NarrativeError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(NarrativeError::NotConfigured)?;

        let url = format!(
            "{}/models/{}:generateContent",
            BASE_URL, self.config.model
        );
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt.to_string() }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NarrativeError::ServiceUnavailable(format!(
                "Status: {}",
                response.status()
            )));
        }

        let body = response.json::<GenerateContentResponse>().await?;
        extract_text(&body).ok_or(NarrativeError::EmptyResponse)
    }

    /// Generate a summary, degrading to a fallback string on any failure.
    pub async fn summarize(&self, prompt: &str) -> String {
        match self.generate(prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Gemini summary failed: {}", e);
                fallback_summary(prompt)
            }
        }
    }
}

#[async_trait]
impl Narrator for GeminiClient {
    async fn summarize(&self, prompt: &str) -> String {
        GeminiClient::summarize(self, prompt).await
    }
}

/// Prompt for the narrative model: ticker, metrics, verdict, and reasons in
/// one line, mirroring what the presentation layer shows the user.
pub fn build_prompt(symbol: &str, metrics: &MetricSet, verdict: Verdict, reasons: &[String]) -> String {
    let metrics_json =
        serde_json::to_string(metrics).unwrap_or_else(|_| "{}".to_string());
    format!(
        "Write a short, plain-language investment summary for {symbol}. \
         Metrics: {metrics}. Verdict: {verdict}. Reasons: {reasons}. \
         Two or three sentences, no financial advice disclaimer.",
        symbol = symbol,
        metrics = metrics_json,
        verdict = verdict.label(),
        reasons = reasons.join("; "),
    )
}

fn fallback_summary(prompt: &str) -> String {
    let truncated: String = prompt.chars().take(MAX_FALLBACK_CHARS).collect();
    format!("{} {}", FALLBACK_PREFIX, truncated)
}

fn extract_text(response: &GenerateContentResponse) -> Option<String> {
    let text = response
        .candidates
        .first()?
        .content
        .parts
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("");
    (!text.trim().is_empty()).then_some(text)
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_text_is_extracted() {
        let body = serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "ACME looks " },
                        { "text": "reasonably priced." }
                    ],
                    "role": "model"
                },
                "finishReason": "STOP"
            }]
        });
        let parsed: GenerateContentResponse = serde_json::from_value(body).unwrap();
        assert_eq!(
            extract_text(&parsed),
            Some("ACME looks reasonably priced.".to_string())
        );
    }

    #[test]
    fn empty_candidates_yield_no_text() {
        let parsed: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({ "candidates": [] })).unwrap();
        assert_eq!(extract_text(&parsed), None);
    }

    #[test]
    fn prompt_contains_verdict_and_reasons() {
        let metrics = MetricSet { pl: Some(9.5), ..Default::default() };
        let reasons = vec!["P/L low (9.50)".to_string()];
        let prompt = build_prompt("ACME", &metrics, Verdict::Buy, &reasons);
        assert!(prompt.contains("ACME"));
        assert!(prompt.contains("BUY"));
        assert!(prompt.contains("P/L low (9.50)"));
    }

    #[tokio::test]
    async fn unconfigured_client_falls_back() {
        let client = GeminiClient::new(GeminiConfig {
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            timeout: Duration::from_secs(1),
        });
        let summary = client.summarize("Analysis for ACME").await;
        assert!(summary.starts_with(FALLBACK_PREFIX));
        assert!(summary.contains("Analysis for ACME"));
    }

    #[test]
    fn fallback_truncates_long_prompts() {
        let prompt = "x".repeat(5000);
        let summary = fallback_summary(&prompt);
        assert!(summary.len() <= FALLBACK_PREFIX.len() + 1 + MAX_FALLBACK_CHARS);
    }
}
