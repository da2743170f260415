//! Google Gemini provider (`generateContent` REST endpoint).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{snippet, GenerationError, GenerationFuture, TextGenerator};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    /// `model_override`: pass Some("gemini-2.5-pro") to override; defaults to gemini-2.5-flash.
    pub fn new(
        api_key: String,
        model_override: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .user_agent("biocosmos/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Backend(format!("http client: {e}")))?;
        Ok(Self {
            http,
            api_key,
            model: model_override.unwrap_or(DEFAULT_GEMINI_MODEL).to_string(),
        })
    }
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}
#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}
#[derive(Serialize)]
struct Req<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    candidates: Vec<Candidate>,
}
#[derive(Deserialize)]
struct Candidate {
    content: Option<RespContent>,
}
#[derive(Deserialize)]
struct RespContent {
    #[serde(default)]
    parts: Vec<RespPart>,
}
#[derive(Deserialize)]
struct RespPart {
    #[serde(default)]
    text: String,
}

/// Concatenated text of the first candidate.
fn first_candidate_text(resp: Resp) -> Option<String> {
    let content = resp.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().map(|p| p.text).collect();
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

impl TextGenerator for GeminiProvider {
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerationFuture<'a> {
        Box::pin(async move {
            let req = Req {
                contents: vec![Content {
                    parts: vec![Part { text: prompt }],
                }],
            };
            let url = format!("{GEMINI_BASE_URL}/{}:generateContent", self.model);

            let resp = self
                .http
                .post(url)
                .header("x-goog-api-key", &self.api_key)
                .json(&req)
                .send()
                .await
                .map_err(|e| GenerationError::Backend(format!("request failed: {e}")))?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(GenerationError::Backend(format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    snippet(&body, 200)
                )));
            }

            let body: Resp = resp
                .json()
                .await
                .map_err(|e| GenerationError::Backend(format!("invalid response body: {e}")))?;
            first_candidate_text(body)
                .ok_or_else(|| GenerationError::Backend("empty response from backend".to_string()))
        })
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}
