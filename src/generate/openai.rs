//! OpenAI provider (Chat Completions API).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{snippet, GenerationError, GenerationFuture, TextGenerator};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    /// `model_override`: pass Some("gpt-4o") to override; defaults to gpt-4o-mini.
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
            model: model_override.unwrap_or(DEFAULT_OPENAI_MODEL).to_string(),
        })
    }
}

impl TextGenerator for OpenAiProvider {
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerationFuture<'a> {
        Box::pin(async move {
            #[derive(Serialize)]
            struct Msg<'a> {
                role: &'a str,
                content: &'a str,
            }
            #[derive(Serialize)]
            struct Req<'a> {
                model: &'a str,
                messages: Vec<Msg<'a>>,
                temperature: f32,
            }
            #[derive(Deserialize)]
            struct Resp {
                choices: Vec<Choice>,
            }
            #[derive(Deserialize)]
            struct Choice {
                message: ChoiceMsg,
            }
            #[derive(Deserialize)]
            struct ChoiceMsg {
                content: Option<String>,
            }

            // The grounding prompt already carries the instructions.
            let req = Req {
                model: &self.model,
                messages: vec![Msg {
                    role: "user",
                    content: prompt,
                }],
                temperature: 0.3,
            };

            let resp = self
                .http
                .post("https://api.openai.com/v1/chat/completions")
                .bearer_auth(&self.api_key)
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
            let content = body
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .unwrap_or_default();
            let content = content.trim();
            if content.is_empty() {
                Err(GenerationError::Backend("empty response from backend".to_string()))
            } else {
                Ok(content.to_string())
            }
        })
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}
