// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::env;

pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

fn default_enabled() -> bool {
    true
}
fn default_provider() -> String {
    "gemini".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// "gemini" | "openai" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Provider default when absent (gemini-2.5-flash / gpt-4o-mini).
    #[serde(default)]
    pub model: Option<String>,
    /// "ENV" means: read from GEMINI_API_KEY / OPENAI_API_KEY (by provider)
    #[serde(default = "default_api_key")]
    pub api_key: String,
    /// Upper bound for one generation call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            provider: default_provider(),
            model: None,
            api_key: default_api_key(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GenerationConfig {
    /// Lowercase the provider and clamp a zero timeout back to the default.
    pub fn normalize(&mut self) {
        self.provider = self.provider.trim().to_lowercase();
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
    }

    /// Resolve the key, reading the provider's env var when set to "ENV".
    /// Blank or missing keys resolve to `None`.
    pub fn resolve_api_key(&self) -> Option<String> {
        let raw = if self.api_key.trim().eq_ignore_ascii_case("env") {
            let var = match self.provider.as_str() {
                "openai" => ENV_OPENAI_API_KEY,
                _ => ENV_GEMINI_API_KEY,
            };
            env::var(var).ok()?
        } else {
            self.api_key.clone()
        };
        let key = raw.trim().to_string();
        (!key.is_empty()).then_some(key)
    }
}
