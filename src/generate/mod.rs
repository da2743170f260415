//! Text-generation capability: provider abstraction + concrete backends.
//!
//! The engine treats the backend as opaque: `generate(prompt) -> text`, fallible.
//! The client is built once at startup; an unconfigured backend is an explicit
//! [`DisabledGenerator`] rather than a lazily failing one.

pub mod gemini;
pub mod openai;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::GenerationConfig;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

pub const ENV_AI_TEST_MODE: &str = "AI_TEST_MODE";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("generation backend is not configured")]
    NotConfigured,
    /// Transport or remote error; the text is inspected for quota signals.
    #[error("{0}")]
    Backend(String),
}

pub type GenerationFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>>;

/// Trait object used by the grounder (and tests).
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerationFuture<'a>;
    /// Provider name for diagnostics/logs.
    fn provider_name(&self) -> &'static str;
}

pub type DynGenerator = Arc<dyn TextGenerator>;

/// Factory: build a generator according to config and environment variables.
///
/// * If `AI_TEST_MODE=mock`, returns a deterministic mock.
/// * Else if disabled or no API key resolves, returns [`DisabledGenerator`].
/// * Else builds the configured provider.
pub fn build_generator(cfg: &GenerationConfig) -> DynGenerator {
    if std::env::var(ENV_AI_TEST_MODE)
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        info!(target: "generate", "AI_TEST_MODE=mock; using mock generator");
        return Arc::new(MockGenerator::new("Grounded answer (mock)"));
    }

    if !cfg.enabled {
        info!(target: "generate", "generation disabled in config");
        return Arc::new(DisabledGenerator);
    }

    let Some(api_key) = cfg.resolve_api_key() else {
        warn!(target: "generate", provider = %cfg.provider, "no API key; generation disabled");
        return Arc::new(DisabledGenerator);
    };

    let key_len = api_key.len();
    let timeout = Duration::from_secs(cfg.timeout_secs);
    let built: Result<DynGenerator, GenerationError> = match cfg.provider.as_str() {
        "gemini" => GeminiProvider::new(api_key, cfg.model.as_deref(), timeout)
            .map(|p| Arc::new(p) as DynGenerator),
        "openai" => OpenAiProvider::new(api_key, cfg.model.as_deref(), timeout)
            .map(|p| Arc::new(p) as DynGenerator),
        other => {
            warn!(target: "generate", provider = other, "unsupported provider; generation disabled");
            return Arc::new(DisabledGenerator);
        }
    };

    match built {
        Ok(g) => {
            // Safe diagnostics: provider + key length only.
            info!(target: "generate", provider = g.provider_name(), key_len, "generator ready");
            g
        }
        Err(e) => {
            warn!(target: "generate", error = %e, "generator construction failed; generation disabled");
            Arc::new(DisabledGenerator)
        }
    }
}

/// Keep at most `max` characters of a backend error body.
pub(crate) fn snippet(body: &str, max: usize) -> String {
    let one_line = body.split_whitespace().collect::<Vec<_>>().join(" ");
    match one_line.char_indices().nth(max) {
        Some((cut, _)) => one_line[..cut].to_string(),
        None => one_line,
    }
}

/// Always `NotConfigured`; used when no backend is available.
pub struct DisabledGenerator;

impl TextGenerator for DisabledGenerator {
    fn generate<'a>(&'a self, _prompt: &'a str) -> GenerationFuture<'a> {
        Box::pin(async { Err(GenerationError::NotConfigured) })
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Fixed-reply generator for tests/local runs.
#[derive(Clone)]
pub struct MockGenerator {
    pub reply: String,
}

impl MockGenerator {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl TextGenerator for MockGenerator {
    fn generate<'a>(&'a self, _prompt: &'a str) -> GenerationFuture<'a> {
        let out = self.reply.clone();
        Box::pin(async move { Ok(out) })
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
