//! # Response Grounder
//! Turns retrieved publications into a bounded prompt context and asks the
//! generation backend for an answer, under rate-limiter control.
//!
//! Quota discipline: a slot is recorded only after the backend returned text.
//! Denials, backend errors, timeouts and abandoned calls record nothing.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::generate::{DynGenerator, GenerationError};
use crate::publication::Publication;
use crate::rate_limit::{Clock, RateLimiter, SystemClock};

/// At most this many results are rendered into the prompt context.
pub const CONTEXT_MAX_RESULTS: usize = 10;
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Deterministic reply when there is nothing to ground an answer on.
pub fn no_results_message(query: &str) -> String {
    format!("No studies found for \"{query}\". Try a different question or browse by topic.")
}

/// `Study {rank}: {title}\nSummary: {summary}\nTopic: {topic}` blocks, blank-line separated.
pub fn format_context(results: &[Publication]) -> String {
    results
        .iter()
        .take(CONTEXT_MAX_RESULTS)
        .enumerate()
        .map(|(i, p)| {
            format!(
                "Study {}: {}\nSummary: {}\nTopic: {}",
                i + 1,
                p.title,
                p.summary,
                p.topic
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_prompt(query: &str, context: &str) -> String {
    format!(
        "You are a helpful space biology research assistant analyzing NASA publications.
Provide clear, concise answers based on the research summaries provided.
Cite study titles when relevant. Keep responses under 300 words.

Question: {query}

Relevant Research from NASA Publications:

{context}

Based on these studies, please provide a clear and informative answer to the question."
    )
}

/// Does the backend error text signal remote quota / rate-limit exhaustion?
pub fn is_quota_error(message: &str) -> bool {
    let m = message.to_lowercase();
    m.contains("quota") || m.contains("rate limit") || m.contains("429")
}

fn classify_failure(err: GenerationError) -> EngineError {
    match err {
        GenerationError::NotConfigured => EngineError::NotConfigured,
        GenerationError::Backend(msg) if is_quota_error(&msg) => EngineError::UpstreamQuotaExceeded,
        GenerationError::Backend(msg) => EngineError::UpstreamFailure(msg),
    }
}

pub struct ResponseGrounder {
    generator: DynGenerator,
    limiter: Arc<RateLimiter>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl ResponseGrounder {
    pub fn new(generator: DynGenerator, limiter: Arc<RateLimiter>) -> Self {
        Self {
            generator,
            limiter,
            clock: Arc::new(SystemClock),
            timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// The clock admission and recording are stamped with.
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn provider_name(&self) -> &'static str {
        self.generator.provider_name()
    }

    /// Answer `query` grounded on `results` (already limit-capped upstream).
    pub async fn answer(&self, query: &str, results: &[Publication]) -> EngineResult<String> {
        if results.is_empty() {
            debug!(target: "advisor", query_len = query.len(), "no results; canned reply");
            return Ok(no_results_message(query));
        }

        let context = format_context(results);

        let permit = match self.limiter.admit(self.clock.now()) {
            Ok(p) => p,
            Err(reason) => {
                counter!("advisor_denied_total", "reason" => reason.label()).increment(1);
                warn!(target: "advisor", reason = reason.label(), "generation denied by local limiter");
                return Err(EngineError::RateLimited { reason });
            }
        };
        counter!("advisor_admitted_total").increment(1);

        let prompt = build_prompt(query, &context);
        info!(
            target: "advisor",
            provider = self.generator.provider_name(),
            query_len = query.len(),
            context_items = results.len().min(CONTEXT_MAX_RESULTS),
            "calling generation backend"
        );

        match tokio::time::timeout(self.timeout, self.generator.generate(&prompt)).await {
            Ok(Ok(text)) => {
                permit.record(self.clock.now());
                Ok(text)
            }
            Ok(Err(e)) => {
                let err = classify_failure(e);
                counter!("advisor_generation_failures_total", "kind" => err.kind()).increment(1);
                warn!(target: "advisor", kind = err.kind(), error = %err, "generation failed");
                Err(err)
            }
            Err(_) => {
                counter!("advisor_generation_failures_total", "kind" => "timeout").increment(1);
                warn!(target: "advisor", timeout_secs = self.timeout.as_secs(), "generation timed out");
                Err(EngineError::UpstreamFailure(format!(
                    "generation timed out after {}s",
                    self.timeout.as_secs()
                )))
            }
        }
    }
}
