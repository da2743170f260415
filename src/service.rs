//! # Advisory Service
//! The single, long-lived engine instance shared by every request handler.
//!
//! Built once at startup (table loaded, rules compiled, generator constructed)
//! and handed around as `Arc<AdvisoryService>`; there is no global state.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::generate::{build_generator, DynGenerator};
use crate::grounding::ResponseGrounder;
use crate::ingest;
use crate::publication::{Publication, TopicCount};
use crate::rate_limit::{RateLimiter, RateUsage};
use crate::search::SearchIndex;
use crate::topics::TopicCategorizer;

/// Reply of [`AdvisoryService::answer`].
#[derive(Debug, Clone, Serialize)]
pub struct AdvisoryAnswer {
    pub response: String,
    pub results: Vec<Publication>,
}

pub struct AdvisoryService {
    index: SearchIndex,
    grounder: ResponseGrounder,
}

impl AdvisoryService {
    pub fn new(index: SearchIndex, grounder: ResponseGrounder) -> Self {
        Self { index, grounder }
    }

    /// Wire ingestion, categorizer, limiter and generator from configuration.
    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self::from_config_with_generator(cfg, build_generator(&cfg.generation))
    }

    /// Same as [`Self::from_config`] with an explicit generation backend.
    pub fn from_config_with_generator(cfg: &EngineConfig, generator: DynGenerator) -> Self {
        let categorizer = TopicCategorizer::new(cfg.topics.clone());
        let table = ingest::load_table_or_empty(&cfg.data.publications_path, &categorizer);
        let projection = ingest::load_topic_projection(&cfg.data.topics_path);
        let index = SearchIndex::new(table).with_projection(projection);

        let limiter = Arc::new(RateLimiter::new(cfg.limits));
        let grounder = ResponseGrounder::new(generator, limiter)
            .with_timeout(Duration::from_secs(cfg.generation.timeout_secs));

        info!(
            target: "advisor",
            publications = index.len(),
            provider = grounder.provider_name(),
            per_minute = cfg.limits.per_minute,
            per_day = cfg.limits.per_day,
            "advisory service ready"
        );
        Self::new(index, grounder)
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    pub fn search(
        &self,
        query: &str,
        topic: Option<&str>,
        limit: usize,
    ) -> EngineResult<Vec<Publication>> {
        self.index.search(query, topic, limit)
    }

    pub fn topic_distribution(&self) -> Vec<TopicCount> {
        self.index.topic_distribution()
    }

    /// Search for `query`, then ground a generated answer on the hits.
    pub async fn answer(&self, query: &str, limit: usize) -> EngineResult<AdvisoryAnswer> {
        if query.trim().is_empty() {
            return Err(EngineError::InvalidRequest("a question is required".to_string()));
        }
        let results = self.index.search(query, None, limit)?;
        let response = self.grounder.answer(query, &results).await?;
        Ok(AdvisoryAnswer { response, results })
    }

    pub fn rate_usage(&self) -> RateUsage {
        self.grounder.limiter().usage(self.grounder.clock().now())
    }
}
