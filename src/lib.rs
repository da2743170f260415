// src/lib.rs
// Public library surface for the binary, the report tool and integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod generate;
pub mod grounding;
pub mod ingest;
pub mod metrics;
pub mod publication;
pub mod rate_limit;
pub mod search;
pub mod service;
pub mod topics;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::error::{EngineError, EngineResult};
pub use crate::publication::{Publication, TopicCount};
pub use crate::rate_limit::{DeniedReason, RateLimiter, RateLimits};
pub use crate::search::SearchIndex;
pub use crate::service::{AdvisoryAnswer, AdvisoryService};
pub use crate::topics::TopicCategorizer;
