//! Engine configuration: one TOML file plus a few env overrides.
//!
//! Lookup: `$BIOCOSMOS_CONFIG_PATH`, else `config/biocosmos.toml`. A missing
//! file means built-in defaults; a present but malformed file is an error.

pub mod ai;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::rate_limit::RateLimits;
use crate::topics::{default_rules, TopicRule};

pub use ai::GenerationConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/biocosmos.toml";
pub const ENV_CONFIG_PATH: &str = "BIOCOSMOS_CONFIG_PATH";
pub const ENV_DATA_PATH: &str = "BIOCOSMOS_DATA_PATH";

fn default_publications_path() -> PathBuf {
    PathBuf::from("data/SB_publication_PMC.csv")
}
fn default_topics_path() -> PathBuf {
    PathBuf::from("data/topics.json")
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_publications_path")]
    pub publications_path: PathBuf,
    /// Optional precomputed topic distribution.
    #[serde(default = "default_topics_path")]
    pub topics_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            publications_path: default_publications_path(),
            topics_path: default_topics_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub limits: RateLimits,
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Priority-ordered topic rules; empty means the built-in set.
    #[serde(default)]
    pub topics: Vec<TopicRule>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            limits: RateLimits::default(),
            generation: GenerationConfig::default(),
            topics: default_rules(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: EngineConfig = toml::from_str(s)?;
        cfg.normalize()?;
        Ok(cfg)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Resolve the config path from env + fallback, then apply env overrides.
    pub fn load_default() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
                }
                Self::load_from_file(&pb)?
            }
            Err(_) => {
                let pb = PathBuf::from(DEFAULT_CONFIG_PATH);
                if pb.exists() {
                    Self::load_from_file(&pb)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(p) = std::env::var(ENV_DATA_PATH) {
            if !p.trim().is_empty() {
                cfg.data.publications_path = PathBuf::from(p.trim());
            }
        }
        Ok(cfg)
    }

    fn normalize(&mut self) -> Result<()> {
        self.generation.normalize();
        if self.topics.is_empty() {
            self.topics = default_rules();
        }
        if let Some(r) = self.topics.iter().find(|r| r.name.trim().is_empty()) {
            return Err(anyhow!("topic rule with keywords {:?} has no name", r.keywords));
        }
        Ok(())
    }
}
